//! Render state machine.
//!
//! The card's presentation is a pure function of the latest
//! [`DeviceSnapshot`] plus one piece of retained state: the instant the
//! current cook was first observed, kept by [`StatusTracker`]. [`render`]
//! turns both into a [`CardView`] describing which sections are visible
//! and what they display.

use chrono::FixedOffset;

use crate::data::config::CardConfig;
use crate::data::food::{FoodReference, MANUAL};
use crate::data::history::Timestamp;
use crate::data::snapshot::DeviceSnapshot;
use crate::data::span::ChartSpan;
use crate::data::status::DeviceStatus;
use crate::reconciler::{Selector, SelectorSet};
use crate::source::translations::{category_key, doneness_key, food_key, Translations};
use crate::utils::{
    format_clock, format_duration, format_rate, format_temperature, PLACEHOLDER,
};

/// Disconnections shorter than this do not raise the warning banner.
pub const DISCONNECT_WARNING_SECONDS: f64 = 60.0;

/// Ambient readings from here on are shown as hot.
pub const AMBIENT_HOT: f64 = 100.0;

/// Ambient readings from here on are shown as very hot.
pub const AMBIENT_VERY_HOT: f64 = 200.0;

/// Toggle glyph while the chart is shown.
pub const GLYPH_VISIBLE: &str = "▲";

/// Toggle glyph while the chart is hidden.
pub const GLYPH_HIDDEN: &str = "▼";

/// A status change observed by the [`StatusTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The device started cooking.
    EnteredCooking,
    /// The device stopped cooking.
    LeftCooking,
    /// Anything else.
    Unchanged,
}

/// Tracks the status across snapshots and anchors the cook start time.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    previous: Option<DeviceStatus>,
    cooking_start: Option<Timestamp>,
}

impl StatusTracker {
    /// Create a tracker that has seen nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status of a new snapshot.
    ///
    /// Entering cooking anchors the start time (the snapshot's own start
    /// time if it carries one, otherwise `now`). Leaving cooking clears it.
    /// Refreshes while cooking keep the anchor.
    pub fn observe(&mut self, snapshot: &DeviceSnapshot, now: Timestamp) -> Transition {
        let was_cooking = self.previous.is_some_and(|s| s.is_cooking());
        let is_cooking = snapshot.status.is_cooking();
        self.previous = Some(snapshot.status);

        match (was_cooking, is_cooking) {
            (false, true) => {
                self.cooking_start = Some(snapshot.start_time.unwrap_or(now));
                Transition::EnteredCooking
            }
            (true, false) => {
                self.cooking_start = None;
                Transition::LeftCooking
            }
            _ => Transition::Unchanged,
        }
    }

    /// The last observed status.
    pub fn status(&self) -> DeviceStatus {
        self.previous.unwrap_or_default()
    }

    /// When the current cook started.
    pub fn cooking_start(&self) -> Option<Timestamp> {
        self.cooking_start
    }

    /// Whole minutes since the cook started, zero when unknown.
    pub fn elapsed_minutes(&self, now: Timestamp) -> i64 {
        self.cooking_start
            .map(|start| (now - start).num_minutes().max(0))
            .unwrap_or(0)
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Semantic colour of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Tone {
    /// No particular colour.
    #[default]
    Normal,
    /// Accent colour.
    Primary,
    /// Good.
    Success,
    /// Needs attention.
    Warning,
    /// Bad.
    Error,
}

/// A header indicator (battery or signal).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Indicator {
    /// Icon name.
    pub icon: &'static str,
    /// Displayed value.
    pub text: String,
    /// Colour.
    pub tone: Tone,
}

/// Battery indicator for a charge level in percent.
pub fn battery_indicator(level: f64) -> Indicator {
    let (icon, tone) = match level {
        l if l >= 90.0 => ("mdi:battery", Tone::Success),
        l if l >= 70.0 => ("mdi:battery-80", Tone::Success),
        l if l >= 50.0 => ("mdi:battery-60", Tone::Success),
        l if l >= 30.0 => ("mdi:battery-40", Tone::Warning),
        l if l >= 10.0 => ("mdi:battery-20", Tone::Warning),
        _ => ("mdi:battery-alert", Tone::Error),
    };
    Indicator {
        icon,
        text: format!("{}%", level.round()),
        tone,
    }
}

/// Signal indicator for a strength in dBm.
pub fn rssi_indicator(dbm: f64) -> Indicator {
    let (icon, tone) = match dbm {
        d if d >= -50.0 => ("mdi:wifi-strength-4", Tone::Normal),
        d if d >= -60.0 => ("mdi:wifi-strength-3", Tone::Normal),
        d if d >= -70.0 => ("mdi:wifi-strength-2", Tone::Normal),
        d if d >= -80.0 => ("mdi:wifi-strength-1", Tone::Warning),
        _ => ("mdi:wifi-strength-alert-outline", Tone::Error),
    };
    Indicator {
        icon,
        text: format!("{} dBm", dbm.round()),
        tone,
    }
}

/// Ambient reading colour.
pub fn ambient_tone(celsius: f64) -> Tone {
    if celsius < AMBIENT_HOT {
        Tone::Primary
    } else if celsius < AMBIENT_VERY_HOT {
        Tone::Warning
    } else {
        Tone::Error
    }
}

/// Progress ring colour.
pub fn progress_tone(percent: f64) -> Tone {
    if percent < 33.0 {
        Tone::Primary
    } else if percent < 66.0 {
        Tone::Warning
    } else {
        Tone::Success
    }
}

/// The progress ring.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProgressView {
    /// Progress in percent, if known.
    pub percent: Option<f64>,
    /// `"42%"` or the placeholder.
    pub text: String,
    /// Ring colour.
    pub tone: Tone,
}

/// The elapsed/remaining/start/end blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimesView {
    /// Time since the cook started.
    pub elapsed: String,
    /// Predicted time left.
    pub remaining: String,
    /// Wall-clock start.
    pub started: String,
    /// Predicted wall-clock end.
    pub ends: String,
}

/// One option of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OptionView {
    /// Value sent back in UI events.
    pub value: String,
    /// Translated label.
    pub label: String,
}

/// A rendered selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SelectorView {
    /// Options in display order.
    pub options: Vec<OptionView>,
    /// Selected value.
    pub selected: Option<String>,
    /// Whether the selector accepts input.
    pub disabled: bool,
}

impl SelectorView {
    fn from_selector(selector: &Selector, label: impl Fn(&str) -> String) -> Self {
        Self {
            options: selector
                .options
                .iter()
                .map(|value| OptionView {
                    value: value.clone(),
                    label: label(value),
                })
                .collect(),
            selected: selector.selected.clone(),
            disabled: selector.disabled,
        }
    }
}

/// The settings panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SettingsView {
    /// Category selector.
    pub category: SelectorView,
    /// Food selector.
    pub food: SelectorView,
    /// Doneness selector.
    pub doneness: SelectorView,
    /// Target field contents.
    pub target_input: String,
    /// Whether the target field accepts input.
    pub target_disabled: bool,
    /// Carryover toggle state.
    pub carryover_enabled: bool,
}

/// The carryover help popup.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HelpView {
    /// Popup title.
    pub title: String,
    /// Body, one entry per paragraph.
    pub paragraphs: Vec<String>,
    /// Close button label.
    pub close: String,
}

/// Start/stop button visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Controls {
    /// Start button.
    pub start: bool,
    /// Stop button.
    pub stop: bool,
}

/// Everything the card displays.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CardView {
    /// Device status.
    pub status: DeviceStatus,
    /// Translated status badge.
    pub status_label: String,
    /// Main content panel.
    pub show_main: bool,
    /// "Connect the probe" prompt, shown instead of the main panel.
    pub connect_prompt: Option<String>,
    /// Battery indicator.
    pub battery: Option<Indicator>,
    /// Signal indicator.
    pub rssi: Option<Indicator>,
    /// Core temperature.
    pub probe_temp: String,
    /// Target temperature row.
    pub target_temp: Option<String>,
    /// Ambient temperature block.
    pub ambient_temp: Option<String>,
    /// Colour of the ambient reading.
    pub ambient_tone: Option<Tone>,
    /// Progress ring.
    pub progress: Option<ProgressView>,
    /// Time blocks.
    pub times: Option<TimesView>,
    /// Heating rate readout.
    pub heating_rate: Option<String>,
    /// Start/stop buttons.
    pub controls: Controls,
    /// Chart panel.
    pub chart_visible: bool,
    /// Chart toggle glyph.
    pub chart_toggle: &'static str,
    /// Selected chart span.
    pub span: ChartSpan,
    /// Span selector options.
    pub span_options: Vec<OptionView>,
    /// Probe-disconnected banner while cooking.
    pub disconnect_warning: Option<String>,
    /// Settings panel.
    pub settings: SettingsView,
    /// Open carryover help popup.
    pub carryover_help: Option<HelpView>,
}

/// Inputs of one render.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Latest snapshot.
    pub snapshot: &'a DeviceSnapshot,
    /// Card configuration.
    pub config: &'a CardConfig,
    /// Cook start anchor.
    pub tracker: &'a StatusTracker,
    /// Selector state.
    pub selectors: &'a SelectorSet,
    /// Translation tables.
    pub translations: &'a Translations,
    /// User's chart show/hide choice, if any.
    pub chart_override: Option<bool>,
    /// Selected chart span.
    pub span: ChartSpan,
    /// Whether the user opened the carryover help.
    pub help_open: bool,
    /// Current time.
    pub now: Timestamp,
}

/// Check if the chart panel is visible.
///
/// Never shown while disconnected or when disabled by configuration.
/// Otherwise the user's toggle wins over the status default (shown only
/// while cooking).
pub fn chart_visible(status: DeviceStatus, config: &CardConfig, user: Option<bool>) -> bool {
    if !config.show_graph || status == DeviceStatus::Disconnected {
        return false;
    }
    user.unwrap_or(status.is_cooking())
}

fn times_view(
    snapshot: &DeviceSnapshot,
    tracker: &StatusTracker,
    now: Timestamp,
    offset: FixedOffset,
) -> TimesView {
    TimesView {
        elapsed: format_duration(Some(tracker.elapsed_minutes(now) as f64)),
        remaining: format_duration(snapshot.remaining_minutes),
        started: format_clock(snapshot.start_time.or(tracker.cooking_start()), offset),
        ends: format_clock(snapshot.estimated_end, offset),
    }
}

fn settings_view(
    snapshot: &DeviceSnapshot,
    selectors: &SelectorSet,
    translations: &Translations,
) -> SettingsView {
    let foods: FoodReference = selectors.foods();
    let category = selectors.category.value().unwrap_or(MANUAL).to_string();
    let food = selectors.food.value().unwrap_or(MANUAL).to_string();

    let placeholder = |value: &str, label: String| {
        if value == MANUAL {
            PLACEHOLDER.to_string()
        } else {
            label
        }
    };

    SettingsView {
        category: SelectorView::from_selector(&selectors.category, |v| {
            translations.t(&category_key(v))
        }),
        food: SelectorView::from_selector(&selectors.food, |v| {
            placeholder(v, translations.t(&food_key(&category, v)))
        }),
        doneness: SelectorView::from_selector(&selectors.doneness, |v| {
            let label = match foods.temperature(&category, &food, v) {
                Some(temp) => format!("{} ({}°)", translations.t(&doneness_key(v)), temp),
                None => translations.t(&doneness_key(v)),
            };
            placeholder(v, label)
        }),
        target_input: selectors
            .target_input
            .map(|t| format!("{}", t.round()))
            .unwrap_or_default(),
        target_disabled: snapshot.status.has_target(),
        carryover_enabled: snapshot.carryover_enabled,
    }
}

/// Render the card.
pub fn render(ctx: &RenderContext<'_>) -> CardView {
    let snapshot = ctx.snapshot;
    let config = ctx.config;
    let status = snapshot.status;
    let t = |key: &str| ctx.translations.t(key);

    let chart_visible = chart_visible(status, config, ctx.chart_override);
    let mut view = CardView {
        status,
        status_label: t(status.as_str()),
        probe_temp: format_temperature(snapshot.probe_temp),
        chart_visible,
        chart_toggle: if chart_visible {
            GLYPH_VISIBLE
        } else {
            GLYPH_HIDDEN
        },
        span: ctx.span,
        span_options: ChartSpan::options()
            .map(|s| OptionView {
                value: s.value(),
                label: t(&s.label_key()),
            })
            .collect(),
        settings: settings_view(snapshot, ctx.selectors, ctx.translations),
        ..Default::default()
    };

    if status == DeviceStatus::Disconnected {
        view.connect_prompt = Some(t("connect_probe"));
        return view;
    }

    view.show_main = true;
    if ctx.help_open {
        view.carryover_help = Some(HelpView {
            title: t("compensation_help_title"),
            paragraphs: t("compensation_help_text")
                .lines()
                .map(str::to_string)
                .collect(),
            close: t("close"),
        });
    }
    view.battery = snapshot
        .battery
        .filter(|_| config.show_battery)
        .map(battery_indicator);
    view.rssi = snapshot
        .rssi
        .filter(|_| config.show_rssi)
        .map(rssi_indicator);

    if status.has_target() {
        view.target_temp = Some(format_temperature(snapshot.displayed_target()));
    }

    view.controls = Controls {
        start: status == DeviceStatus::Idle,
        stop: status.has_target(),
    };

    if status.is_cooking() {
        view.progress = Some(ProgressView {
            percent: snapshot.progress,
            text: snapshot
                .progress
                .map(|p| format!("{}%", p.round()))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            tone: snapshot.progress.map(progress_tone).unwrap_or_default(),
        });
        view.times = Some(times_view(
            snapshot,
            ctx.tracker,
            ctx.now,
            config.time_offset(),
        ));
        view.heating_rate = snapshot
            .heating_rate
            .filter(|_| config.show_rate)
            .map(|r| format_rate(Some(r)));
        if config.show_ambient {
            view.ambient_temp = Some(format_temperature(snapshot.ambient_temp));
            view.ambient_tone = snapshot.ambient_temp.map(ambient_tone);
        }

        let disconnected_for = snapshot.disconnect_seconds.unwrap_or(0.0);
        if !snapshot.probe_connected && disconnected_for > DISCONNECT_WARNING_SECONDS {
            view.disconnect_warning = Some(format!(
                "{} ({}min)",
                t("disconnect_since"),
                snapshot.disconnect_minutes().unwrap_or(0)
            ));
        }
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap()
    }

    fn snapshot(status: DeviceStatus) -> DeviceSnapshot {
        DeviceSnapshot {
            status,
            probe_temp: Some(41.26),
            ambient_temp: Some(120.0),
            withdrawal_temp: Some(57.0),
            desired_temp: Some(60.0),
            carryover_enabled: true,
            battery: Some(80.0),
            rssi: Some(-65.0),
            probe_connected: true,
            progress: Some(45.0),
            heating_rate: Some(1.234),
            remaining_minutes: Some(75.0),
            start_time: Some(now() - Duration::minutes(30)),
            estimated_end: Some(now() + Duration::minutes(75)),
            food_category: Some("beef".to_string()),
            food_type: Some("beef_steak".to_string()),
            doneness: Some("medium".to_string()),
            ..Default::default()
        }
    }

    struct Fixture {
        config: CardConfig,
        tracker: StatusTracker,
        selectors: SelectorSet,
        translations: Translations,
        help_open: bool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: CardConfig::new("grill").unwrap(),
                tracker: StatusTracker::new(),
                selectors: SelectorSet::default(),
                translations: Translations::new(),
                help_open: false,
            }
        }

        fn render(&mut self, snapshot: &DeviceSnapshot, chart_override: Option<bool>) -> CardView {
            self.tracker.observe(snapshot, now());
            render(&RenderContext {
                snapshot,
                config: &self.config,
                tracker: &self.tracker,
                selectors: &self.selectors,
                translations: &self.translations,
                chart_override,
                span: ChartSpan::Auto,
                help_open: self.help_open,
                now: now(),
            })
        }
    }

    #[test]
    fn test_tracker_transitions() {
        let mut tracker = StatusTracker::new();
        let mut cooking = snapshot(DeviceStatus::Cooking);
        cooking.start_time = None;

        assert_eq!(
            tracker.observe(&snapshot(DeviceStatus::Idle), now()),
            Transition::Unchanged
        );
        assert_eq!(tracker.observe(&cooking, now()), Transition::EnteredCooking);
        assert_eq!(tracker.cooking_start(), Some(now()));

        let later = now() + Duration::minutes(5);
        assert_eq!(tracker.observe(&cooking, later), Transition::Unchanged);
        assert_eq!(tracker.cooking_start(), Some(now()));
        assert_eq!(tracker.elapsed_minutes(later), 5);

        assert_eq!(
            tracker.observe(&snapshot(DeviceStatus::Done), later),
            Transition::LeftCooking
        );
        assert_eq!(tracker.cooking_start(), None);
        assert_eq!(tracker.elapsed_minutes(later), 0);

        assert_eq!(tracker.observe(&cooking, later), Transition::EnteredCooking);
        assert_eq!(tracker.cooking_start(), Some(later));
        assert_eq!(tracker.status(), DeviceStatus::Cooking);
    }

    #[test]
    fn test_tracker_prefers_snapshot_start() {
        let mut tracker = StatusTracker::new();
        let cooking = snapshot(DeviceStatus::Cooking);
        assert_eq!(tracker.observe(&cooking, now()), Transition::EnteredCooking);
        assert_eq!(tracker.cooking_start(), cooking.start_time);
        assert_eq!(tracker.elapsed_minutes(now()), 30);
    }

    #[test]
    fn test_battery_bands() {
        let tone = |l| battery_indicator(l).tone;
        assert_eq!(tone(95.0), Tone::Success);
        assert_eq!(tone(70.0), Tone::Success);
        assert_eq!(tone(50.0), Tone::Success);
        assert_eq!(tone(49.0), Tone::Warning);
        assert_eq!(tone(10.0), Tone::Warning);
        assert_eq!(tone(9.0), Tone::Error);
        assert_eq!(battery_indicator(80.0).icon, "mdi:battery-80");
        assert_eq!(battery_indicator(80.0).text, "80%");
    }

    #[test]
    fn test_rssi_bands() {
        assert_eq!(rssi_indicator(-45.0).icon, "mdi:wifi-strength-4");
        assert_eq!(rssi_indicator(-65.0).icon, "mdi:wifi-strength-2");
        assert_eq!(rssi_indicator(-65.0).tone, Tone::Normal);
        assert_eq!(rssi_indicator(-80.0).tone, Tone::Warning);
        assert_eq!(rssi_indicator(-81.0).tone, Tone::Error);
        assert_eq!(rssi_indicator(-65.0).text, "-65 dBm");
    }

    #[test]
    fn test_progress_tone() {
        assert_eq!(progress_tone(0.0), Tone::Primary);
        assert_eq!(progress_tone(32.9), Tone::Primary);
        assert_eq!(progress_tone(33.0), Tone::Warning);
        assert_eq!(progress_tone(65.9), Tone::Warning);
        assert_eq!(progress_tone(66.0), Tone::Success);
    }

    #[test]
    fn test_ambient_tone() {
        assert_eq!(ambient_tone(25.0), Tone::Primary);
        assert_eq!(ambient_tone(99.9), Tone::Primary);
        assert_eq!(ambient_tone(100.0), Tone::Warning);
        assert_eq!(ambient_tone(199.0), Tone::Warning);
        assert_eq!(ambient_tone(230.0), Tone::Error);

        let mut fixture = Fixture::new();
        let view = fixture.render(&snapshot(DeviceStatus::Cooking), None);
        assert_eq!(view.ambient_tone, Some(Tone::Warning));

        let mut unknown = snapshot(DeviceStatus::Cooking);
        unknown.ambient_temp = None;
        let view = fixture.render(&unknown, None);
        assert_eq!(view.ambient_temp.as_deref(), Some("--"));
        assert_eq!(view.ambient_tone, None);
    }

    #[test]
    fn test_carryover_help() {
        let mut fixture = Fixture::new();
        assert!(fixture
            .render(&snapshot(DeviceStatus::Idle), None)
            .carryover_help
            .is_none());

        fixture.help_open = true;
        let help = fixture
            .render(&snapshot(DeviceStatus::Idle), None)
            .carryover_help
            .unwrap();
        assert_eq!(help.title, "Carryover compensation");
        assert_eq!(help.paragraphs.len(), 2);
        assert_eq!(help.close, "Close");
    }

    #[test]
    fn test_disconnected_view() {
        let mut fixture = Fixture::new();
        let view = fixture.render(&snapshot(DeviceStatus::Disconnected), Some(true));

        assert!(!view.show_main);
        assert!(view.battery.is_none());
        assert!(view.rssi.is_none());
        assert!(!view.chart_visible);
        assert_eq!(view.chart_toggle, GLYPH_HIDDEN);
        assert_eq!(view.connect_prompt.as_deref(), Some("Connect the probe"));
        assert_eq!(view.controls, Controls::default());
        assert_eq!(view.status_label, "Disconnected");
    }

    #[test]
    fn test_idle_view() {
        let mut fixture = Fixture::new();
        let view = fixture.render(&snapshot(DeviceStatus::Idle), None);

        assert!(view.show_main);
        assert!(view.connect_prompt.is_none());
        assert_eq!(view.battery.as_ref().map(|b| b.text.as_str()), Some("80%"));
        assert!(view.progress.is_none());
        assert!(view.target_temp.is_none());
        assert!(view.times.is_none());
        assert!(view.heating_rate.is_none());
        assert!(view.ambient_temp.is_none());
        assert_eq!(
            view.controls,
            Controls {
                start: true,
                stop: false
            }
        );
        assert!(!view.chart_visible);
        assert!(!view.settings.target_disabled);
    }

    #[test]
    fn test_cooking_view() {
        let mut fixture = Fixture::new();
        let view = fixture.render(&snapshot(DeviceStatus::Cooking), None);

        assert_eq!(view.probe_temp, "41.3°");
        assert_eq!(view.target_temp.as_deref(), Some("57.0°"));
        assert_eq!(
            view.progress,
            Some(ProgressView {
                percent: Some(45.0),
                text: "45%".to_string(),
                tone: Tone::Warning,
            })
        );
        assert_eq!(
            view.times,
            Some(TimesView {
                elapsed: "0h30".to_string(),
                remaining: "1h15".to_string(),
                started: "17:30".to_string(),
                ends: "19:15".to_string(),
            })
        );
        assert_eq!(view.heating_rate.as_deref(), Some("1.23°/min"));
        assert_eq!(view.ambient_temp.as_deref(), Some("120.0°"));
        assert_eq!(
            view.controls,
            Controls {
                start: false,
                stop: true
            }
        );
        assert!(view.chart_visible);
        assert_eq!(view.chart_toggle, GLYPH_VISIBLE);
        assert!(view.disconnect_warning.is_none());
        assert!(view.settings.target_disabled);
    }

    #[test]
    fn test_done_view() {
        let mut fixture = Fixture::new();
        let mut done = snapshot(DeviceStatus::Done);
        done.carryover_enabled = false;
        let view = fixture.render(&done, None);

        assert_eq!(view.target_temp.as_deref(), Some("60.0°"));
        assert!(view.progress.is_none());
        assert!(view.times.is_none());
        assert!(view.heating_rate.is_none());
        assert!(view.controls.stop && !view.controls.start);
        assert!(!view.chart_visible);
    }

    #[test]
    fn test_config_flags() {
        let mut fixture = Fixture::new();
        fixture.config = CardConfig::new("grill")
            .unwrap()
            .with_battery(false)
            .with_rssi(false)
            .with_graph(false);
        let view = fixture.render(&snapshot(DeviceStatus::Cooking), Some(true));

        assert!(view.battery.is_none());
        assert!(view.rssi.is_none());
        assert!(!view.chart_visible);
    }

    #[test]
    fn test_chart_override_wins() {
        let mut fixture = Fixture::new();
        assert!(!fixture.render(&snapshot(DeviceStatus::Cooking), Some(false)).chart_visible);
        assert!(fixture.render(&snapshot(DeviceStatus::Idle), Some(true)).chart_visible);
    }

    #[test]
    fn test_disconnect_warning() {
        let mut fixture = Fixture::new();
        let mut cooking = snapshot(DeviceStatus::Cooking);
        cooking.probe_connected = false;

        cooking.disconnect_seconds = Some(45.0);
        assert!(fixture.render(&cooking, None).disconnect_warning.is_none());

        cooking.disconnect_seconds = Some(61.0);
        assert_eq!(
            fixture.render(&cooking, None).disconnect_warning.as_deref(),
            Some("Probe disconnected (1min)")
        );

        cooking.disconnect_seconds = Some(300.0);
        cooking.probe_connected = true;
        assert!(fixture.render(&cooking, None).disconnect_warning.is_none());
    }

    #[test]
    fn test_selected_preset_renders() {
        let mut fixture = Fixture::new();
        let cooking = snapshot(DeviceStatus::Cooking);
        fixture.selectors.reconcile(&cooking);
        let view = fixture.render(&cooking, None);

        assert_eq!(view.target_temp.as_deref(), Some("57.0°"));
        assert_eq!(view.settings.category.selected.as_deref(), Some("beef"));
        assert_eq!(view.settings.food.selected.as_deref(), Some("steak"));
        assert_eq!(view.settings.doneness.selected.as_deref(), Some("medium"));
        assert_eq!(view.settings.target_input, "57");
        assert_eq!(view.settings.food.options[0].label, "Steak");
        let medium = view
            .settings
            .doneness
            .options
            .iter()
            .find(|o| o.value == "medium")
            .unwrap();
        assert_eq!(medium.label, "Medium (57°)");
        assert_eq!(view.settings.category.options[0].label, "Manual");
    }

    #[test]
    fn test_manual_placeholders() {
        let mut fixture = Fixture::new();
        let view = fixture.render(&snapshot(DeviceStatus::Idle), None);
        assert_eq!(view.settings.food.options[0].label, PLACEHOLDER);
        assert!(view.settings.food.disabled);
    }

    #[test]
    fn test_span_options() {
        let mut fixture = Fixture::new();
        let view = fixture.render(&snapshot(DeviceStatus::Idle), None);
        assert_eq!(view.span_options.len(), 11);
        assert_eq!(view.span_options[0].value, "auto");
        assert_eq!(view.span_options[4].label, "1h");
    }

    #[test]
    fn test_span_labels_translated() {
        let mut fixture = Fixture::new();
        let mut german = crate::source::translations::StringTable::new();
        german.insert("span_60".to_string(), "1 Std".to_string());
        fixture.translations.insert("de", german);
        fixture.translations.activate("de");

        let view = fixture.render(&snapshot(DeviceStatus::Idle), None);
        assert_eq!(view.span_options[4].label, "1 Std");
        assert_eq!(view.span_options[2].label, "15 min");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    proptest! {
        /// A disconnected device hides the main panel, both indicators and
        /// the chart whatever else the snapshot or configuration says.
        #[test]
        fn disconnected_hides_everything(
            battery in proptest::option::of(0.0f64..100.0),
            rssi in proptest::option::of(-100.0f64..0.0),
            progress in proptest::option::of(0.0f64..100.0),
            probe_connected: bool,
            carryover_enabled: bool,
            show_battery: bool,
            show_rssi: bool,
            show_graph: bool,
            chart_override in proptest::option::of(any::<bool>()),
        ) {
            let snapshot = DeviceSnapshot {
                status: DeviceStatus::Disconnected,
                battery,
                rssi,
                progress,
                probe_connected,
                carryover_enabled,
                ..Default::default()
            };
            let config = CardConfig::new("grill")
                .unwrap()
                .with_battery(show_battery)
                .with_rssi(show_rssi)
                .with_graph(show_graph);
            let view = render(&RenderContext {
                snapshot: &snapshot,
                config: &config,
                tracker: &StatusTracker::new(),
                selectors: &SelectorSet::default(),
                translations: &Translations::new(),
                chart_override,
                span: ChartSpan::Auto,
                help_open: true,
                now: Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap(),
            });

            prop_assert!(!view.show_main);
            prop_assert!(view.battery.is_none());
            prop_assert!(view.rssi.is_none());
            prop_assert!(!view.chart_visible);
            prop_assert!(view.carryover_help.is_none());
        }
    }
}
