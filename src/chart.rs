//! Chart window engine.
//!
//! Computes the visible time window of the temperature chart and derives
//! the four plotted series from raw history:
//!
//! - **actual**: probe readings inside the past part of the window
//! - **target**: a flat line at the withdrawal temperature
//! - **projection**: a straight line from the last reading to the target
//!   at the predicted finish time
//! - **ambient**: ambient readings inside the past part of the window
//!
//! The window is split 2:1 between past and future so recent history
//! dominates while leaving room for the projection.

use chrono::Duration;

use crate::data::history::{Sample, Timestamp};
use crate::data::span::ChartSpan;
use crate::data::status::DeviceStatus;

/// Span used when no cook is running.
pub const IDLE_SPAN_MINUTES: u32 = 60;

/// Remaining-time predictions at or above this are treated as implausible.
pub const MAX_PLAUSIBLE_REMAINING: f64 = 720.0;

/// Smallest height of the primary axis in °C.
pub const MIN_PRIMARY_RANGE: f64 = 5.0;

const PRIMARY_PADDING: f64 = 2.0;
const AMBIENT_PADDING: f64 = 10.0;

// Offsets stay well inside the range chrono can represent.
const MAX_OFFSET_MINUTES: f64 = 10.0 * 365.0 * 24.0 * 60.0;

fn minutes(m: f64) -> Duration {
    let m = m.clamp(-MAX_OFFSET_MINUTES, MAX_OFFSET_MINUTES);
    Duration::milliseconds((m * 60_000.0).round() as i64)
}

fn minutes_between(from: Timestamp, to: Timestamp) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

/// The visible time range of the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartWindow {
    /// Left edge.
    pub start: Timestamp,
    /// Right edge.
    pub end: Timestamp,
    /// The instant the window was computed at.
    pub now: Timestamp,
    /// Total width in minutes.
    pub span_minutes: u32,
    /// How the width was chosen.
    pub mode: ChartSpan,
}

impl ChartWindow {
    /// Minutes shown before `now`.
    pub fn past_minutes(&self) -> f64 {
        self.span_minutes as f64 * 2.0 / 3.0
    }

    /// Minutes shown after `now`.
    pub fn future_minutes(&self) -> f64 {
        self.span_minutes as f64 / 3.0
    }

    /// Check if a sample time lies in the observed part of the window.
    pub fn contains_past(&self, t: Timestamp) -> bool {
        t >= self.start && t <= self.now
    }

    /// Hours of history needed to fill the window.
    pub fn history_hours(&self) -> u32 {
        (self.span_minutes + 59) / 60 + 1
    }
}

/// Pick a span for the auto mode.
///
/// # Arguments
///
/// * `status` - Current device status
/// * `cooking_start` - When the current cook started, if known
/// * `remaining_minutes` - Predicted minutes to the withdrawal temperature
/// * `now` - Current time
pub fn auto_span_minutes(
    status: DeviceStatus,
    cooking_start: Option<Timestamp>,
    remaining_minutes: Option<f64>,
    now: Timestamp,
) -> u32 {
    let start = match (status, cooking_start) {
        (DeviceStatus::Cooking, Some(start)) => start,
        _ => return IDLE_SPAN_MINUTES,
    };
    let elapsed = minutes_between(start, now).max(0.0);

    match remaining_minutes {
        Some(remaining) if remaining > 0.0 && remaining < MAX_PLAUSIBLE_REMAINING => {
            // 10% margin around the full predicted cook
            let total = (elapsed + remaining) * 11.0 / 10.0;
            (total - 1e-9).ceil().max(1.0) as u32
        }
        _ => match elapsed {
            e if e < 3.0 => 5,
            e if e < 5.0 => 10,
            e if e < 15.0 => 15,
            e if e < 30.0 => 30,
            e => (((e + 15.0) / 15.0).ceil() * 15.0) as u32,
        },
    }
}

/// Compute the chart window.
///
/// An explicit span is used as is; otherwise the auto policy of
/// [`auto_span_minutes`] applies.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use cooker_card::chart::compute_window;
/// use cooker_card::{ChartSpan, DeviceStatus};
///
/// let now = Utc::now();
/// let window = compute_window(
///     DeviceStatus::Cooking,
///     Some(now - Duration::minutes(10)),
///     Some(20.0),
///     ChartSpan::Auto,
///     now,
/// );
/// assert_eq!(window.span_minutes, 33);
/// assert_eq!(window.past_minutes(), 22.0);
/// assert_eq!(window.future_minutes(), 11.0);
/// ```
pub fn compute_window(
    status: DeviceStatus,
    cooking_start: Option<Timestamp>,
    remaining_minutes: Option<f64>,
    span: ChartSpan,
    now: Timestamp,
) -> ChartWindow {
    let span_minutes = match span {
        ChartSpan::Minutes(m) if m > 0 => m,
        _ => auto_span_minutes(status, cooking_start, remaining_minutes, now),
    };

    let mut window = ChartWindow {
        start: now,
        end: now,
        now,
        span_minutes,
        mode: span,
    };
    window.start = now - minutes(window.past_minutes());
    window.end = now + minutes(window.future_minutes());
    window
}

/// The four plotted series.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesSet {
    /// Probe readings.
    pub actual: Vec<Sample>,
    /// Flat withdrawal-temperature line.
    pub target: Vec<Sample>,
    /// Forecast line from the last reading to the target.
    pub projection: Vec<Sample>,
    /// Ambient readings.
    pub ambient: Vec<Sample>,
}

impl SeriesSet {
    /// Check if nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
            && self.target.is_empty()
            && self.projection.is_empty()
            && self.ambient.is_empty()
    }
}

fn clip(window: &ChartWindow, samples: &[Sample]) -> Vec<Sample> {
    samples
        .iter()
        .filter(|s| window.contains_past(s.timestamp))
        .copied()
        .collect()
}

/// Derive the plotted series from raw samples.
///
/// Raw samples are expected in time order.
pub fn build_series(
    window: &ChartWindow,
    probe: &[Sample],
    ambient: &[Sample],
    withdrawal_temp: Option<f64>,
    remaining_minutes: Option<f64>,
    status: DeviceStatus,
) -> SeriesSet {
    let actual = clip(window, probe);
    let ambient = clip(window, ambient);

    let mut target = Vec::new();
    let mut projection = Vec::new();

    if let (true, Some(withdrawal), Some(last)) =
        (status.has_target(), withdrawal_temp, actual.last())
    {
        target = vec![
            Sample::new(window.start, withdrawal),
            Sample::new(window.end, withdrawal),
        ];

        if let (DeviceStatus::Cooking, Some(remaining)) = (status, remaining_minutes) {
            if remaining > 0.0 {
                projection = vec![
                    *last,
                    Sample::new(window.now + minutes(remaining), withdrawal),
                ];
            }
        }
    }

    SeriesSet {
        actual,
        target,
        projection,
        ambient,
    }
}

/// A vertical axis range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl AxisRange {
    /// Create a range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Height of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    fn around(values: impl Iterator<Item = f64>, padding: f64) -> Option<Self> {
        values.fold(None, |range: Option<Self>, v| {
            Some(match range {
                Some(r) => Self::new(r.min.min(v), r.max.max(v)),
                None => Self::new(v, v),
            })
        })
        .map(|r| Self::new(r.min - padding, r.max + padding))
    }
}

/// Range of the primary (probe) axis.
///
/// Covers the actual readings and, for a running or finished cook, the
/// withdrawal temperature, padded by 2°. Ranges narrower than 5° are widened
/// symmetrically. With nothing to show the range is `0..100`.
pub fn primary_range(
    series: &SeriesSet,
    withdrawal_temp: Option<f64>,
    status: DeviceStatus,
) -> AxisRange {
    let target = withdrawal_temp.filter(|_| status.has_target());
    let values = series.actual.iter().map(|s| s.value).chain(target);

    match AxisRange::around(values, PRIMARY_PADDING) {
        Some(range) if range.span() < MIN_PRIMARY_RANGE => {
            let mid = (range.min + range.max) / 2.0;
            AxisRange::new(mid - MIN_PRIMARY_RANGE / 2.0, mid + MIN_PRIMARY_RANGE / 2.0)
        }
        Some(range) => range,
        None => AxisRange::new(0.0, 100.0),
    }
}

/// Range of the secondary (ambient) axis, padded by 10°.
pub fn ambient_range(series: &SeriesSet) -> AxisRange {
    AxisRange::around(series.ambient.iter().map(|s| s.value), AMBIENT_PADDING)
        .unwrap_or(AxisRange::new(0.0, 100.0))
}

/// Display names of the four series.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesLabels {
    /// Probe series name.
    pub probe: String,
    /// Target series name.
    pub target: String,
    /// Projection series name.
    pub projection: String,
    /// Ambient series name.
    pub ambient: String,
}

impl Default for SeriesLabels {
    fn default() -> Self {
        Self {
            probe: "Probe".to_string(),
            target: "Target".to_string(),
            projection: "Projection".to_string(),
            ambient: "Ambient".to_string(),
        }
    }
}

/// Everything a chart host needs to draw one update.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartFrame {
    /// Horizontal range.
    pub window: ChartWindow,
    /// Series to draw.
    pub series: SeriesSet,
    /// Probe axis.
    pub primary: AxisRange,
    /// Ambient axis.
    pub ambient: AxisRange,
    /// Series names.
    pub labels: SeriesLabels,
}

impl ChartFrame {
    /// Build a frame from raw history.
    pub fn build(
        window: ChartWindow,
        probe: &[Sample],
        ambient: &[Sample],
        withdrawal_temp: Option<f64>,
        remaining_minutes: Option<f64>,
        status: DeviceStatus,
        labels: SeriesLabels,
    ) -> Self {
        let series = build_series(
            &window,
            probe,
            ambient,
            withdrawal_temp,
            remaining_minutes,
            status,
        );
        let primary = primary_range(&series, withdrawal_temp, status);
        let ambient = ambient_range(&series);

        Self {
            window,
            series,
            primary,
            ambient,
            labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap()
    }

    fn ago(m: i64) -> Timestamp {
        now() - Duration::minutes(m)
    }

    fn cooking_window(span: ChartSpan) -> ChartWindow {
        compute_window(DeviceStatus::Cooking, Some(ago(10)), Some(20.0), span, now())
    }

    #[test]
    fn test_auto_window_from_prediction() {
        let window = cooking_window(ChartSpan::Auto);
        assert_eq!(window.span_minutes, 33);
        assert_eq!(window.past_minutes(), 22.0);
        assert_eq!(window.future_minutes(), 11.0);
        assert_eq!(window.start, ago(22));
        assert_eq!(window.end, now() + Duration::minutes(11));
        assert_eq!(window.mode, ChartSpan::Auto);
    }

    #[test]
    fn test_auto_window_elapsed_breakpoints() {
        let span = |elapsed: i64, remaining: Option<f64>| {
            auto_span_minutes(DeviceStatus::Cooking, Some(ago(elapsed)), remaining, now())
        };
        assert_eq!(span(1, None), 5);
        assert_eq!(span(4, Some(0.0)), 10);
        assert_eq!(span(10, Some(900.0)), 15);
        assert_eq!(span(20, Some(-5.0)), 30);
        assert_eq!(span(30, None), 45);
        assert_eq!(span(50, None), 75);
        assert_eq!(span(60, Some(720.0)), 75);
    }

    #[test]
    fn test_auto_window_not_cooking() {
        for status in [
            DeviceStatus::Idle,
            DeviceStatus::Done,
            DeviceStatus::Disconnected,
        ] {
            assert_eq!(
                auto_span_minutes(status, Some(ago(10)), Some(20.0), now()),
                IDLE_SPAN_MINUTES
            );
        }
        assert_eq!(
            auto_span_minutes(DeviceStatus::Cooking, None, Some(20.0), now()),
            IDLE_SPAN_MINUTES
        );
    }

    #[test]
    fn test_explicit_span() {
        let window = cooking_window(ChartSpan::Minutes(120));
        assert_eq!(window.span_minutes, 120);
        assert_eq!(window.start, ago(80));
        assert_eq!(window.end, now() + Duration::minutes(40));
        assert_eq!(window.history_hours(), 3);
    }

    #[test]
    fn test_history_hours() {
        let hours = |span| cooking_window(ChartSpan::Minutes(span)).history_hours();
        assert_eq!(hours(5), 2);
        assert_eq!(hours(60), 2);
        assert_eq!(hours(240), 5);
        assert_eq!(hours(1440), 25);
    }

    #[test]
    fn test_series_clipped_to_past() {
        let window = cooking_window(ChartSpan::Auto);
        let probe = vec![
            Sample::new(ago(30), 10.0),
            Sample::new(ago(22), 12.0),
            Sample::new(ago(5), 30.0),
            Sample::new(now() + Duration::minutes(1), 99.0),
        ];

        let series = build_series(
            &window,
            &probe,
            &[],
            Some(57.0),
            Some(20.0),
            DeviceStatus::Cooking,
        );
        assert_eq!(
            series.actual,
            vec![Sample::new(ago(22), 12.0), Sample::new(ago(5), 30.0)]
        );
        assert_eq!(
            series.target,
            vec![
                Sample::new(window.start, 57.0),
                Sample::new(window.end, 57.0)
            ]
        );
        assert_eq!(
            series.projection,
            vec![
                Sample::new(ago(5), 30.0),
                Sample::new(now() + Duration::minutes(20), 57.0)
            ]
        );
        assert!(series.ambient.is_empty());
    }

    #[test]
    fn test_target_requires_actual_samples() {
        let window = cooking_window(ChartSpan::Auto);
        let series = build_series(
            &window,
            &[Sample::new(ago(60), 20.0)],
            &[],
            Some(57.0),
            Some(20.0),
            DeviceStatus::Cooking,
        );
        assert!(series.target.is_empty());
        assert!(series.projection.is_empty());
    }

    #[test]
    fn test_done_has_target_without_projection() {
        let window = cooking_window(ChartSpan::Auto);
        let series = build_series(
            &window,
            &[Sample::new(ago(1), 57.5)],
            &[],
            Some(57.0),
            Some(20.0),
            DeviceStatus::Done,
        );
        assert_eq!(series.target.len(), 2);
        assert!(series.projection.is_empty());
    }

    #[test]
    fn test_idle_has_no_target() {
        let window = cooking_window(ChartSpan::Auto);
        let series = build_series(
            &window,
            &[Sample::new(ago(1), 20.0)],
            &[Sample::new(ago(1), 22.0)],
            Some(57.0),
            Some(20.0),
            DeviceStatus::Idle,
        );
        assert!(series.target.is_empty());
        assert_eq!(series.ambient.len(), 1);
        assert!(!series.is_empty());
    }

    #[test]
    fn test_primary_range_widens_flat_line() {
        let series = SeriesSet {
            actual: vec![Sample::new(ago(3), 50.0), Sample::new(ago(2), 50.0)],
            ..Default::default()
        };
        assert_eq!(
            primary_range(&series, None, DeviceStatus::Cooking),
            AxisRange::new(47.5, 52.5)
        );
    }

    #[test]
    fn test_primary_range_includes_target() {
        let series = SeriesSet {
            actual: vec![Sample::new(ago(3), 20.0), Sample::new(ago(2), 30.0)],
            ..Default::default()
        };
        assert_eq!(
            primary_range(&series, Some(57.0), DeviceStatus::Cooking),
            AxisRange::new(18.0, 59.0)
        );
        assert_eq!(
            primary_range(&series, Some(57.0), DeviceStatus::Idle),
            AxisRange::new(18.0, 32.0)
        );
    }

    #[test]
    fn test_default_ranges() {
        let series = SeriesSet::default();
        assert_eq!(
            primary_range(&series, None, DeviceStatus::Idle),
            AxisRange::new(0.0, 100.0)
        );
        assert_eq!(ambient_range(&series), AxisRange::new(0.0, 100.0));
    }

    #[test]
    fn test_ambient_range() {
        let series = SeriesSet {
            ambient: vec![Sample::new(ago(3), 110.0), Sample::new(ago(2), 150.0)],
            ..Default::default()
        };
        assert_eq!(ambient_range(&series), AxisRange::new(100.0, 160.0));
    }

    #[test]
    fn test_frame_build() {
        let window = cooking_window(ChartSpan::Auto);
        let frame = ChartFrame::build(
            window,
            &[Sample::new(ago(5), 30.0)],
            &[Sample::new(ago(5), 120.0)],
            Some(57.0),
            Some(20.0),
            DeviceStatus::Cooking,
            SeriesLabels::default(),
        );
        assert_eq!(frame.primary, AxisRange::new(28.0, 59.0));
        assert_eq!(frame.ambient, AxisRange::new(110.0, 130.0));
        assert_eq!(frame.series.projection.len(), 2);
        assert_eq!(frame.labels.probe, "Probe");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::data::span::SPAN_MINUTES;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap()
    }

    proptest! {
        /// The window always straddles `now` and matches its span.
        #[test]
        fn window_straddles_now(
            elapsed in 0i64..2000,
            remaining in proptest::option::of(-100.0f64..2000.0),
            explicit in proptest::option::of(proptest::sample::select(SPAN_MINUTES.to_vec())),
        ) {
            let span = explicit.map(ChartSpan::Minutes).unwrap_or_default();
            let window = compute_window(
                DeviceStatus::Cooking,
                Some(now() - Duration::minutes(elapsed)),
                remaining,
                span,
                now(),
            );
            prop_assert!(window.span_minutes >= 1);
            prop_assert!(window.start <= window.now && window.now <= window.end);
            let width = (window.end - window.start).num_milliseconds();
            let expected = window.span_minutes as i64 * 60_000;
            prop_assert!((width - expected).abs() <= 1);
        }

        /// Plotted readings never leave the observed part of the window, and
        /// the primary axis is never flatter than the minimum.
        #[test]
        fn series_stay_in_window(
            offsets in proptest::collection::vec((-3000i64..600, 0.0f64..300.0), 0..50),
            withdrawal in proptest::option::of(30.0f64..100.0),
        ) {
            let mut probe: Vec<Sample> = offsets
                .iter()
                .map(|(secs, v)| Sample::new(now() + Duration::seconds(*secs), *v))
                .collect();
            probe.sort_by_key(|s| s.timestamp);

            let window = compute_window(DeviceStatus::Cooking, None, None, ChartSpan::Minutes(60), now());
            let series = build_series(&window, &probe, &probe, withdrawal, Some(10.0), DeviceStatus::Cooking);

            for s in series.actual.iter().chain(series.ambient.iter()) {
                prop_assert!(window.contains_past(s.timestamp));
            }
            prop_assert!(series.projection.is_empty() || series.projection.len() == 2);
            prop_assert!(primary_range(&series, withdrawal, DeviceStatus::Cooking).span() >= MIN_PRIMARY_RANGE - 1e-9);
        }
    }
}
