//! Card controller.
//!
//! [`CardController`] owns all state that survives between updates (the
//! backend baseline, the cook start anchor, the selectors, the chart toggle
//! and span) and reacts to [`CardEvent`]s: telemetry pushes, user
//! interactions, timer ticks and the results of the async loads it starts.
//!
//! Async work (translation tables, history queries, chart bootstrap) runs on
//! spawned tasks that post their result back into the controller's inbox,
//! tagged with the generation current when they started. A result whose
//! generation has been superseded is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::chart::{compute_window, ChartFrame, SeriesLabels};
use crate::clock::{Clock, SystemClock};
use crate::data::config::{CardConfig, CardEntity, EntityIds};
use crate::data::history::{sort_samples, Sample};
use crate::data::snapshot::DeviceSnapshot;
use crate::data::span::ChartSpan;
use crate::error::{Error, Result};
use crate::reconciler::{BackendSync, SelectorSet};
use crate::render::{render, CardView, RenderContext, StatusTracker, Transition};
use crate::source::chart::{ChartBootstrap, ChartHost};
use crate::source::commands::{Command, CommandSink};
use crate::source::telemetry::TelemetrySource;
use crate::source::translations::{
    resolve_language, TranslationProvider, Translations, DEFAULT_LANGUAGE,
};

/// Period of the elapsed-time tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

const VIEW_CHANNEL_CAPACITY: usize = 16;

/// Receiving end of a controller's inbox.
pub type CardInbox = mpsc::UnboundedReceiver<CardEvent>;

/// A user interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Category selector changed.
    CategoryChanged(String),
    /// Food selector changed.
    FoodChanged(String),
    /// Doneness selector changed.
    DonenessChanged(String),
    /// Target field edited, in °C.
    TargetEdited(f64),
    /// Start button pressed.
    StartPressed,
    /// Stop button pressed.
    StopPressed,
    /// Carryover toggle flipped.
    CarryoverToggled,
    /// Chart show/hide toggle pressed.
    ChartToggled,
    /// Chart span picked.
    SpanSelected(ChartSpan),
    /// A reading was clicked; asks for its entity's details.
    EntityClicked(CardEntity),
    /// Carryover help opened.
    CarryoverHelpOpened,
    /// Carryover help closed.
    CarryoverHelpClosed,
}

/// Input of the controller.
#[derive(Debug)]
pub enum CardEvent {
    /// The telemetry source has new state.
    Telemetry,
    /// The user did something.
    Ui(UiEvent),
    /// One elapsed-time tick.
    Tick,
    /// Replace the configuration.
    Reconfigure(CardConfig),
    /// A translation load finished.
    TranslationsLoaded {
        /// Generation the load was started in.
        generation: u64,
        /// Language code.
        code: String,
        /// Load outcome.
        result: Result<()>,
    },
    /// A history query finished.
    HistoryLoaded {
        /// Generation the query was started in.
        generation: u64,
        /// Probe temperature samples.
        probe: Vec<Sample>,
        /// Ambient temperature samples.
        ambient: Vec<Sample>,
    },
    /// The chart host is ready to draw.
    ChartReady,
    /// The chart could not be created.
    ChartFailed(String),
    /// Stop [`CardController::run`].
    Shutdown,
}

/// External collaborators of a controller.
#[derive(Clone)]
pub struct Collaborators {
    /// Device state and history.
    pub telemetry: Arc<dyn TelemetrySource>,
    /// Device commands.
    pub commands: Arc<dyn CommandSink>,
    /// Translation tables.
    pub translations: Arc<dyn TranslationProvider>,
    /// Chart drawing surface, if the card has one.
    pub chart: Option<Arc<dyn ChartHost>>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Collaborators without a chart, on the system clock.
    pub fn new(
        telemetry: Arc<dyn TelemetrySource>,
        commands: Arc<dyn CommandSink>,
        translations: Arc<dyn TranslationProvider>,
    ) -> Self {
        Self {
            telemetry,
            commands,
            translations,
            chart: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Attach a chart host.
    pub fn with_chart(mut self, chart: Arc<dyn ChartHost>) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Use another clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("chart", &self.chart.is_some())
            .finish_non_exhaustive()
    }
}

/// Once-per-second tick source for the elapsed-time display.
///
/// Starting a running timer and stopping a stopped one are no-ops. The
/// pending tick is cancelled on stop and on drop.
#[derive(Debug, Default)]
pub struct ElapsedTimer {
    handle: Option<JoinHandle<()>>,
}

impl ElapsedTimer {
    /// Create a stopped timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start posting [`CardEvent::Tick`] every second.
    pub fn start(&mut self, tx: mpsc::UnboundedSender<CardEvent>) {
        if self.is_running() {
            return;
        }

        debug!("Starting elapsed timer");
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(CardEvent::Tick).is_err() {
                    break;
                }
            }
        }));
    }

    /// Stop ticking.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Stopping elapsed timer");
            handle.abort();
        }
    }

    /// Check if the timer is running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartState {
    Absent,
    Loading,
    Ready,
    Failed,
}

/// The card's orchestrator.
pub struct CardController {
    config: CardConfig,
    entities: EntityIds,
    collaborators: Collaborators,
    translations: Translations,
    sync: BackendSync,
    selectors: SelectorSet,
    tracker: StatusTracker,
    snapshot: DeviceSnapshot,
    chart_override: Option<bool>,
    span: ChartSpan,
    help_open: bool,
    chart_state: ChartState,
    chart_frame: Option<ChartFrame>,
    bootstrap: ChartBootstrap,
    history_probe: Vec<Sample>,
    history_ambient: Vec<Sample>,
    generation: u64,
    pending_language: Option<(u64, String)>,
    pending_history: Option<u64>,
    requested_language: Option<String>,
    timer: ElapsedTimer,
    tx: mpsc::UnboundedSender<CardEvent>,
    view_tx: broadcast::Sender<CardView>,
    view: CardView,
}

impl CardController {
    /// Create a controller and its inbox.
    ///
    /// Nothing is read until the first [`CardEvent::Telemetry`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use cooker_card::controller::{CardController, CardEvent, Collaborators};
    /// use cooker_card::source::{MemoryTelemetry, MemoryTranslations, RecordingSink};
    /// use cooker_card::source::telemetry::EntityState;
    /// use cooker_card::{CardConfig, DeviceStatus};
    ///
    /// # tokio_test::block_on(async {
    /// let telemetry = Arc::new(MemoryTelemetry::new());
    /// telemetry.set_state(EntityState::new("sensor.grill_state", "idle"));
    ///
    /// let collaborators = Collaborators::new(
    ///     telemetry,
    ///     Arc::new(RecordingSink::new()),
    ///     Arc::new(MemoryTranslations::new()),
    /// );
    /// let config = CardConfig::new("grill").unwrap();
    /// let (mut card, _inbox) = CardController::new(config, collaborators);
    ///
    /// card.handle_event(CardEvent::Telemetry).await.unwrap();
    /// assert_eq!(card.view().status, DeviceStatus::Idle);
    /// assert!(card.view().controls.start);
    /// # });
    /// ```
    pub fn new(config: CardConfig, collaborators: Collaborators) -> (Self, CardInbox) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let (view_tx, _) = broadcast::channel(VIEW_CHANNEL_CAPACITY);
        let entities = config.entities();

        info!("Card configured for '{}'", config.entity_prefix);

        let controller = Self {
            config,
            entities,
            collaborators,
            translations: Translations::new(),
            sync: BackendSync::new(),
            selectors: SelectorSet::default(),
            tracker: StatusTracker::new(),
            snapshot: DeviceSnapshot::default(),
            chart_override: None,
            span: ChartSpan::Auto,
            help_open: false,
            chart_state: ChartState::Absent,
            chart_frame: None,
            bootstrap: ChartBootstrap::default(),
            history_probe: Vec::new(),
            history_ambient: Vec::new(),
            generation: 0,
            pending_language: None,
            pending_history: None,
            requested_language: None,
            timer: ElapsedTimer::new(),
            tx,
            view_tx,
            view: CardView::default(),
        };
        (controller, inbox)
    }

    /// Use a custom chart bootstrap policy.
    pub fn with_bootstrap(mut self, bootstrap: ChartBootstrap) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// A sender into this controller's inbox.
    pub fn sender(&self) -> mpsc::UnboundedSender<CardEvent> {
        self.tx.clone()
    }

    /// Subscribe to rendered views.
    pub fn subscribe(&self) -> broadcast::Receiver<CardView> {
        self.view_tx.subscribe()
    }

    /// The last rendered view.
    pub fn view(&self) -> &CardView {
        &self.view
    }

    /// The current configuration.
    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    /// The selector state.
    pub fn selectors(&self) -> &SelectorSet {
        &self.selectors
    }

    /// The cook start tracker.
    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    /// The backend change detector.
    pub fn backend_sync(&self) -> &BackendSync {
        &self.sync
    }

    /// The translation cache.
    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// The user's chart toggle, if any.
    pub fn chart_override(&self) -> Option<bool> {
        self.chart_override
    }

    /// The selected chart span.
    pub fn span(&self) -> ChartSpan {
        self.span
    }

    /// The last frame handed to the chart host.
    pub fn chart_frame(&self) -> Option<&ChartFrame> {
        self.chart_frame.as_ref()
    }

    /// Check if the chart host is ready.
    pub fn chart_ready(&self) -> bool {
        self.chart_state == ChartState::Ready
    }

    /// Check if the elapsed timer is running.
    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    /// The current async generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drain the inbox until [`CardEvent::Shutdown`] or until every sender
    /// is gone.
    pub async fn run(&mut self, mut inbox: CardInbox) {
        info!("Card controller running");
        while let Some(event) = inbox.recv().await {
            if matches!(event, CardEvent::Shutdown) {
                break;
            }
            if let Err(e) = self.handle_event(event).await {
                warn!("Card event failed: {}", e);
            }
        }
        self.timer.stop();
        info!("Card controller stopped");
    }

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for a rejected user input (for
    /// example a target outside 30–100 °C). Failures of the peripheral
    /// collaborators are logged and never returned.
    pub async fn handle_event(&mut self, event: CardEvent) -> Result<()> {
        match event {
            CardEvent::Telemetry => self.on_telemetry(),
            CardEvent::Ui(ui) => return self.on_ui(ui).await,
            CardEvent::Tick => self.on_tick(),
            CardEvent::Reconfigure(config) => self.reconfigure(config),
            CardEvent::TranslationsLoaded {
                generation,
                code,
                result,
            } => self.on_translations_loaded(generation, &code, result),
            CardEvent::HistoryLoaded {
                generation,
                probe,
                ambient,
            } => self.on_history_loaded(generation, probe, ambient),
            CardEvent::ChartReady => self.on_chart_ready(),
            CardEvent::ChartFailed(reason) => {
                error!("Chart unavailable: {}", reason);
                self.chart_state = ChartState::Failed;
            }
            CardEvent::Shutdown => self.timer.stop(),
        }
        Ok(())
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn on_telemetry(&mut self) {
        let snapshot = match DeviceSnapshot::read(
            self.collaborators.telemetry.as_ref(),
            &self.entities,
        ) {
            Some(snapshot) => snapshot,
            None => {
                let e = Error::DataUnavailable {
                    entity: self.entities.state.clone(),
                };
                warn!("{}", e);
                DeviceSnapshot::default()
            }
        };

        self.check_language();

        let now = self.collaborators.clock.now();
        match self.tracker.observe(&snapshot, now) {
            Transition::EnteredCooking => {
                info!("Cook started");
                self.timer.start(self.tx.clone());
            }
            Transition::LeftCooking => {
                info!("Cook ended ({})", snapshot.status);
                self.timer.stop();
            }
            Transition::Unchanged => {}
        }

        if self.sync.has_backend_changed(&snapshot) {
            info!("Backend selection changed, syncing selectors");
            self.selectors.reconcile(&snapshot);
        }
        self.selectors.show_target(snapshot.settings_target());

        self.snapshot = snapshot;
        self.refresh();

        // A failed or short fetch is made good on the next push.
        if self.chart_ready() && self.view.chart_visible {
            self.request_history();
        }
    }

    fn check_language(&mut self) {
        let raw = self.collaborators.telemetry.language();
        let code = resolve_language(raw.as_deref());
        if self.requested_language.as_deref() == Some(code) {
            return;
        }
        debug!("Language detected: {:?} -> '{}'", raw, code);
        self.requested_language = Some(code.to_string());

        if self.translations.activate(code) {
            self.pending_language = None;
            return;
        }

        let generation = self.next_generation();
        self.pending_language = Some((generation, code.to_string()));

        let translations = self.translations.clone();
        let provider = self.collaborators.translations.clone();
        let tx = self.tx.clone();
        let code = code.to_string();
        tokio::spawn(async move {
            let result = translations.load(provider.as_ref(), &code).await;
            let _ = tx.send(CardEvent::TranslationsLoaded {
                generation,
                code,
                result,
            });
        });
    }

    fn on_translations_loaded(&mut self, generation: u64, code: &str, result: Result<()>) {
        match &self.pending_language {
            Some((pending, _)) if *pending == generation => {}
            _ => {
                debug!("Discarding stale '{}' translations", code);
                return;
            }
        }
        self.pending_language = None;

        match result {
            Ok(()) => {
                self.translations.activate(code);
            }
            Err(e) => {
                warn!("{}; falling back to '{}'", e, DEFAULT_LANGUAGE);
                self.translations.activate(DEFAULT_LANGUAGE);
            }
        }

        // Re-sync against the latest snapshot, including changes that
        // arrived while the table was loading.
        self.sync.reset();
        if self.sync.has_backend_changed(&self.snapshot) {
            debug!("Re-syncing selectors after translation load");
            self.selectors.reconcile(&self.snapshot);
            self.selectors.show_target(self.snapshot.settings_target());
        }
        self.refresh();
    }

    fn on_tick(&mut self) {
        if self.snapshot.status.is_cooking() {
            self.refresh();
        }
    }

    async fn on_ui(&mut self, event: UiEvent) -> Result<()> {
        debug!("UI event: {:?}", event);
        let command = match event {
            UiEvent::CategoryChanged(category) => {
                Some(self.selectors.on_category_changed(&category)?)
            }
            UiEvent::FoodChanged(food) => Some(self.selectors.on_food_changed(&food)?),
            UiEvent::DonenessChanged(doneness) => {
                Some(self.selectors.on_doneness_changed(&doneness)?)
            }
            UiEvent::TargetEdited(celsius) => Some(self.selectors.on_target_edited(celsius)?),
            UiEvent::StartPressed => Some(Command::StartCooking),
            UiEvent::StopPressed => Some(Command::StopCooking),
            UiEvent::CarryoverToggled => Some(Command::SetCarryover {
                enabled: !self.snapshot.carryover_enabled,
            }),
            UiEvent::ChartToggled => {
                self.chart_override = Some(!self.view.chart_visible);
                None
            }
            UiEvent::SpanSelected(span) => {
                self.span = span;
                if self.chart_ready() {
                    self.request_history();
                }
                None
            }
            UiEvent::EntityClicked(entity) => Some(Command::ShowMoreInfo {
                entity_id: self.entities.id(entity).to_string(),
            }),
            UiEvent::CarryoverHelpOpened => {
                self.help_open = true;
                None
            }
            UiEvent::CarryoverHelpClosed => {
                self.help_open = false;
                None
            }
        };

        if let Some(command) = command {
            self.dispatch(command).await;
        }
        self.refresh();
        Ok(())
    }

    async fn dispatch(&self, command: Command) {
        let name = command.name();
        info!("Dispatching {} to {}", name, self.entities.state);
        if let Err(e) = command
            .dispatch(self.collaborators.commands.as_ref(), &self.entities.state)
            .await
        {
            warn!("Command {} failed: {}", name, e);
        }
    }

    fn reconfigure(&mut self, config: CardConfig) {
        info!("Card reconfigured for '{}'", config.entity_prefix);
        self.entities = config.entities();
        self.config = config;
        self.chart_override = None;
        self.span = ChartSpan::Auto;
        self.help_open = false;
        self.sync.reset();
        self.selectors = SelectorSet::new(self.selectors.foods());
        self.tracker.reset();
        self.timer.stop();
        self.pending_history = None;
        self.history_probe.clear();
        self.history_ambient.clear();
        self.on_telemetry();
    }

    fn ensure_chart(&mut self) {
        if self.chart_state != ChartState::Absent {
            return;
        }
        let host = match &self.collaborators.chart {
            Some(host) => host.clone(),
            None => return,
        };

        debug!("Bootstrapping chart");
        self.chart_state = ChartState::Loading;
        let bootstrap = self.bootstrap;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match bootstrap.run(host.as_ref()).await {
                Ok(()) => CardEvent::ChartReady,
                Err(e) => CardEvent::ChartFailed(e.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    fn on_chart_ready(&mut self) {
        info!("Chart ready");
        self.chart_state = ChartState::Ready;
        self.request_history();
        self.push_frame();
    }

    fn request_history(&mut self) {
        let window = self.window();
        let hours = window.history_hours();
        let generation = self.next_generation();
        self.pending_history = Some(generation);

        let telemetry = self.collaborators.telemetry.clone();
        let probe_id = self.entities.probe_temp.clone();
        let ambient_id = self.entities.ambient_temp.clone();
        let tx = self.tx.clone();
        debug!("Fetching {}h of history", hours);
        tokio::spawn(async move {
            let (probe, ambient) = futures::join!(
                telemetry.history(&probe_id, hours),
                telemetry.history(&ambient_id, hours)
            );
            let _ = tx.send(CardEvent::HistoryLoaded {
                generation,
                probe,
                ambient,
            });
        });
    }

    fn on_history_loaded(&mut self, generation: u64, probe: Vec<Sample>, ambient: Vec<Sample>) {
        if self.pending_history != Some(generation) {
            debug!("Discarding stale history (generation {})", generation);
            return;
        }
        self.pending_history = None;

        if probe.is_empty() {
            debug!(
                "{}",
                Error::DataUnavailable {
                    entity: self.entities.probe_temp.clone()
                }
            );
        }
        debug!(
            "History loaded: {} probe, {} ambient samples",
            probe.len(),
            ambient.len()
        );
        self.history_probe = probe;
        self.history_ambient = ambient;
        self.push_frame();
    }

    fn window(&self) -> crate::chart::ChartWindow {
        compute_window(
            self.snapshot.status,
            self.tracker.cooking_start(),
            self.snapshot.remaining_minutes,
            self.span,
            self.collaborators.clock.now(),
        )
    }

    fn push_frame(&mut self) {
        if self.chart_state != ChartState::Ready || !self.view.chart_visible {
            return;
        }
        let host = match &self.collaborators.chart {
            Some(host) => host.clone(),
            None => return,
        };

        let t = |key: &str| self.translations.t(key);
        let labels = SeriesLabels {
            probe: t("probe"),
            target: t("target"),
            projection: t("projection"),
            ambient: t("ambient"),
        };
        let probe = merge_history(&self.history_probe, &self.snapshot.probe_history);
        let ambient = merge_history(&self.history_ambient, &self.snapshot.ambient_history);
        let frame = ChartFrame::build(
            self.window(),
            &probe,
            &ambient,
            self.snapshot.withdrawal_temp,
            self.snapshot.remaining_minutes,
            self.snapshot.status,
            labels,
        );

        host.render(&frame);
        self.chart_frame = Some(frame);
    }

    fn refresh(&mut self) {
        self.view = render(&RenderContext {
            snapshot: &self.snapshot,
            config: &self.config,
            tracker: &self.tracker,
            selectors: &self.selectors,
            translations: &self.translations,
            chart_override: self.chart_override,
            span: self.span,
            help_open: self.help_open,
            now: self.collaborators.clock.now(),
        });

        if self.view.chart_visible {
            self.ensure_chart();
        }
        self.push_frame();

        // No subscribers is fine.
        let _ = self.view_tx.send(self.view.clone());
    }
}

impl std::fmt::Debug for CardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardController")
            .field("config", &self.config)
            .field("status", &self.snapshot.status)
            .field("generation", &self.generation)
            .field("chart_state", &self.chart_state)
            .finish_non_exhaustive()
    }
}

/// Fetched history extended with the attribute samples newer than its end.
fn merge_history(fetched: &[Sample], attribute: &[Sample]) -> Vec<Sample> {
    let last = fetched.last().map(|s| s.timestamp);
    let mut merged: Vec<Sample> = fetched.to_vec();
    merged.extend(
        attribute
            .iter()
            .filter(|s| last.map_or(true, |last| s.timestamp > last)),
    );
    sort_samples(&mut merged);
    merged
}
