//! Terminal rendition of the cooking card, driven by a simulated probe
//!
//! Run with: cargo run --example card_dashboard
//!
//! A fake device heats a steak towards its withdrawal temperature while the
//! card controller renders views and chart frames into the terminal.
//!
//! ## Keyboard Controls
//!
//! | Key | Action |
//! |-----|--------|
//! | `S` | Start cooking |
//! | `X` | Stop cooking |
//! | `D` | Disconnect/reconnect the probe |
//! | `K` | Toggle carryover compensation |
//! | `G` | Show/hide the chart |
//! | `T` | Cycle the chart span |
//! | `N` | Next food category |
//! | `I` | Details of the probe temperature |
//! | `?` | Open/close the carryover help |
//! | `+/-` | Raise/lower the target |
//! | `Q/Esc` | Quit |

use std::io::{self, stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use cooker_card::chart::ChartFrame;
use cooker_card::controller::{CardController, CardEvent, CardInbox, Collaborators, UiEvent};
use cooker_card::render::{Indicator, Tone};
use cooker_card::source::chart::ChartHost;
use cooker_card::source::{EntityState, MemoryTelemetry, MemoryTranslations, RecordingSink};
use cooker_card::{
    CardConfig, CardEntity, CardView, ChartSpan, Command, DeviceStatus, Result, Sample,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::Mutex;
use ratatui::{
    prelude::*,
    widgets::{block::Title, *},
};

const PREFIX: &str = "grill";
const STATE: &str = "sensor.grill_state";
const PROBE: &str = "sensor.grill_probe_temperature";
const AMBIENT: &str = "sensor.grill_ambient_temperature";

/// Chart host that keeps the last frame for the terminal to draw.
#[derive(Default)]
struct TerminalChart {
    frame: Mutex<Option<ChartFrame>>,
}

#[async_trait]
impl ChartHost for TerminalChart {
    async fn load_library(&self) -> Result<()> {
        Ok(())
    }

    fn container_ready(&self) -> bool {
        true
    }

    fn render(&self, frame: &ChartFrame) {
        *self.frame.lock() = Some(frame.clone());
    }
}

/// A steak on a grill.
struct SimulatedProbe {
    telemetry: Arc<MemoryTelemetry>,
    sink: Arc<RecordingSink>,
    seen_commands: usize,
    status: DeviceStatus,
    connected: bool,
    core: f64,
    ambient: f64,
    withdrawal: f64,
    food_type: String,
    doneness: String,
    carryover: bool,
    started: Option<chrono::DateTime<Utc>>,
    disconnected_at: Option<chrono::DateTime<Utc>>,
}

impl SimulatedProbe {
    fn new(telemetry: Arc<MemoryTelemetry>, sink: Arc<RecordingSink>) -> Self {
        Self {
            telemetry,
            sink,
            seen_commands: 0,
            status: DeviceStatus::Idle,
            connected: true,
            core: 18.0,
            ambient: 22.0,
            withdrawal: 57.0,
            food_type: "beef_steak".to_string(),
            doneness: "medium".to_string(),
            carryover: true,
            started: None,
            disconnected_at: None,
        }
    }

    /// Apply commands the card sent since the last step.
    fn apply_commands(&mut self) {
        let commands = self.sink.commands();
        for (_, command) in commands.iter().skip(self.seen_commands) {
            match command {
                Command::StartCooking => {
                    self.status = DeviceStatus::Cooking;
                    self.started = Some(Utc::now());
                }
                Command::StopCooking => {
                    self.status = DeviceStatus::Idle;
                    self.started = None;
                }
                Command::SetCarryover { enabled } => self.carryover = *enabled,
                Command::SetTargetTemp { celsius } => {
                    self.withdrawal = *celsius;
                    self.food_type.clear();
                }
                Command::SetFood {
                    food_type,
                    doneness,
                } => {
                    self.food_type = food_type.clone();
                    self.doneness = doneness.clone();
                }
                // The terminal has no details dialog.
                Command::ShowMoreInfo { .. } => {}
            }
        }
        self.seen_commands = commands.len();
    }

    fn toggle_connection(&mut self) {
        self.connected = !self.connected;
        self.disconnected_at = if self.connected {
            None
        } else {
            Some(Utc::now())
        };
    }

    fn step(&mut self) {
        self.apply_commands();
        let now = Utc::now();

        if self.status == DeviceStatus::Cooking {
            self.ambient = (self.ambient + 4.0).min(180.0);
            self.core += (self.ambient - self.core) * 0.004;
            if self.core >= self.withdrawal {
                self.status = DeviceStatus::Done;
            }
        } else {
            self.ambient = (self.ambient - 1.0).max(22.0);
        }

        self.telemetry.push_sample(PROBE, Sample::new(now, self.core));
        self.telemetry.push_sample(AMBIENT, Sample::new(now, self.ambient));
        self.telemetry
            .set_state(EntityState::new(PROBE, format!("{:.2}", self.core)));
        self.telemetry
            .set_state(EntityState::new(AMBIENT, format!("{:.2}", self.ambient)));

        let rate = (self.ambient - self.core) * 0.004 * 120.0;
        let remaining = ((self.withdrawal - self.core).max(0.0) / rate.max(0.01)).min(600.0);
        let (category, manual) = match self.food_type.split_once('_') {
            Some((category, _)) => (category.to_string(), false),
            None => (String::new(), true),
        };

        let mut state = EntityState::new(STATE, self.status.as_str())
            .with_attribute("probe_connected", self.connected)
            .with_attribute("battery", 76)
            .with_attribute("rssi", -63)
            .with_attribute("withdrawal_temp", self.withdrawal)
            .with_attribute("desired_temp", self.withdrawal + 3.0)
            .with_attribute("carryover_enabled", self.carryover)
            .with_attribute("is_manual_mode", manual)
            .with_attribute("manual_temp_memory", self.withdrawal)
            .with_attribute("heating_rate", rate)
            .with_attribute("remaining_time", remaining)
            .with_attribute(
                "progress",
                ((self.core - 18.0) / (self.withdrawal - 18.0) * 100.0).clamp(0.0, 100.0),
            );
        if !manual {
            state = state
                .with_attribute("food_category", category)
                .with_attribute("food_type", self.food_type.clone())
                .with_attribute("food_doneness", self.doneness.clone());
        }
        if let Some(started) = self.started {
            state = state
                .with_attribute("start_time", started.to_rfc3339())
                .with_attribute(
                    "estimated_end_time",
                    (now + chrono::Duration::seconds((remaining * 60.0) as i64)).to_rfc3339(),
                );
        }
        if let Some(at) = self.disconnected_at {
            state = state.with_attribute("disconnect_duration", (now - at).num_seconds());
        }
        self.telemetry.set_state(state);
    }
}

struct App {
    card: CardController,
    inbox: CardInbox,
    chart: Arc<TerminalChart>,
    probe: SimulatedProbe,
    message: String,
}

impl App {
    fn new() -> Result<Self> {
        let telemetry = Arc::new(MemoryTelemetry::new());
        let sink = Arc::new(RecordingSink::new());
        let chart = Arc::new(TerminalChart::default());
        let collaborators = Collaborators::new(
            telemetry.clone(),
            sink.clone(),
            Arc::new(MemoryTranslations::new()),
        )
        .with_chart(chart.clone());

        let config = CardConfig::new(PREFIX)?;
        let (card, inbox) = CardController::new(config, collaborators);
        Ok(Self {
            card,
            inbox,
            chart,
            probe: SimulatedProbe::new(telemetry, sink),
            message: "Press S to start".to_string(),
        })
    }

    async fn drain_inbox(&mut self) {
        while let Ok(event) = self.inbox.try_recv() {
            if let Err(e) = self.card.handle_event(event).await {
                self.message = e.to_string();
            }
        }
    }

    async fn ui(&mut self, event: UiEvent) {
        self.message = match self.card.handle_event(CardEvent::Ui(event.clone())).await {
            Ok(()) => format!("{:?}", event),
            Err(e) => e.to_string(),
        };
    }

    fn next_span(&self) -> ChartSpan {
        let options: Vec<ChartSpan> = ChartSpan::options().collect();
        let current = options
            .iter()
            .position(|s| *s == self.card.span())
            .unwrap_or(0);
        options[(current + 1) % options.len()]
    }

    fn next_category(&self) -> String {
        let options = &self.card.view().settings.category.options;
        let current = self.card.view().settings.category.selected.clone();
        let index = options
            .iter()
            .position(|o| Some(&o.value) == current.as_ref())
            .unwrap_or(0);
        options
            .get((index + 1) % options.len().max(1))
            .map(|o| o.value.clone())
            .unwrap_or_default()
    }
}

/// Main terminal type alias
type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> io::Result<Terminal> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Normal => Color::White,
        Tone::Primary => Color::Cyan,
        Tone::Success => Color::Green,
        Tone::Warning => Color::Yellow,
        Tone::Error => Color::Red,
    }
}

fn indicator_span(indicator: &Option<Indicator>) -> Span<'static> {
    match indicator {
        Some(i) => Span::styled(
            format!(" {} ", i.text),
            Style::default().fg(tone_color(i.tone)),
        ),
        None => Span::raw(""),
    }
}

fn render_ui(frame: &mut Frame, app: &App) {
    let view = app.card.view();
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(9), // Main panel
            Constraint::Min(8),    // Chart
            Constraint::Length(5), // Settings
            Constraint::Length(1), // Status bar
        ])
        .split(size);

    render_header(frame, chunks[0], view);
    render_main(frame, chunks[1], view);
    render_chart(frame, chunks[2], app);
    render_settings(frame, chunks[3], view);

    let span_label = view
        .span_options
        .iter()
        .find(|o| o.value == view.span.value())
        .map(|o| o.label.as_str())
        .unwrap_or("--");
    let status = Paragraph::new(format!(
        " {} | span: {} | chart {} ",
        app.message, span_label, view.chart_toggle
    ))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, view: &CardView) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", view.status_label),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        indicator_span(&view.battery),
        indicator_span(&view.rssi),
    ]);
    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(Title::from(" COOKING CARD ").alignment(Alignment::Center))
            .title(
                Title::from(" [Q] Quit ")
                    .alignment(Alignment::Right)
                    .position(block::Position::Top),
            ),
    );
    frame.render_widget(header, area);
}

fn render_main(frame: &mut Frame, area: Rect, view: &CardView) {
    let block = Block::default().borders(Borders::ALL).title(" Probe ");

    if !view.show_main {
        let prompt = view.connect_prompt.clone().unwrap_or_default();
        frame.render_widget(
            Paragraph::new(prompt)
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let mut lines = vec![Line::from(vec![
        Span::raw("Core: "),
        Span::styled(
            view.probe_temp.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ])];
    if let Some(target) = &view.target_temp {
        lines.push(Line::from(format!("Target: {}", target)));
    }
    if let Some(ambient) = &view.ambient_temp {
        lines.push(Line::from(Span::styled(
            format!("Ambient: {}", ambient),
            Style::default().fg(view.ambient_tone.map(tone_color).unwrap_or(Color::White)),
        )));
    }
    if let Some(progress) = &view.progress {
        lines.push(Line::from(Span::styled(
            format!("Progress: {}", progress.text),
            Style::default().fg(tone_color(progress.tone)),
        )));
    }
    if let Some(times) = &view.times {
        lines.push(Line::from(format!(
            "Elapsed {}  Remaining {}  {} → {}",
            times.elapsed, times.remaining, times.started, times.ends
        )));
    }
    if let Some(rate) = &view.heating_rate {
        lines.push(Line::from(format!("Rate: {}", rate)));
    }
    if let Some(warning) = &view.disconnect_warning {
        lines.push(Line::from(Span::styled(
            warning.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let mut controls = Vec::new();
    if view.controls.start {
        controls.push("[S] Start");
    }
    if view.controls.stop {
        controls.push("[X] Stop");
    }
    lines.push(Line::from(controls.join("  ")));

    frame.render_widget(Paragraph::new(lines).block(block), area);

    if let Some(help) = &view.carryover_help {
        let mut text: Vec<Line> = help.paragraphs.iter().map(|p| Line::from(p.clone())).collect();
        text.push(Line::from(format!("[?] {}", help.close)).style(Style::default().fg(Color::DarkGray)));
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(format!(" {} ", help.title))),
            area,
        );
    }
}

fn points(samples: &[Sample], origin: chrono::DateTime<Utc>) -> Vec<(f64, f64)> {
    samples
        .iter()
        .map(|s| ((s.timestamp - origin).num_seconds() as f64 / 60.0, s.value))
        .collect()
}

fn render_chart(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(" History ");
    let chart_frame = app.chart.frame.lock().clone();

    let chart_frame = match chart_frame {
        Some(f) if app.card.view().chart_visible => f,
        _ => {
            frame.render_widget(
                Paragraph::new("Chart hidden ([G] to toggle)").block(block),
                area,
            );
            return;
        }
    };

    let origin = chart_frame.window.now;
    let actual = points(&chart_frame.series.actual, origin);
    let target = points(&chart_frame.series.target, origin);
    let projection = points(&chart_frame.series.projection, origin);
    let ambient = points(&chart_frame.series.ambient, origin);
    let datasets = vec![
        Dataset::default()
            .name(chart_frame.labels.probe.clone())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&actual),
        Dataset::default()
            .name(chart_frame.labels.target.clone())
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&target),
        Dataset::default()
            .name(chart_frame.labels.projection.clone())
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&projection),
        Dataset::default()
            .name(chart_frame.labels.ambient.clone())
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(Color::Magenta))
            .data(&ambient),
    ];

    let past = -chart_frame.window.past_minutes();
    let future = chart_frame.window.future_minutes();
    let primary = chart_frame.primary;
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("min")
                .bounds([past, future])
                .labels(vec![
                    Span::raw(format!("{:.0}", past)),
                    Span::raw("now"),
                    Span::raw(format!("+{:.0}", future)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("°C")
                .bounds([primary.min, primary.max])
                .labels(vec![
                    Span::raw(format!("{:.0}", primary.min)),
                    Span::raw(format!("{:.0}", primary.max)),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_settings(frame: &mut Frame, area: Rect, view: &CardView) {
    let settings = &view.settings;
    let label = |selector: &cooker_card::render::SelectorView| {
        selector
            .options
            .iter()
            .find(|o| Some(&o.value) == selector.selected.as_ref())
            .map(|o| o.label.clone())
            .unwrap_or_else(|| "--".to_string())
    };
    let lines = vec![
        Line::from(format!(
            "Category: {}   Food: {}   Doneness: {}",
            label(&settings.category),
            label(&settings.food),
            label(&settings.doneness)
        )),
        Line::from(format!(
            "Target: {}°{}   Carryover: {}",
            settings.target_input,
            if settings.target_disabled { " (locked)" } else { "" },
            if settings.carryover_enabled { "on" } else { "off" }
        )),
        Line::from("[N] Category  [+/-] Target  [K] Carryover  [?] Help  [G] Chart  [T] Span  [I] Info  [D] Probe link")
            .style(Style::default().fg(Color::DarkGray)),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Settings ")),
        area,
    );
}

async fn run_app(terminal: &mut Terminal, mut app: App) -> Result<()> {
    let mut last_step = std::time::Instant::now();
    app.probe.step();
    app.card.handle_event(CardEvent::Telemetry).await?;

    loop {
        app.drain_inbox().await;

        if last_step.elapsed() >= Duration::from_millis(500) {
            app.probe.step();
            app.card.handle_event(CardEvent::Telemetry).await?;
            last_step = std::time::Instant::now();
        }

        terminal
            .draw(|frame| render_ui(frame, &app))
            .map_err(|e| cooker_card::Error::Internal(format!("Draw error: {}", e)))?;

        let has_event = event::poll(Duration::from_millis(100))
            .map_err(|e| cooker_card::Error::Internal(format!("Poll error: {}", e)))?;
        if !has_event {
            continue;
        }

        let event = event::read()
            .map_err(|e| cooker_card::Error::Internal(format!("Read error: {}", e)))?;
        let key = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => continue,
        };

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Char('s') => app.ui(UiEvent::StartPressed).await,
            KeyCode::Char('x') => app.ui(UiEvent::StopPressed).await,
            KeyCode::Char('k') => app.ui(UiEvent::CarryoverToggled).await,
            KeyCode::Char('g') => app.ui(UiEvent::ChartToggled).await,
            KeyCode::Char('i') => app.ui(UiEvent::EntityClicked(CardEntity::ProbeTemp)).await,
            KeyCode::Char('?') => {
                let event = if app.card.view().carryover_help.is_some() {
                    UiEvent::CarryoverHelpClosed
                } else {
                    UiEvent::CarryoverHelpOpened
                };
                app.ui(event).await
            }
            KeyCode::Char('t') => {
                let span = app.next_span();
                app.ui(UiEvent::SpanSelected(span)).await
            }
            KeyCode::Char('n') => {
                let category = app.next_category();
                app.ui(UiEvent::CategoryChanged(category)).await
            }
            KeyCode::Char('+') | KeyCode::Char('-') => {
                let step = if key.code == KeyCode::Char('+') { 1.0 } else { -1.0 };
                let current = app
                    .card
                    .selectors()
                    .target_input
                    .unwrap_or(app.probe.withdrawal);
                app.ui(UiEvent::TargetEdited(current + step)).await
            }
            KeyCode::Char('d') => {
                app.probe.toggle_connection();
                app.message = format!("Probe link: {}", app.probe.connected);
            }
            _ => {}
        }
    }

    app.card.handle_event(CardEvent::Shutdown).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut terminal = setup_terminal().map_err(|e| {
        cooker_card::Error::Internal(format!("Failed to setup terminal: {}", e))
    })?;

    let app = App::new()?;
    let result = run_app(&mut terminal, app).await;

    let _ = restore_terminal(&mut terminal);

    result
}
