//! Example: A Simulated Cook
//!
//! Drives the card controller through a complete cook on a manual clock:
//! idle, a switch to French translations, cooking with a backend preset,
//! a short probe disconnection and finally done. Each simulated minute the
//! rendered view is printed.
//!
//! Run with: `RUST_LOG=cooker_card=debug cargo run --example simulated_cook`

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use cooker_card::clock::{Clock, ManualClock};
use cooker_card::controller::{CardController, CardEvent, CardInbox, Collaborators};
use cooker_card::source::{EntityState, MemoryTelemetry, MemoryTranslations, RecordingSink};
use cooker_card::{CardConfig, CardView, Result, Sample};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

const STATE: &str = "sensor.smoker_state";
const PROBE: &str = "sensor.smoker_probe_temperature";
const AMBIENT: &str = "sensor.smoker_ambient_temperature";

async fn drain(card: &mut CardController, inbox: &mut CardInbox) -> Result<()> {
    while let Ok(event) = inbox.try_recv() {
        card.handle_event(event).await?;
    }
    Ok(())
}

fn print_view(minute: i64, view: &CardView) {
    let mut line = format!("[{:>3} min] {:<12} core {:>7}", minute, view.status_label, view.probe_temp);
    if let Some(target) = &view.target_temp {
        line.push_str(&format!("  target {}", target));
    }
    if let Some(progress) = &view.progress {
        line.push_str(&format!("  {}", progress.text));
    }
    if let Some(times) = &view.times {
        line.push_str(&format!("  +{} / -{}", times.elapsed, times.remaining));
    }
    if let Some(warning) = &view.disconnect_warning {
        line.push_str(&format!("  !! {}", warning));
    }
    println!("{}", line);
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let start = Utc.with_ymd_and_hms(2026, 6, 20, 16, 0, 0).single().unwrap_or_else(Utc::now);
    let clock = Arc::new(ManualClock::new(start));
    let telemetry = Arc::new(MemoryTelemetry::new());
    let translations = MemoryTranslations::new().with_table(
        "fr",
        &[
            ("idle", "Inactif"),
            ("cooking", "Cuisson"),
            ("done", "Terminé"),
            ("disconnect_since", "Sonde déconnectée"),
        ],
    );
    let collaborators = Collaborators::new(
        telemetry.clone(),
        Arc::new(RecordingSink::new()),
        Arc::new(translations),
    )
    .with_clock(clock.clone());

    let config = CardConfig::from_value(&json!({
        "entity_prefix": "smoker",
        "show_rssi": false,
        "utc_offset_minutes": 120
    }))?;
    let (mut card, mut inbox) = CardController::new(config, collaborators);

    let mut core = 6.0;
    let mut ambient = 20.0;
    let withdrawal = 90.0;

    for minute in 0..=180i64 {
        let now = clock.now();
        let cooking = (5..).contains(&minute) && core < withdrawal;
        let status = match (minute, cooking) {
            (m, _) if m < 5 => "idle",
            (_, true) => "cooking",
            _ => "done",
        };
        if cooking {
            ambient = f64::min(ambient + 15.0, 110.0);
            core += (ambient - core) * 0.011;
        }
        let connected = !(60..64).contains(&minute);

        telemetry.set_language(if minute >= 2 { Some("fr-FR") } else { None });
        telemetry.push_sample(PROBE, Sample::new(now, core));
        telemetry.push_sample(AMBIENT, Sample::new(now, ambient));
        telemetry.set_state(EntityState::new(PROBE, format!("{:.2}", core)));
        telemetry.set_state(EntityState::new(AMBIENT, format!("{:.2}", ambient)));

        let remaining = (withdrawal - core) / ((ambient - core) * 0.011).max(0.01);
        let mut state = EntityState::new(STATE, status)
            .with_attribute("probe_connected", connected)
            .with_attribute("battery", 64)
            .with_attribute("food_category", "pork")
            .with_attribute("food_type", "pork_pulled_pork")
            .with_attribute("food_doneness", "pulled")
            .with_attribute("carryover_enabled", true)
            .with_attribute("withdrawal_temp", withdrawal)
            .with_attribute("desired_temp", 93)
            .with_attribute("remaining_time", remaining.min(700.0))
            .with_attribute("progress", ((core - 6.0) / (withdrawal - 6.0) * 100.0).min(100.0))
            .with_attribute("heating_rate", (ambient - core) * 0.011);
        if !connected {
            state = state.with_attribute("disconnect_duration", (minute - 59) * 60);
        }
        if cooking {
            state = state.with_attribute(
                "start_time",
                json!((start + Duration::minutes(5)).to_rfc3339()),
            );
        }
        telemetry.set_state(state);

        card.handle_event(CardEvent::Telemetry).await?;
        // Let spawned loads finish before rendering the minute.
        tokio::task::yield_now().await;
        drain(&mut card, &mut inbox).await?;

        if minute % 10 == 0 || !connected || (status != "cooking" && minute < 8) {
            print_view(minute, card.view());
        }
        if status == "done" {
            info!("Withdrawal temperature reached after {} min", minute);
            print_view(minute, card.view());
            break;
        }

        clock.advance(Duration::minutes(1));
    }

    card.handle_event(CardEvent::Shutdown).await
}
