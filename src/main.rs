//! padstate - gamepad state monitor
//!
//! Polls the configured backend at a fixed interval and logs connection and
//! button edges for up to four controllers.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use padstate::input::gamepad::{
    print_gamepad_diagnostics, AnalogChannel, Button, GamepadBackend, GamepadTracker, StreamType,
    MAX_DEVICES,
};
use padstate::TrackerConfig;

/// padstate - Track gamepad state for up to four controllers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "padstate.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Dump a slot's state whenever one of its buttons is pressed (all, analog, digital)
    #[arg(long)]
    dump: Option<StreamType>,

    /// Drive the rumble motors from the triggers
    #[arg(long)]
    rumble: bool,

    /// Print a one-shot per-slot report and exit
    #[arg(long)]
    diagnostics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("Starting padstate v{}...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config).await?;

    let mut tracker = GamepadTracker::from_config(&config);
    info!("Using {} backend", tracker.backend_name());

    tracker.on_connected(|slot| debug!("Connect callback for slot {}", slot));
    tracker.on_disconnected(|slot| debug!("Disconnect callback for slot {}", slot));

    tracker.init_devices();

    if args.diagnostics {
        print_gamepad_diagnostics(&tracker);
        return Ok(());
    }

    run_loop(
        tracker,
        Duration::from_millis(config.poll_interval_ms),
        &args,
        shutdown_signal(),
    )
    .await;

    info!("padstate shutdown complete");
    Ok(())
}

async fn load_config(path: &str) -> Result<TrackerConfig> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        let config = TrackerConfig::load(path).await?;
        info!("Configuration loaded from {}", path);
        Ok(config)
    } else {
        info!("No configuration at {}, using defaults", path);
        Ok(TrackerConfig::default())
    }
}

async fn run_loop<B: GamepadBackend>(
    mut tracker: GamepadTracker<B>,
    poll_interval: Duration,
    args: &Args,
    shutdown: impl std::future::Future<Output = ()>,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    info!("Polling every {:?} (Ctrl+C to quit)", poll_interval);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                tracker.tick();
                for slot in 0..MAX_DEVICES {
                    if !tracker.is_connected(slot) {
                        continue;
                    }
                    let pressed = log_button_edges(&tracker, slot);
                    if args.rumble {
                        drive_rumble(&mut tracker, slot);
                    }
                    if let (Some(filter), true) = (args.dump, pressed) {
                        print!("{}", tracker.dump(slot, filter));
                    }
                }
            },
        }
    }

    // Leave no motor running on exit
    for slot in 0..MAX_DEVICES {
        if tracker.is_connected(slot) {
            if let Err(e) = tracker.set_vibration(slot, 0.0, 0.0) {
                warn!("Failed to stop rumble on slot {}: {}", slot, e);
            }
        }
    }
}

/// Log button edges; returns whether any button went down this tick
fn log_button_edges<B: GamepadBackend>(tracker: &GamepadTracker<B>, slot: usize) -> bool {
    let mut any_pressed = false;
    for button in Button::ALL {
        if tracker.is_triggered_down(slot, button) {
            info!("🎮 Slot {} {} pressed", slot, button.label());
            any_pressed = true;
        } else if tracker.is_triggered_up(slot, button) {
            info!("🎮 Slot {} {} released", slot, button.label());
        }
    }
    any_pressed
}

/// Mirror trigger pressure onto the matching motor
fn drive_rumble<B: GamepadBackend>(tracker: &mut GamepadTracker<B>, slot: usize) {
    let left = tracker.analog_state(slot, AnalogChannel::TriggerL);
    let right = tracker.analog_state(slot, AnalogChannel::TriggerR);
    let unchanged = left == tracker.analog_state(slot, AnalogChannel::VibrationL)
        && right == tracker.analog_state(slot, AnalogChannel::VibrationR);
    if unchanged {
        return;
    }

    if let Err(e) = tracker.set_vibration(slot, left, right) {
        warn!("Rumble on slot {} failed: {}", slot, e);
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
