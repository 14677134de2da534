use std::{sync::Arc, thread, time::Duration, time::Instant};

use anyhow::Result;
use log::{debug, info, warn};

use print_telemetry::config::constants;
use print_telemetry::{
    Cadence, CommManager, Config, FlatFileSink, InferenceHandle, Inferencer, LifecycleController,
    LogNotifier, MoonrakerClient, PrinterControl, SampleAssembler, Sampler, SamplingLoop,
    SharedState, StatusWatcher, TelemetrySource, UiNotifier, WebhookReporter,
};

/// Print Telemetry - feature sampling and lifecycle control for 3D printers.
///
/// Samples printer, job and heater state into a fixed-schema feature row every
/// two seconds (after a 20 second warm-up) and rewrites the whole row log to a
/// flat file once it holds more than five rows. In parallel it polls the print
/// job state and turns state changes into lifecycle events that start and stop
/// the anomaly inferencer and the feedback channel.
///
/// # Environment Variables
///
/// Required:
/// * `MOONRAKER_API_URL` - Moonraker API endpoint for status and printer control
///
/// Optional (with defaults):
/// * `DISCORD_WEBHOOK` - Discord webhook URL for feedback reports (default: unset, log only)
/// * `OUTPUT_FILE` - Row artifact path (default: "./output_file.txt")
/// * `STATUS_POLL_SECONDS` - Lifecycle poll interval (default: "2")
///
/// # Usage
///
/// ```bash
/// export MOONRAKER_API_URL="http://printer.local:7125"
/// export DISCORD_WEBHOOK="https://discord.com/api/webhooks/..."
/// ./print-telemetry
/// ```
fn main() -> Result<()> {
    // Initialize logger to output to stdout, using RUST_LOG env var or info level by default
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stdout)
        .filter_level(
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|level| level.parse().ok())
                .unwrap_or(log::LevelFilter::Info),
        )
        .init();

    let started = Instant::now();
    let config = Config::load()?;

    info!("Print Telemetry starting...");
    info!("Using Moonraker API URL: {}", config.moonraker_api_url);

    let sink = FlatFileSink::new(&config.output_file);
    info!("Writing feature rows to {}", sink.path().display());

    // Initialize services
    let state = Arc::new(SharedState::new());
    let printer = Arc::new(MoonrakerClient::new(config.moonraker_api_url.clone()));
    let inferencer = Arc::new(InferenceHandle::new(printer.clone() as Arc<dyn PrinterControl>));
    let reporter = Arc::new(WebhookReporter::new(config.discord_webhook.clone()));

    let controller = LifecycleController::new(
        state.clone(),
        inferencer as Arc<dyn Inferencer>,
        reporter as Arc<dyn CommManager>,
        printer.clone() as Arc<dyn PrinterControl>,
        Arc::new(LogNotifier) as Arc<dyn UiNotifier>,
    );

    let assembler = SampleAssembler::new(printer.clone() as Arc<dyn TelemetrySource>, state);
    let sampler = Sampler::new(
        assembler,
        Cadence::standard(started),
        Box::new(sink),
    );
    let sampling = SamplingLoop::spawn(sampler)?;

    info!("Print Telemetry initialized successfully. Starting lifecycle poll...");

    let poll_interval = Duration::from_secs(config.status_poll_seconds);
    let mut watcher = StatusWatcher::new();

    while sampling.is_running() {
        match printer.print_status() {
            Ok(status) => {
                debug!("Print state: {}", status.state);
                for event in watcher.observe(&status.state, status.active_extruder.as_deref()) {
                    controller.handle(event);
                }
                thread::sleep(poll_interval);
            }
            Err(e) => {
                warn!("Failed to get printer status: {}", e);
                thread::sleep(Duration::from_secs(constants::RETRY_DELAY_SECONDS));
            }
        }
    }

    warn!("Sampling loop exited, shutting down");
    controller.shutdown();
    let log = sampling.stop()?;
    info!("Captured {} feature rows this session", log.len());
    Ok(())
}
