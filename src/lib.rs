//! Print Telemetry - feature sampling and lifecycle control for 3D print monitoring.
//!
//! This library samples a fixed-schema feature vector describing printer and
//! job state at a steady cadence, and sequences an anomaly inferencer and a
//! feedback channel across print lifecycle events.
//!
//! # Core Components
//!
//! * [`features`] - Feature row schema and the append-only row log
//! * [`assembler`] - Builds one feature row from live printer state
//! * [`sampler`] - Background sampling loop with warm-up, throttle and flush
//! * [`lifecycle`] - Event-driven controller for the collaborating services
//! * [`feedrate`] - Outbound gcode inspection for feedrate state
//! * [`state`] - Printer state codes and the shared timer/feedrate state
//! * [`printer`] - Moonraker API client (status source and printer control)
//! * [`reporter`] - Discord webhook feedback channel
//! * [`inferencer`] - Service handle for the anomaly inferencer
//! * [`error`] - Error types
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//! use print_telemetry::*;
//!
//! let config = Config::load()?;
//! let state = Arc::new(SharedState::new());
//! let printer = Arc::new(MoonrakerClient::new(config.moonraker_api_url.clone()));
//!
//! let assembler = SampleAssembler::new(printer.clone(), state.clone());
//! let sampler = Sampler::new(
//!     assembler,
//!     Cadence::standard(Instant::now()),
//!     Box::new(FlatFileSink::new(&config.output_file)),
//! );
//! let sampling = SamplingLoop::spawn(sampler)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assembler;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod features;
pub mod feedrate;
pub mod inferencer;
pub mod lifecycle;
pub mod printer;
pub mod reporter;
pub mod sampler;
pub mod sink;
pub mod source;
pub mod state;

// Re-export commonly used types for convenience
pub use assembler::SampleAssembler;
pub use collaborators::{CommManager, Inferencer, LogNotifier, PrinterControl, UiMessage, UiNotifier};
pub use config::Config;
pub use error::TelemetryError;
pub use features::{FeatureRow, RowLog};
pub use feedrate::GcodeFeedrateTracker;
pub use inferencer::InferenceHandle;
pub use lifecycle::{LifecycleController, PrintEvent, StatusWatcher};
pub use printer::MoonrakerClient;
pub use reporter::WebhookReporter;
pub use sampler::{Cadence, Sampler, SamplingLoop, TickOutcome};
pub use sink::{FlatFileSink, RowSink};
pub use source::TelemetrySource;
pub use state::{PrinterStateCode, SharedState};
