//! Interfaces of the services the lifecycle controller sequences.
//!
//! Start and stop calls are expected to be idempotent; the controller issues
//! them unconditionally on every matching event and never retries.

use anyhow::Result;
use log::info;
use serde_json::json;

/// Anomaly detection service.
pub trait Inferencer: Send + Sync {
    fn start_service(&self);
    fn kill_service(&self);
    /// Carry out the configured response to a triggered anomaly.
    fn shutoff_event(&self);
    /// Suppress repeated warnings for a while.
    fn begin_cooldown(&self);
    /// An anomaly has been flagged and is awaiting a response.
    fn triggered(&self) -> bool;
    /// A warning notification is currently being shown.
    fn warning_notification(&self) -> bool;
}

/// Feedback and report channel to the remote service.
pub trait CommManager: Send + Sync {
    fn start_service(&self);
    fn kill_service(&self);
    /// Open a new reporting ticket for the print that is starting.
    fn new_ticket(&self);
    /// Report a user-supplied defect classification.
    fn send_feedback(&self, classification: &str) -> Result<()>;
}

/// Physical printer actuation.
pub trait PrinterControl: Send + Sync {
    /// Resume a print that was paused in response to an anomaly.
    fn restart(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
}

/// Messages pushed to the UI. Fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMessage {
    ResetPlot,
    OnSave,
}

impl UiMessage {
    pub fn kind(self) -> &'static str {
        match self {
            UiMessage::ResetPlot => "resetPlot",
            UiMessage::OnSave => "onSave",
        }
    }

    pub fn to_json(self) -> serde_json::Value {
        json!({ "type": self.kind() })
    }
}

pub trait UiNotifier: Send + Sync {
    fn notify(&self, message: UiMessage);
}

/// UI notifier for headless runs: messages only go to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl UiNotifier for LogNotifier {
    fn notify(&self, message: UiMessage) {
        info!("UI message: {}", message.to_json());
    }
}
