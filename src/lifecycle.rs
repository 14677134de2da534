use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use crate::collaborators::{CommManager, Inferencer, PrinterControl, UiMessage, UiNotifier};
use crate::state::SharedState;

/// Print lifecycle events the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintEvent {
    PrintStarted,
    PrintResumed,
    PrintPaused,
    PrintCancelled,
    PrintDone,
    PrintFailed,
    FilamentChange,
    ToolChange,
}

impl PrintEvent {
    /// Map a host event identifier (`"PrintStarted"`, `"ToolChange"`, ...).
    pub fn from_host_name(name: &str) -> Option<Self> {
        match name {
            "PrintStarted" => Some(Self::PrintStarted),
            "PrintResumed" => Some(Self::PrintResumed),
            "PrintPaused" => Some(Self::PrintPaused),
            "PrintCancelled" => Some(Self::PrintCancelled),
            "PrintDone" => Some(Self::PrintDone),
            "PrintFailed" => Some(Self::PrintFailed),
            "FilamentChange" => Some(Self::FilamentChange),
            "ToolChange" => Some(Self::ToolChange),
            _ => None,
        }
    }

    /// Event implied by a print job state change, using Klipper's
    /// `print_stats` state names.
    pub fn from_transition(previous: &str, current: &str) -> Option<Self> {
        if previous == current {
            return None;
        }
        match current {
            "printing" if previous == "paused" => Some(Self::PrintResumed),
            "printing" => Some(Self::PrintStarted),
            "paused" => Some(Self::PrintPaused),
            "complete" => Some(Self::PrintDone),
            "cancelled" => Some(Self::PrintCancelled),
            "error" => Some(Self::PrintFailed),
            _ => None,
        }
    }
}

/// Derives lifecycle events from successive printer status polls.
///
/// The first observation only establishes a baseline.
#[derive(Debug, Default)]
pub struct StatusWatcher {
    last_state: Option<String>,
    last_extruder: Option<String>,
}

impl StatusWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, state: &str, active_extruder: Option<&str>) -> Vec<PrintEvent> {
        let mut events = Vec::new();

        if let Some(previous) = self.last_state.as_deref() {
            if let Some(event) = PrintEvent::from_transition(previous, state) {
                events.push(event);
            }
        }
        if let (Some(previous), Some(current)) = (self.last_extruder.as_deref(), active_extruder) {
            if previous != current {
                events.push(PrintEvent::ToolChange);
            }
        }

        self.last_state = Some(state.to_string());
        if active_extruder.is_some() {
            self.last_extruder = active_extruder.map(str::to_string);
        }
        events
    }
}

/// Sequences the inferencer and the feedback channel across print lifecycle
/// events and records filament/tool change times for the sampler.
pub struct LifecycleController {
    state: Arc<SharedState>,
    inferencer: Arc<dyn Inferencer>,
    comm: Arc<dyn CommManager>,
    printer: Arc<dyn PrinterControl>,
    ui: Arc<dyn UiNotifier>,
}

impl LifecycleController {
    pub fn new(
        state: Arc<SharedState>,
        inferencer: Arc<dyn Inferencer>,
        comm: Arc<dyn CommManager>,
        printer: Arc<dyn PrinterControl>,
        ui: Arc<dyn UiNotifier>,
    ) -> Self {
        Self {
            state,
            inferencer,
            comm,
            printer,
            ui,
        }
    }

    /// Handle a host event by name; unknown names are ignored.
    pub fn on_host_event(&self, name: &str) {
        match PrintEvent::from_host_name(name) {
            Some(event) => self.handle(event),
            None => debug!("Ignoring host event '{}'", name),
        }
    }

    pub fn handle(&self, event: PrintEvent) {
        self.handle_at(event, Utc::now());
    }

    /// Handle `event`, stamping any change timers with `now`.
    pub fn handle_at(&self, event: PrintEvent, now: DateTime<Utc>) {
        info!("Lifecycle event: {:?}", event);
        match event {
            PrintEvent::PrintStarted => {
                self.inferencer.start_service();
                self.comm.kill_service();
                self.comm.new_ticket();
                self.ui.notify(UiMessage::ResetPlot);
            }
            PrintEvent::PrintResumed => {
                if self.inferencer.triggered() {
                    if let Err(e) = self.printer.restart() {
                        error!("Failed to restart printer: {}", e);
                    }
                }
                self.inferencer.start_service();
                self.comm.kill_service();
            }
            PrintEvent::PrintPaused => {
                self.stop_inference();
                // Feedback collection stays open while paused.
                self.comm.start_service();
            }
            PrintEvent::PrintCancelled | PrintEvent::PrintDone | PrintEvent::PrintFailed => {
                self.stop_inference();
                self.comm.kill_service();
                self.ui.notify(UiMessage::ResetPlot);
            }
            PrintEvent::FilamentChange => self.state.record_filament_change(now),
            PrintEvent::ToolChange => self.state.record_tool_change(now),
        }
    }

    /// Settings were saved: rate-limit warnings issued under the old
    /// thresholds and tell the UI.
    pub fn on_settings_saved(&self) {
        if self.inferencer.warning_notification() {
            self.inferencer.begin_cooldown();
        }
        self.ui.notify(UiMessage::OnSave);
    }

    /// Forward a user defect classification to the feedback channel.
    pub fn submit_feedback(&self, classification: &str) {
        match self.comm.send_feedback(classification) {
            Ok(()) => info!(
                "Defect report sending to server for type: {}",
                classification
            ),
            Err(e) => warn!("Failed to send feedback '{}': {}", classification, e),
        }
    }

    pub fn shutdown(&self) {
        self.inferencer.kill_service();
    }

    fn stop_inference(&self) {
        if self.inferencer.triggered() {
            self.inferencer.shutoff_event();
        }
        self.inferencer.kill_service();
    }
}
