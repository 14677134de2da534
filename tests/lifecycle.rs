mod common;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{FakeComm, FakeInferencer, FakePrinter, FakeUi};
use print_telemetry::collaborators::UiMessage;
use print_telemetry::{LifecycleController, PrintEvent, SharedState, StatusWatcher};

struct Harness {
    state: Arc<SharedState>,
    inferencer: Arc<FakeInferencer>,
    comm: Arc<FakeComm>,
    printer: Arc<FakePrinter>,
    ui: Arc<FakeUi>,
    controller: LifecycleController,
}

fn harness() -> Harness {
    let state = Arc::new(SharedState::new());
    let inferencer = Arc::new(FakeInferencer::default());
    let comm = Arc::new(FakeComm::default());
    let printer = Arc::new(FakePrinter::default());
    let ui = Arc::new(FakeUi::default());
    let controller = LifecycleController::new(
        state.clone(),
        inferencer.clone(),
        comm.clone(),
        printer.clone(),
        ui.clone(),
    );
    Harness {
        state,
        inferencer,
        comm,
        printer,
        ui,
        controller,
    }
}

impl Harness {
    fn clear(&self) {
        self.inferencer.log.clear();
        self.comm.log.clear();
        self.printer.log.clear();
        self.ui.messages.lock().unwrap().clear();
    }

    fn inferencer_running(&self) -> bool {
        *self.inferencer.running.lock().unwrap()
    }

    fn comm_running(&self) -> bool {
        *self.comm.running.lock().unwrap()
    }

    fn ui_messages(&self) -> Vec<UiMessage> {
        self.ui.messages.lock().unwrap().clone()
    }
}

#[test]
fn test_print_started_sequence() {
    let h = harness();
    h.controller.handle(PrintEvent::PrintStarted);

    assert!(h.inferencer_running());
    assert!(!h.comm_running());
    assert_eq!(h.comm.log.calls(), vec!["kill", "new_ticket"]);
    assert_eq!(h.ui_messages(), vec![UiMessage::ResetPlot]);
    assert!(h.printer.log.calls().is_empty());
}

#[test]
fn test_triggered_pause_then_resume_scenario() {
    let h = harness();
    h.controller.handle(PrintEvent::PrintStarted);
    *h.inferencer.triggered.lock().unwrap() = true;
    h.clear();

    h.controller.handle(PrintEvent::PrintPaused);
    assert_eq!(h.inferencer.log.calls(), vec!["shutoff", "kill"]);
    assert!(!h.inferencer_running());
    assert!(h.comm_running());
    assert!(h.ui_messages().is_empty());

    h.controller.handle(PrintEvent::PrintResumed);
    assert_eq!(h.printer.log.count("restart"), 1);
    assert!(h.inferencer_running());
    assert!(!h.comm_running());
}

#[test]
fn test_untriggered_pause_and_resume_leave_printer_alone() {
    let h = harness();
    h.controller.handle(PrintEvent::PrintStarted);
    h.controller.handle(PrintEvent::PrintPaused);
    h.controller.handle(PrintEvent::PrintResumed);

    assert_eq!(h.inferencer.log.count("shutoff"), 0);
    assert!(h.printer.log.calls().is_empty());
    assert!(h.inferencer_running());
    assert!(!h.comm_running());
}

#[test]
fn test_terminal_events_stop_everything_and_reset_plot() {
    for event in [
        PrintEvent::PrintCancelled,
        PrintEvent::PrintDone,
        PrintEvent::PrintFailed,
    ] {
        let h = harness();
        h.controller.handle(PrintEvent::PrintStarted);
        h.controller.handle(PrintEvent::PrintPaused);
        *h.inferencer.triggered.lock().unwrap() = true;
        h.clear();

        h.controller.handle(event);
        assert_eq!(h.inferencer.log.calls(), vec!["shutoff", "kill"]);
        assert!(!h.inferencer_running());
        assert!(!h.comm_running());
        assert_eq!(h.ui_messages(), vec![UiMessage::ResetPlot]);
    }
}

#[test]
fn test_change_events_record_timestamps() {
    let h = harness();
    let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let later = DateTime::<Utc>::from_timestamp(1_700_000_050, 0).unwrap();

    h.controller.handle_at(PrintEvent::FilamentChange, at);
    h.controller.handle_at(PrintEvent::ToolChange, later);

    let snapshot = h.state.snapshot();
    assert_eq!(snapshot.filament_change_at, Some(at));
    assert_eq!(snapshot.tool_change_at, Some(later));
    assert!(h.inferencer.log.calls().is_empty());
    assert!(h.comm.log.calls().is_empty());
}

#[test]
fn test_settings_save_starts_cooldown_only_when_warning_shown() {
    let h = harness();
    h.controller.on_settings_saved();
    assert_eq!(h.inferencer.log.count("cooldown"), 0);
    assert_eq!(h.ui_messages(), vec![UiMessage::OnSave]);

    *h.inferencer.warning.lock().unwrap() = true;
    h.controller.on_settings_saved();
    assert_eq!(h.inferencer.log.count("cooldown"), 1);
    assert_eq!(h.ui_messages(), vec![UiMessage::OnSave, UiMessage::OnSave]);
}

#[test]
fn test_feedback_is_forwarded_and_failures_swallowed() {
    let h = harness();
    h.controller.submit_feedback("spaghetti");
    *h.comm.fail_feedback.lock().unwrap() = true;
    h.controller.submit_feedback("warping");

    assert_eq!(
        h.comm.log.calls(),
        vec!["feedback:spaghetti", "feedback:warping"]
    );
}

#[test]
fn test_host_event_names() {
    let h = harness();
    h.controller.on_host_event("PrintStarted");
    h.controller.on_host_event("Connected");
    assert!(h.inferencer_running());
    assert_eq!(h.inferencer.log.calls(), vec!["start"]);

    assert_eq!(
        PrintEvent::from_host_name("FilamentChange"),
        Some(PrintEvent::FilamentChange)
    );
    assert_eq!(PrintEvent::from_host_name("printstarted"), None);
}

#[test]
fn test_shutdown_stops_inferencer() {
    let h = harness();
    h.controller.handle(PrintEvent::PrintStarted);
    h.controller.shutdown();
    assert!(!h.inferencer_running());
}

#[test]
fn test_transitions_map_to_events() {
    assert_eq!(
        PrintEvent::from_transition("standby", "printing"),
        Some(PrintEvent::PrintStarted)
    );
    assert_eq!(
        PrintEvent::from_transition("paused", "printing"),
        Some(PrintEvent::PrintResumed)
    );
    assert_eq!(
        PrintEvent::from_transition("printing", "paused"),
        Some(PrintEvent::PrintPaused)
    );
    assert_eq!(
        PrintEvent::from_transition("printing", "complete"),
        Some(PrintEvent::PrintDone)
    );
    assert_eq!(
        PrintEvent::from_transition("paused", "cancelled"),
        Some(PrintEvent::PrintCancelled)
    );
    assert_eq!(
        PrintEvent::from_transition("printing", "error"),
        Some(PrintEvent::PrintFailed)
    );
    assert_eq!(PrintEvent::from_transition("printing", "printing"), None);
    assert_eq!(PrintEvent::from_transition("complete", "standby"), None);
}

#[test]
fn test_status_watcher_baseline_and_tool_changes() {
    let mut watcher = StatusWatcher::new();
    assert!(watcher.observe("printing", Some("extruder")).is_empty());
    assert!(watcher.observe("printing", Some("extruder")).is_empty());
    assert_eq!(
        watcher.observe("printing", Some("extruder1")),
        vec![PrintEvent::ToolChange]
    );
    assert_eq!(
        watcher.observe("paused", None),
        vec![PrintEvent::PrintPaused]
    );
    assert_eq!(
        watcher.observe("printing", Some("extruder")),
        vec![PrintEvent::PrintResumed, PrintEvent::ToolChange]
    );
}
