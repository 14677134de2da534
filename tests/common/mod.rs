#![allow(dead_code)]

use std::sync::Mutex;

use anyhow::Result;
use print_telemetry::collaborators::{
    CommManager, Inferencer, PrinterControl, UiMessage, UiNotifier,
};
use print_telemetry::error::{PersistError, TelemetryError};
use print_telemetry::features::RowLog;
use print_telemetry::sink::RowSink;
use print_telemetry::source::{
    FileMetadata, JobStatus, TelemetrySource, TemperatureSnapshot,
};

/// In-memory telemetry source with settable snapshots.
pub struct FakeSource {
    pub job: Mutex<JobStatus>,
    pub temps: Mutex<TemperatureSnapshot>,
    pub metadata: Mutex<Option<FileMetadata>>,
    pub extruders: Mutex<usize>,
    pub fail_job_status: Mutex<bool>,
    pub fail_metadata: Mutex<bool>,
    pub profile_queries: Mutex<usize>,
    pub temperature_requests: Mutex<Vec<usize>>,
}

impl FakeSource {
    pub fn new(extruders: usize) -> Self {
        Self {
            job: Mutex::new(JobStatus::default()),
            temps: Mutex::new(TemperatureSnapshot::new()),
            metadata: Mutex::new(None),
            extruders: Mutex::new(extruders),
            fail_job_status: Mutex::new(false),
            fail_metadata: Mutex::new(false),
            profile_queries: Mutex::new(0),
            temperature_requests: Mutex::new(Vec::new()),
        }
    }
}

impl TelemetrySource for FakeSource {
    fn job_status(&self) -> Result<JobStatus> {
        if *self.fail_job_status.lock().unwrap() {
            return Err(anyhow::anyhow!("printer unreachable"));
        }
        Ok(self.job.lock().unwrap().clone())
    }

    fn temperatures(&self, tool_count: usize) -> Result<TemperatureSnapshot> {
        self.temperature_requests.lock().unwrap().push(tool_count);
        Ok(self.temps.lock().unwrap().clone())
    }

    fn file_metadata(&self, _file_name: &str) -> Result<Option<FileMetadata>> {
        if *self.fail_metadata.lock().unwrap() {
            return Err(anyhow::anyhow!("history unavailable"));
        }
        Ok(self.metadata.lock().unwrap().clone())
    }

    fn extruder_count(&self) -> Result<usize> {
        *self.profile_queries.lock().unwrap() += 1;
        Ok(*self.extruders.lock().unwrap())
    }
}

/// Records every collaborator call in order.
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[derive(Default)]
pub struct FakeInferencer {
    pub log: CallLog,
    pub running: Mutex<bool>,
    pub triggered: Mutex<bool>,
    pub warning: Mutex<bool>,
}

impl Inferencer for FakeInferencer {
    fn start_service(&self) {
        self.log.record("start");
        *self.running.lock().unwrap() = true;
    }

    fn kill_service(&self) {
        self.log.record("kill");
        *self.running.lock().unwrap() = false;
    }

    fn shutoff_event(&self) {
        self.log.record("shutoff");
    }

    fn begin_cooldown(&self) {
        self.log.record("cooldown");
    }

    fn triggered(&self) -> bool {
        *self.triggered.lock().unwrap()
    }

    fn warning_notification(&self) -> bool {
        *self.warning.lock().unwrap()
    }
}

#[derive(Default)]
pub struct FakeComm {
    pub log: CallLog,
    pub running: Mutex<bool>,
    pub fail_feedback: Mutex<bool>,
}

impl CommManager for FakeComm {
    fn start_service(&self) {
        self.log.record("start");
        *self.running.lock().unwrap() = true;
    }

    fn kill_service(&self) {
        self.log.record("kill");
        *self.running.lock().unwrap() = false;
    }

    fn new_ticket(&self) {
        self.log.record("new_ticket");
    }

    fn send_feedback(&self, classification: &str) -> Result<()> {
        self.log.record(&format!("feedback:{}", classification));
        if *self.fail_feedback.lock().unwrap() {
            return Err(anyhow::anyhow!("offline"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePrinter {
    pub log: CallLog,
}

impl PrinterControl for FakePrinter {
    fn restart(&self) -> Result<()> {
        self.log.record("restart");
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.log.record("pause");
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUi {
    pub messages: Mutex<Vec<UiMessage>>,
}

impl UiNotifier for FakeUi {
    fn notify(&self, message: UiMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

/// Sink that keeps a copy of every successful flush.
///
/// While `fail` is set every write is rejected and nothing is recorded.
#[derive(Default)]
pub struct MemorySink {
    pub flushes: std::sync::Arc<Mutex<Vec<RowLog>>>,
    pub fail: std::sync::Arc<Mutex<bool>>,
}

impl RowSink for MemorySink {
    fn rewrite(&mut self, log: &RowLog) -> Result<(), TelemetryError> {
        if *self.fail.lock().unwrap() {
            return Err(PersistError::WriteFailed {
                path: "memory".to_string(),
                reason: "disk full".to_string(),
            }
            .into());
        }
        self.flushes.lock().unwrap().push(log.clone());
        Ok(())
    }
}
