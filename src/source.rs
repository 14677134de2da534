//! Read-only views of printer, job, temperature and file state.
//!
//! [`TelemetrySource`] is the seam between the sample assembler and whatever
//! host actually talks to the printer. All getters are synchronous and are
//! called once per sampling tick.

use std::collections::HashMap;

use anyhow::Result;

use crate::state::PrinterStateCode;

/// Current printer status and job snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub state: PrinterStateCode,
    pub sd_ready: bool,
    /// Name of the selected job file, if any.
    pub file_name: Option<String>,
    pub print_time: Option<f64>,
    pub current_z: Option<f64>,
    pub resend_ratio: Option<f64>,
}

impl JobStatus {
    /// The selected job file, treating an empty name as no selection.
    pub fn active_file(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|name| !name.is_empty())
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            state: PrinterStateCode::Unknown,
            sd_ready: false,
            file_name: None,
            print_time: None,
            current_z: None,
            resend_ratio: None,
        }
    }
}

/// Readings for one heater. Any part may be unreported.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeaterReading {
    pub actual: Option<f64>,
    pub target: Option<f64>,
    pub offset: Option<f64>,
}

/// Heater readings keyed by host heater name (`bed`, `chamber`, `tool0`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureSnapshot {
    heaters: HashMap<String, HeaterReading>,
}

impl TemperatureSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heater(mut self, name: impl Into<String>, reading: HeaterReading) -> Self {
        self.insert(name, reading);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, reading: HeaterReading) {
        self.heaters.insert(name.into(), reading);
    }

    pub fn get(&self, name: &str) -> Option<&HeaterReading> {
        self.heaters.get(name)
    }
}

/// Bounding box of a sliced job, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

/// Width/depth, depth/height and width/height of a job's bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Lankiness {
    pub xy: f64,
    pub yz: f64,
    pub xz: f64,
}

impl Dimensions {
    /// Shape ratios of the bounding box. A ratio whose denominator is not
    /// positive is reported as 0.0.
    pub fn lankiness(&self) -> Lankiness {
        Lankiness {
            xy: ratio(self.width, self.depth),
            yz: ratio(self.depth, self.height),
            xz: ratio(self.width, self.height),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 && numerator.is_finite() && denominator.is_finite() {
        numerator / denominator
    } else {
        0.0
    }
}

/// One finished print of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub success: bool,
}

/// Analysis and print history for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMetadata {
    pub dimensions: Option<Dimensions>,
    /// Past outcomes, oldest first.
    pub history: Vec<JobOutcome>,
}

impl FileMetadata {
    /// Whether the most recent recorded print of this file succeeded.
    pub fn last_job_succeeded(&self) -> bool {
        self.history.last().is_some_and(|outcome| outcome.success)
    }
}

/// Synchronous provider of everything a sampling tick reads.
pub trait TelemetrySource: Send + Sync {
    /// Printer state and the current job.
    fn job_status(&self) -> Result<JobStatus>;

    /// Current heater readings for the bed, the chamber and the first
    /// `tool_count` extruders.
    fn temperatures(&self, tool_count: usize) -> Result<TemperatureSnapshot>;

    /// Analysis and history for `file_name`, or `None` if the host has no
    /// record of it.
    fn file_metadata(&self, file_name: &str) -> Result<Option<FileMetadata>>;

    /// Extruder count of the active printer profile.
    fn extruder_count(&self) -> Result<usize>;
}
