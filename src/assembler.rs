use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::error::{SourceError, TelemetryError};
use crate::features::FeatureRow;
use crate::source::{FileMetadata, Lankiness, TelemetrySource, TemperatureSnapshot};
use crate::state::SharedState;

/// Builds one [`FeatureRow`] per call from live printer state and the shared
/// lifecycle/feedrate state.
///
/// Missing readings never fail a sample; they are written as 0.0 so the row
/// length stays fixed for a given extruder count.
pub struct SampleAssembler {
    source: Arc<dyn TelemetrySource>,
    state: Arc<SharedState>,
}

impl SampleAssembler {
    pub fn new(source: Arc<dyn TelemetrySource>, state: Arc<SharedState>) -> Self {
        Self { source, state }
    }

    /// Assemble a row stamped with the current wall-clock time.
    pub fn assemble(&self) -> Result<FeatureRow, TelemetryError> {
        self.assemble_at(Utc::now())
    }

    /// Assemble a row as if sampled at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Source`] if the job status, temperature or
    /// profile query fails, and [`TelemetryError::Row`] if the assembled
    /// values do not form a well-formed row.
    pub fn assemble_at(&self, now: DateTime<Utc>) -> Result<FeatureRow, TelemetryError> {
        let job = self
            .source
            .job_status()
            .map_err(|e| SourceError::new("job status", e))?;
        let tool_count = self
            .source
            .extruder_count()
            .map_err(|e| SourceError::new("printer profile", e))?;
        let temps = self
            .source
            .temperatures(tool_count)
            .map_err(|e| SourceError::new("temperatures", e))?;
        let shared = self.state.snapshot();

        let metadata = match job.active_file() {
            Some(name) => self.lookup_metadata(name),
            None => None,
        };
        let lankiness = metadata
            .as_ref()
            .and_then(|m| m.dimensions)
            .map(|d| d.lankiness())
            .unwrap_or_default();
        let last_success = metadata
            .as_ref()
            .is_some_and(FileMetadata::last_job_succeeded);

        let mut values = Vec::with_capacity(FeatureRow::expected_len(tool_count));
        values.push(f64::from(job.state.code()));
        values.push(flag(job.sd_ready));
        values.push(flag(last_success));
        values.push(or_zero("print time", job.print_time));
        values.push(or_zero("current z", job.current_z));
        push_lankiness(&mut values, lankiness);
        values.push(or_zero("resend ratio", job.resend_ratio));
        values.push(flag(shared.filament_changed_recently(now)));
        values.push(flag(shared.tool_changed_recently(now)));
        values.push(shared.feedrate);
        values.push(shared.feedrate_percent);
        values.extend(heater_fields(&temps, "bed"));
        values.extend(heater_fields(&temps, "chamber"));
        for tool in 0..tool_count {
            values.extend(heater_fields(&temps, &format!("tool{}", tool)));
        }

        let row = FeatureRow::new(values, tool_count)?;
        debug!("Assembled feature row: [{}]", row.to_line());
        Ok(row)
    }

    // File metadata only feeds the shape and history features, so a failed
    // lookup degrades those to their defaults instead of dropping the sample.
    fn lookup_metadata(&self, file_name: &str) -> Option<FileMetadata> {
        match self.source.file_metadata(file_name) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Failed to look up metadata for '{}': {}", file_name, e);
                None
            }
        }
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

fn or_zero(field: &str, value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => {
            debug!("No value for {}, defaulting to 0.0", field);
            0.0
        }
    }
}

fn push_lankiness(values: &mut Vec<f64>, lankiness: Lankiness) {
    values.push(lankiness.xy);
    values.push(lankiness.yz);
    values.push(lankiness.xz);
}

fn heater_fields(temps: &TemperatureSnapshot, heater: &str) -> [f64; 3] {
    match temps.get(heater) {
        Some(reading) => [
            or_zero(heater, reading.actual),
            or_zero(heater, reading.target),
            or_zero(heater, reading.offset),
        ],
        None => {
            debug!("Heater '{}' not reported, defaulting to 0.0", heater);
            [0.0; 3]
        }
    }
}
