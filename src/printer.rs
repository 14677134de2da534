use anyhow::Result;
use serde_json::Value;

use crate::collaborators::PrinterControl;
use crate::source::{
    FileMetadata, HeaterReading, JobOutcome, JobStatus, TelemetrySource, TemperatureSnapshot,
};
use crate::state::PrinterStateCode;

/// History entries requested per page when looking up a file's past prints.
const HISTORY_LIMIT: usize = 50;

/// Pages scanned before a file is treated as never printed.
const MAX_HISTORY_PAGES: usize = 20;

/// Klipper object holding the chamber heater, when one is configured.
const CHAMBER_HEATER: &str = "heater_generic chamber";

/// Print job state and active extruder from one status poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterStatus {
    pub state: String,
    pub active_extruder: Option<String>,
}

/// Printer client for the Moonraker API.
///
/// Provides printer control (pause/resume) and every read the sample
/// assembler needs: job status, heater readings, extruder count and per-file
/// print history.
pub struct MoonrakerClient {
    pub api_url: String,
    client: reqwest::blocking::Client,
}

impl MoonrakerClient {
    /// Create a new MoonrakerClient with the provided Moonraker API URL.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL for the Moonraker API (e.g., "http://printer.local:7125")
    ///
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Pause the current print job.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails
    /// - The Moonraker API returns an error status
    /// - The printer is not currently printing
    pub fn pause_print(&self) -> Result<()> {
        self.post("printer/print/pause", "pause print")
    }

    /// Resume the current print job.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails
    /// - The Moonraker API returns an error status
    /// - The printer is not currently paused
    pub fn resume_print(&self) -> Result<()> {
        self.post("printer/print/resume", "resume print")
    }

    /// Get the print job state and the active extruder.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API returns an error
    /// status or the response carries no `print_stats.state`.
    pub fn print_status(&self) -> Result<PrinterStatus> {
        let status = self.query_objects(&["print_stats", "toolhead"])?;
        let state = status["print_stats"]["state"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Printer status has no print_stats.state"))?
            .to_string();
        let active_extruder = status["toolhead"]["extruder"].as_str().map(str::to_string);
        Ok(PrinterStatus {
            state,
            active_extruder,
        })
    }

    /// Query Klipper printer objects and return `result.status`.
    fn query_objects(&self, objects: &[&str]) -> Result<Value> {
        let query = objects
            .iter()
            .map(|name| name.replace(' ', "%20"))
            .collect::<Vec<_>>()
            .join("&");
        let body = self.get(&format!("printer/objects/query?{}", query), "query printer objects")?;
        Ok(body["result"]["status"].clone())
    }

    fn get(&self, path: &str, action: &str) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/{}", self.api_url, path))
            .send()?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to {}: HTTP {}",
                action,
                response.status()
            ));
        }

        let body: Value = response.json()?;
        Ok(body)
    }

    fn post(&self, path: &str, action: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/{}", self.api_url, path))
            .send()?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to {}: HTTP {}",
                action,
                response.status()
            ));
        }

        Ok(())
    }
}

impl PrinterControl for MoonrakerClient {
    fn restart(&self) -> Result<()> {
        self.resume_print()
    }

    fn pause(&self) -> Result<()> {
        self.pause_print()
    }
}

impl TelemetrySource for MoonrakerClient {
    fn job_status(&self) -> Result<JobStatus> {
        let status = self.query_objects(&["webhooks", "print_stats", "toolhead", "virtual_sdcard"])?;
        Ok(job_status_from_objects(&status))
    }

    fn temperatures(&self, tool_count: usize) -> Result<TemperatureSnapshot> {
        let mut objects = vec!["heater_bed".to_string(), CHAMBER_HEATER.to_string()];
        objects.extend((0..tool_count).map(extruder_object));
        let names = objects.iter().map(String::as_str).collect::<Vec<_>>();
        let status = self.query_objects(&names)?;
        Ok(temperatures_from_objects(&status, tool_count))
    }

    fn file_metadata(&self, file_name: &str) -> Result<Option<FileMetadata>> {
        search_history(file_name, |start| {
            let body = self.get(
                &format!(
                    "server/history/list?limit={}&start={}&order=desc",
                    HISTORY_LIMIT, start
                ),
                "list job history",
            )?;
            Ok(body["result"]["jobs"].clone())
        })
    }

    fn extruder_count(&self) -> Result<usize> {
        let body = self.get("printer/objects/list", "list printer objects")?;
        Ok(extruder_count_from_objects(&body["result"]["objects"]))
    }
}

/// Klipper object name for extruder index `tool` (`extruder`, `extruder1`, ...).
pub fn extruder_object(tool: usize) -> String {
    if tool == 0 {
        "extruder".to_string()
    } else {
        format!("extruder{}", tool)
    }
}

/// Map Moonraker's `webhooks.state` and `print_stats.state` onto a host
/// printer state code.
pub fn klipper_state_code(webhooks_state: &str, print_state: &str) -> PrinterStateCode {
    match webhooks_state {
        "startup" => return PrinterStateCode::Connecting,
        "shutdown" => return PrinterStateCode::ClosedWithError,
        "error" => return PrinterStateCode::Error,
        "ready" => {}
        _ => return PrinterStateCode::Unknown,
    }
    match print_state {
        "printing" => PrinterStateCode::Printing,
        "paused" => PrinterStateCode::Paused,
        "error" => PrinterStateCode::Error,
        "standby" | "complete" | "cancelled" => PrinterStateCode::Operational,
        _ => PrinterStateCode::Unknown,
    }
}

/// Build a job snapshot from a `printer/objects/query` status object.
pub fn job_status_from_objects(status: &Value) -> JobStatus {
    let stats = &status["print_stats"];
    JobStatus {
        state: klipper_state_code(
            status["webhooks"]["state"].as_str().unwrap_or("unknown"),
            stats["state"].as_str().unwrap_or("unknown"),
        ),
        sd_ready: status["virtual_sdcard"].is_object(),
        file_name: stats["filename"].as_str().map(str::to_string),
        print_time: stats["print_duration"].as_f64(),
        current_z: status["toolhead"]["position"][2].as_f64(),
        // Klipper does not track serial resends.
        resend_ratio: None,
    }
}

/// Build a temperature snapshot keyed `bed`, `chamber` and `tool{N}`.
pub fn temperatures_from_objects(status: &Value, tool_count: usize) -> TemperatureSnapshot {
    let mut temps = TemperatureSnapshot::new();
    if let Some(reading) = heater_reading(&status["heater_bed"]) {
        temps.insert("bed", reading);
    }
    if let Some(reading) = heater_reading(&status[CHAMBER_HEATER]) {
        temps.insert("chamber", reading);
    }
    for tool in 0..tool_count {
        if let Some(reading) = heater_reading(&status[extruder_object(tool).as_str()]) {
            temps.insert(format!("tool{}", tool), reading);
        }
    }
    temps
}

fn heater_reading(object: &Value) -> Option<HeaterReading> {
    if !object.is_object() {
        return None;
    }
    Some(HeaterReading {
        actual: object["temperature"].as_f64(),
        target: object["target"].as_f64(),
        offset: None,
    })
}

/// Count `extruder`, `extruder1`, ... in a `printer/objects/list` response.
pub fn extruder_count_from_objects(objects: &Value) -> usize {
    objects
        .as_array()
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| {
                    name.strip_prefix("extruder")
                        .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
                })
                .count()
        })
        .unwrap_or(0)
}

/// Page through the job history, newest first, until `file_name` shows up.
///
/// `fetch_page` receives the offset of the page to load and returns its job
/// array. Only the first matching page is collected; it always holds the
/// file's most recent job. The scan ends at a short page or after
/// `MAX_HISTORY_PAGES` pages, and a file not seen by then reads as never
/// printed.
pub fn search_history<F>(file_name: &str, mut fetch_page: F) -> Result<Option<FileMetadata>>
where
    F: FnMut(usize) -> Result<Value>,
{
    for page in 0..MAX_HISTORY_PAGES {
        let jobs = fetch_page(page * HISTORY_LIMIT)?;
        if let Some(metadata) = file_metadata_from_history(&jobs, file_name) {
            return Ok(Some(metadata));
        }
        if jobs.as_array().map_or(0, Vec::len) < HISTORY_LIMIT {
            break;
        }
    }
    Ok(None)
}

/// Collect finished jobs for `file_name` from a newest-first history list.
///
/// Returns `None` when the file has never finished a print. Moonraker does
/// not report a bounding box, so `dimensions` is always `None`.
pub fn file_metadata_from_history(jobs: &Value, file_name: &str) -> Option<FileMetadata> {
    let mut history = jobs
        .as_array()?
        .iter()
        .filter(|job| job["filename"].as_str() == Some(file_name))
        .filter(|job| job["status"].as_str() != Some("in_progress"))
        .map(|job| JobOutcome {
            success: job["status"].as_str() == Some("completed"),
        })
        .collect::<Vec<_>>();
    if history.is_empty() {
        return None;
    }
    history.reverse();
    Some(FileMetadata {
        dimensions: None,
        history,
    })
}
