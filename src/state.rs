use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::config::constants;

/// Printer connection/operation state as reported by the host.
///
/// The discriminants are stable and are written into every feature row, so
/// they must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrinterStateCode {
    OpenSerial = 0,
    DetectSerial = 1,
    DetectBaudrate = 2,
    Connecting = 3,
    Operational = 4,
    Printing = 5,
    Paused = 6,
    Closed = 7,
    Error = 8,
    ClosedWithError = 9,
    TransferingFile = 10,
    Offline = 11,
    Unknown = 12,
    None = 13,
}

impl PrinterStateCode {
    /// Stable integer code used as a feature value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Map a host state identifier such as `"OPERATIONAL"` to a state code.
    ///
    /// Matching ignores ASCII case and surrounding whitespace. Anything the
    /// host reports that is not in the table maps to [`PrinterStateCode::Unknown`].
    pub fn from_host_str(state: &str) -> Self {
        match state.trim().to_ascii_uppercase().as_str() {
            "OPEN_SERIAL" => Self::OpenSerial,
            "DETECT_SERIAL" => Self::DetectSerial,
            "DETECT_BAUDRATE" => Self::DetectBaudrate,
            "CONNECTING" => Self::Connecting,
            "OPERATIONAL" => Self::Operational,
            "PRINTING" => Self::Printing,
            "PAUSED" => Self::Paused,
            "CLOSED" => Self::Closed,
            "ERROR" => Self::Error,
            "CLOSED_WITH_ERROR" => Self::ClosedWithError,
            "TRANSFERING_FILE" => Self::TransferingFile,
            "OFFLINE" => Self::Offline,
            "NONE" => Self::None,
            _ => Self::Unknown,
        }
    }
}

/// Point-in-time copy of the state shared between the event path and the
/// sampling thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    pub filament_change_at: Option<DateTime<Utc>>,
    pub tool_change_at: Option<DateTime<Utc>>,
    pub feedrate: f64,
    pub feedrate_percent: f64,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            filament_change_at: None,
            tool_change_at: None,
            feedrate: constants::DEFAULT_FEEDRATE,
            feedrate_percent: constants::DEFAULT_FEEDRATE,
        }
    }
}

impl StateSnapshot {
    pub fn filament_changed_recently(&self, now: DateTime<Utc>) -> bool {
        within_change_window(self.filament_change_at, now)
    }

    pub fn tool_changed_recently(&self, now: DateTime<Utc>) -> bool {
        within_change_window(self.tool_change_at, now)
    }
}

fn within_change_window(changed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match changed_at {
        Some(at) => {
            (now - at) < chrono::Duration::seconds(constants::RECENT_CHANGE_WINDOW_SECONDS)
        }
        None => false,
    }
}

/// Lifecycle timers and feedrate scalars behind a single lock.
///
/// One instance is shared via `Arc` by the lifecycle controller, the gcode
/// feedrate tracker and the sample assembler. Every accessor holds the lock
/// only for the duration of a copy.
#[derive(Debug, Default)]
pub struct SharedState {
    inner: Mutex<StateSnapshot>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        *self.lock()
    }

    pub fn record_filament_change(&self, at: DateTime<Utc>) {
        self.lock().filament_change_at = Some(at);
    }

    pub fn record_tool_change(&self, at: DateTime<Utc>) {
        self.lock().tool_change_at = Some(at);
    }

    pub fn set_feedrate(&self, feedrate: f64) {
        self.lock().feedrate = feedrate;
    }

    pub fn set_feedrate_percent(&self, percent: f64) {
        self.lock().feedrate_percent = percent;
    }

    // The guarded data is plain values, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, StateSnapshot> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
