use std::sync::Arc;

use log::{debug, warn};

use crate::error::{ParseError, TelemetryError};
use crate::state::SharedState;

/// Motion commands whose `F` parameter sets the absolute feedrate.
const MOTION_CODES: [&str; 4] = ["G0", "G1", "G2", "G3"];

/// Global feedrate percentage override.
const FEEDRATE_OVERRIDE_CODE: &str = "M220";

/// Watches outbound gcode and keeps the shared feedrate state current.
///
/// The tracker only observes: commands are never blocked or rewritten, and a
/// malformed parameter leaves the previously held value untouched.
pub struct GcodeFeedrateTracker {
    state: Arc<SharedState>,
}

impl GcodeFeedrateTracker {
    pub fn new(state: Arc<SharedState>) -> Self {
        Self { state }
    }

    /// Inspect one command line as it is sent to the printer.
    pub fn on_gcode_sent(&self, command: &str) {
        if let Err(e) = self.apply_gcode(command) {
            warn!("Ignoring feedrate update: {}", e);
        }
    }

    /// Apply a command's feedrate parameters to the shared state.
    ///
    /// Returns whether the state changed. A malformed parameter is returned
    /// as [`TelemetryError::Parse`] and leaves the held value as it was.
    pub fn apply_gcode(&self, command: &str) -> Result<bool, TelemetryError> {
        let Some(code) = command_code(command) else {
            return Ok(false);
        };

        if MOTION_CODES.contains(&code.as_str()) {
            if let Some(feedrate) = parse_parameter(command, 'F')? {
                debug!("Feedrate set to {}", feedrate);
                self.state.set_feedrate(feedrate);
                return Ok(true);
            }
        } else if code == FEEDRATE_OVERRIDE_CODE {
            if let Some(percent) = parse_parameter(command, 'S')? {
                debug!("Feedrate percentage set to {}", percent);
                self.state.set_feedrate_percent(percent);
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Leading command word of a gcode line, uppercased (`"g1 x5"` -> `"G1"`).
///
/// Returns `None` for blank lines and comment-only lines.
pub fn command_code(command: &str) -> Option<String> {
    strip_comment(command)
        .split_whitespace()
        .next()
        .map(str::to_ascii_uppercase)
}

/// Read the numeric value of parameter `letter` from a gcode line.
///
/// Parameters are whitespace-separated words after the command word; the
/// value runs to the end of the word, so a parameter that ends the line is
/// read the same as one followed by more words. Anything after `;` is a
/// comment and is ignored.
///
/// # Errors
///
/// Returns [`ParseError::MissingValue`] for a bare letter and
/// [`ParseError::InvalidNumber`] when the value is not a finite number.
pub fn parse_parameter(command: &str, letter: char) -> Result<Option<f64>, ParseError> {
    let word = strip_comment(command)
        .split_whitespace()
        .skip(1)
        .find(|word| {
            word.chars()
                .next()
                .is_some_and(|c| c.eq_ignore_ascii_case(&letter))
        });

    let Some(word) = word else {
        return Ok(None);
    };

    let value = &word[letter.len_utf8()..];
    if value.is_empty() {
        return Err(ParseError::MissingValue {
            letter,
            command: command.trim().to_string(),
        });
    }

    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(ParseError::InvalidNumber {
            letter,
            token: word.to_string(),
        }),
    }
}

fn strip_comment(command: &str) -> &str {
    match command.find(';') {
        Some(idx) => &command[..idx],
        None => command,
    }
}
