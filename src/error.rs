use std::fmt;

/// Custom error types for the print telemetry core.
///
/// Sampling, gcode inspection and persistence failures all surface as
/// [`TelemetryError`]; configuration errors stay separate because they only
/// occur at startup. None of these are fatal to the host: the worst outcome
/// is a skipped sample or a stale feedrate reading.

/// Main error type for telemetry operations.
#[derive(Debug)]
pub enum TelemetryError {
    /// A feature row was not well formed.
    Row(RowError),

    /// A gcode parameter could not be read.
    Parse(ParseError),

    /// A printer/job/temperature query failed.
    Source(SourceError),

    /// The row log could not be written to its sink.
    Persist(PersistError),
}

/// A feature row that does not match the fixed schema.
#[derive(Debug, Clone, PartialEq)]
pub enum RowError {
    /// Row length differs from `19 + 3 * tool_count`.
    BadRow { expected: usize, actual: usize },

    /// A field is NaN or infinite.
    NonFinite { index: usize },
}

/// Errors produced while reading a parameter out of a gcode line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The parameter letter is present but carries no number (`G1 F`).
    MissingValue { letter: char, command: String },

    /// The parameter value is not a number (`G1 Fabc`).
    InvalidNumber { letter: char, token: String },
}

/// A collaborator query failed while assembling a sample.
#[derive(Debug)]
pub struct SourceError {
    pub query: &'static str,
    pub reason: String,
}

/// Errors writing the flat-text row artifact.
#[derive(Debug)]
pub enum PersistError {
    /// The sink file could not be written.
    WriteFailed { path: String, reason: String },
}

/// Errors related to configuration and application setup.
#[derive(Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    MissingEnvVar { var_name: String },

    /// Invalid configuration values provided.
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl SourceError {
    pub fn new(query: &'static str, err: impl fmt::Display) -> Self {
        Self {
            query,
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Row(e) => write!(f, "Row error: {}", e),
            TelemetryError::Parse(e) => write!(f, "Gcode parse error: {}", e),
            TelemetryError::Source(e) => write!(f, "Source error: {}", e),
            TelemetryError::Persist(e) => write!(f, "Persistence error: {}", e),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::BadRow { expected, actual } => {
                write!(
                    f,
                    "Feature row has {} fields, expected {}",
                    actual, expected
                )
            }
            RowError::NonFinite { index } => {
                write!(f, "Feature row field {} is not a finite number", index)
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingValue { letter, command } => {
                write!(f, "Parameter '{}' has no value in '{}'", letter, command)
            }
            ParseError::InvalidNumber { letter, token } => {
                write!(f, "Parameter '{}' is not a number: '{}'", letter, token)
            }
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to query {}: {}", self.query, self.reason)
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::WriteFailed { path, reason } => {
                write!(f, "Failed to write rows to '{}': {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingEnvVar { var_name } => {
                write!(f, "Required environment variable '{}' is not set", var_name)
            }
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, reason
                )
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Row(e) => Some(e),
            TelemetryError::Parse(e) => Some(e),
            TelemetryError::Source(e) => Some(e),
            TelemetryError::Persist(e) => Some(e),
        }
    }
}

impl std::error::Error for RowError {}
impl std::error::Error for ParseError {}
impl std::error::Error for SourceError {}
impl std::error::Error for PersistError {}
impl std::error::Error for ConfigError {}

// Conversion traits for easy error propagation
impl From<RowError> for TelemetryError {
    fn from(err: RowError) -> Self {
        TelemetryError::Row(err)
    }
}

impl From<ParseError> for TelemetryError {
    fn from(err: ParseError) -> Self {
        TelemetryError::Parse(err)
    }
}

impl From<SourceError> for TelemetryError {
    fn from(err: SourceError) -> Self {
        TelemetryError::Source(err)
    }
}

impl From<PersistError> for TelemetryError {
    fn from(err: PersistError) -> Self {
        TelemetryError::Persist(err)
    }
}
