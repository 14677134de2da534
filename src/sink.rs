use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PersistError, TelemetryError};
use crate::features::RowLog;

/// Destination for the accumulated row log.
///
/// Each call receives the entire log, so after every flush the persisted
/// artifact holds every row captured so far in capture order.
pub trait RowSink: Send {
    fn rewrite(&mut self, log: &RowLog) -> Result<(), TelemetryError>;
}

/// Writes the row log to a local flat-text file, replacing previous content.
#[derive(Debug, Clone)]
pub struct FlatFileSink {
    path: PathBuf,
}

impl FlatFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for FlatFileSink {
    fn rewrite(&mut self, log: &RowLog) -> Result<(), TelemetryError> {
        fs::write(&self.path, log.to_text()).map_err(|e| PersistError::WriteFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
