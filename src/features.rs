use crate::error::RowError;

/// Names of the fixed leading fields of every feature row, in order.
///
/// Each extruder then contributes `tool{N}_actual`, `tool{N}_target` and
/// `tool{N}_offset`.
pub const BASE_FEATURES: [&str; 19] = [
    "printer_state",
    "sd_ready",
    "last_job_success",
    "print_time",
    "current_z",
    "lankiness_xy",
    "lankiness_yz",
    "lankiness_xz",
    "resend_ratio",
    "recent_filament_change",
    "recent_tool_change",
    "feedrate",
    "feedrate_percent",
    "bed_actual",
    "bed_target",
    "bed_offset",
    "chamber_actual",
    "chamber_target",
    "chamber_offset",
];

/// Fields appended per extruder.
pub const FIELDS_PER_TOOL: usize = 3;

/// One sampled telemetry snapshot with a fixed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    values: Vec<f64>,
    tool_count: usize,
}

impl FeatureRow {
    /// Row length for a printer with `tool_count` extruders.
    pub fn expected_len(tool_count: usize) -> usize {
        BASE_FEATURES.len() + FIELDS_PER_TOOL * tool_count
    }

    /// Wrap assembled values, checking them against the schema.
    ///
    /// # Errors
    ///
    /// Returns [`RowError::BadRow`] if the length does not match the tool
    /// count and [`RowError::NonFinite`] if any value is NaN or infinite.
    pub fn new(values: Vec<f64>, tool_count: usize) -> Result<Self, RowError> {
        let expected = Self::expected_len(tool_count);
        if values.len() != expected {
            return Err(RowError::BadRow {
                expected,
                actual: values.len(),
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(RowError::NonFinite { index });
        }
        Ok(Self { values, tool_count })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn tool_count(&self) -> usize {
        self.tool_count
    }

    /// Look a field up by name, e.g. `"feedrate"` or `"tool1_target"`.
    pub fn get(&self, name: &str) -> Option<f64> {
        if let Some(index) = BASE_FEATURES.iter().position(|n| *n == name) {
            return self.values.get(index).copied();
        }
        let (tool, field) = name.strip_prefix("tool")?.split_once('_')?;
        let tool: usize = tool.parse().ok()?;
        if tool >= self.tool_count {
            return None;
        }
        let offset = match field {
            "actual" => 0,
            "target" => 1,
            "offset" => 2,
            _ => return None,
        };
        self.values
            .get(BASE_FEATURES.len() + tool * FIELDS_PER_TOOL + offset)
            .copied()
    }

    /// Render the row as one line of the flat-text artifact: values joined
    /// with `", "` and no surrounding brackets.
    pub fn to_line(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Append-only, capture-ordered log of feature rows for the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowLog {
    rows: Vec<FeatureRow>,
}

impl RowLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, row: FeatureRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// The full flat-text rendering: one line per row, each newline-terminated.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for row in &self.rows {
            text.push_str(&row.to_line());
            text.push('\n');
        }
        text
    }
}
