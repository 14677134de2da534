use std::path::PathBuf;

use crate::error::ConfigError;

/// Configuration for the telemetry service loaded from environment variables.
///
/// Only the endpoints and the output location are configurable; the sampling
/// cadence and the lifecycle windows are fixed in [`constants`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Moonraker API URL used for status, temperature, file and history
    /// queries as well as for pausing and resuming the printer.
    /// Environment variable: `MOONRAKER_API_URL`
    pub moonraker_api_url: String,

    /// Discord webhook URL that receives feedback reports.
    ///
    /// When unset, feedback is only logged.
    /// Environment variable: `DISCORD_WEBHOOK`
    pub discord_webhook: Option<String>,

    /// Flat-text file that receives the whole row log on every flush.
    /// Environment variable: `OUTPUT_FILE`
    pub output_file: PathBuf,

    /// Seconds between printer state polls used to derive lifecycle events.
    /// Environment variable: `STATUS_POLL_SECONDS`
    pub status_poll_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are not set or cannot be parsed:
    /// - `MOONRAKER_API_URL`: Moonraker API URL (required)
    /// - `DISCORD_WEBHOOK`: Discord webhook URL (optional)
    /// - `OUTPUT_FILE`: Row artifact path (default: "./output_file.txt")
    /// - `STATUS_POLL_SECONDS`: Lifecycle poll interval (default: "2")
    pub fn load() -> Result<Self, ConfigError> {
        let moonraker_api_url =
            std::env::var("MOONRAKER_API_URL").map_err(|_| ConfigError::MissingEnvVar {
                var_name: "MOONRAKER_API_URL".to_string(),
            })?;

        let discord_webhook = std::env::var("DISCORD_WEBHOOK")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let output_file = PathBuf::from(
            std::env::var("OUTPUT_FILE").unwrap_or_else(|_| "./output_file.txt".to_string()),
        );

        let raw_poll = std::env::var("STATUS_POLL_SECONDS").unwrap_or_else(|_| "2".to_string());
        let status_poll_seconds = match raw_poll.parse::<u64>() {
            Ok(0) => {
                return Err(ConfigError::InvalidValue {
                    field: "STATUS_POLL_SECONDS".to_string(),
                    value: raw_poll,
                    reason: "must be at least 1".to_string(),
                });
            }
            Ok(seconds) => seconds,
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    field: "STATUS_POLL_SECONDS".to_string(),
                    value: raw_poll,
                    reason: e.to_string(),
                });
            }
        };

        Ok(Config {
            moonraker_api_url: moonraker_api_url.trim_end_matches('/').to_string(),
            discord_webhook,
            output_file,
            status_poll_seconds,
        })
    }
}

/// Application constants used throughout the system.
pub mod constants {
    use std::time::Duration;

    /// No sample is taken until the process has been up this long.
    pub const WARMUP: Duration = Duration::from_secs(20);

    /// Minimum wall-clock gap between two accepted samples.
    pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(2);

    /// How often the sampling loop wakes up to check the cadence.
    pub const LOOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// The row log is rewritten to disk once it holds more rows than this.
    pub const FLUSH_THRESHOLD: usize = 5;

    /// A filament or tool change counts as recent for this many seconds.
    pub const RECENT_CHANGE_WINDOW_SECONDS: i64 = 300;

    /// Delay before retrying a failed printer status poll.
    pub const RETRY_DELAY_SECONDS: u64 = 15;

    /// Feedrate and feedrate percentage before any gcode has been seen.
    pub const DEFAULT_FEEDRATE: f64 = 1.0;
}
