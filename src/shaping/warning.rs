use thiserror::Error;

/// A record the shaper skipped. Never fatal; collected and logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeWarning {
    #[error("Skipped device #{index}: not a valid station record ({reason})")]
    MalformedStation { index: usize, reason: String },

    #[error("Skipped device #{index}: no station_name, module_name or _id")]
    UnidentifiedStation { index: usize },

    #[error("Skipped module #{index} of {device}: not a valid module record ({reason})")]
    MalformedModule {
        device: String,
        index: usize,
        reason: String,
    },

    #[error("Skipped module #{index} of {device}: no module_name or _id")]
    UnidentifiedModule { device: String, index: usize },

    #[error("Skipped reading of {device} ({module}): not a valid dashboard ({reason})")]
    MalformedReading {
        device: String,
        module: String,
        reason: String,
    },

    #[error("No temperature reported by {device} ({module})")]
    MissingTemperature { device: String, module: String },

    #[error("Invalid time_utc {time_utc:?} for {device} ({module})")]
    InvalidTimestamp {
        device: String,
        module: String,
        time_utc: Option<i64>,
    },

    /// JSON cannot encode NaN or infinity, so payloads never raise this; only
    /// readings assembled in code can.
    #[error("Non-finite temperature reported by {device} ({module})")]
    NonFiniteTemperature { device: String, module: String },
}
