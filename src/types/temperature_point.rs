use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Module label used for a station's own built-in sensor.
pub const MAIN_UNIT: &str = "Main Unit";

/// A single temperature observation, flattened out of the station/module tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperaturePoint {
    pub time: DateTime<Utc>,
    /// Degrees Celsius, always finite.
    pub temperature: f64,
    /// Name of the station the reading belongs to.
    pub device: String,
    /// Module name, or [`MAIN_UNIT`] for the station itself.
    pub module: String,
}

impl TemperaturePoint {
    pub fn new(
        time: DateTime<Utc>,
        temperature: f64,
        device: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self {
            time,
            temperature,
            device: device.into(),
            module: module.into(),
        }
    }

    /// Series label for charts, e.g. `"Kitchen (Balcony)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.device, self.module)
    }

    pub fn is_main_unit(&self) -> bool {
        self.module == MAIN_UNIT
    }
}

impl fmt::Display for TemperaturePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.1}°C at {}",
            self.label(),
            self.temperature,
            self.time.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}
