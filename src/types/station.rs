//! Serde models of the `getstationsdata` payload.
//!
//! Every field is optional: the vendor omits measurements a device does not
//! have, and drops `dashboard_data` entirely for a device that is offline.
//! Dashboards stay raw JSON on stations and modules so that a bad dashboard
//! only costs its own reading.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One physical base station together with its paired modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StationReading {
    /// MAC address of the station, e.g. `"70:ee:50:00:00:01"`.
    #[serde(rename = "_id")]
    pub id: Option<String>,
    /// Display name chosen by the owner.
    pub station_name: Option<String>,
    /// Name of the station's own indoor module, used when `station_name` is absent.
    pub module_name: Option<String>,
    /// Vendor model code (`NAMain` for the base station).
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    /// Raw [`DashboardData`].
    pub dashboard_data: Option<Value>,
    /// Modules are kept as raw values so one malformed module does not
    /// invalidate its station. `null` reads as no modules.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub modules: Vec<Value>,
}

/// A secondary sensor paired with a station.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleReading {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub module_name: Option<String>,
    #[serde(rename = "type")]
    pub module_type: Option<String>,
    /// Raw [`DashboardData`].
    pub dashboard_data: Option<Value>,
}

/// Latest measurements of a station or module and when they were captured.
///
/// `time_utc` and `Temperature` must be numbers when present. The other
/// measurements read as `None` when they are not numeric.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardData {
    /// Capture time in Unix seconds.
    pub time_utc: Option<i64>,
    /// Degrees Celsius.
    #[serde(rename = "Temperature")]
    pub temperature: Option<f64>,
    #[serde(rename = "Humidity", default, deserialize_with = "lenient_f64")]
    pub humidity: Option<f64>,
    #[serde(rename = "CO2", default, deserialize_with = "lenient_f64")]
    pub co2: Option<f64>,
    #[serde(rename = "Pressure", default, deserialize_with = "lenient_f64")]
    pub pressure: Option<f64>,
    #[serde(rename = "Noise", default, deserialize_with = "lenient_f64")]
    pub noise: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max_temp: Option<f64>,
}

impl StationReading {
    /// The name a station is shown under: `station_name`, then `module_name`, then `_id`.
    pub fn display_name(&self) -> Option<&str> {
        first_non_empty([&self.station_name, &self.module_name, &self.id])
    }
}

impl ModuleReading {
    /// `module_name`, falling back to `_id`.
    pub fn display_name(&self) -> Option<&str> {
        first_non_empty([&self.module_name, &self.id])
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64())
}

fn first_non_empty<const N: usize>(candidates: [&Option<String>; N]) -> Option<&str> {
    candidates
        .into_iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|name| !name.is_empty())
}
