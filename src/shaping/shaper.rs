//! Flattens the station -> module tree into a chronologically sorted list of
//! temperature points.

use crate::error::NetatmoError;
use crate::shaping::warning::ShapeWarning;
use crate::types::frames::temperature_frame::TemperatureFrame;
use crate::types::station::{DashboardData, ModuleReading, StationReading};
use crate::types::temperature_point::{TemperaturePoint, MAIN_UNIT};
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Result of shaping one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemperatureSeries {
    /// Sorted ascending by time; simultaneous readings keep payload order.
    pub points: Vec<TemperaturePoint>,
    pub warnings: Vec<ShapeWarning>,
}

impl TemperatureSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Tabular form of the points, for chart renderers.
    ///
    /// # Errors
    ///
    /// Returns [`NetatmoError::Frame`] if polars cannot assemble the columns.
    pub fn to_frame(&self) -> Result<TemperatureFrame, NetatmoError> {
        Ok(TemperatureFrame::from_points(&self.points)?)
    }
}

/// Shapes the raw `body.devices` entries.
///
/// For each station the station's own reading comes first (labelled
/// [`MAIN_UNIT`]), then one reading per module. Records without a usable name
/// or temperature are skipped with a [`ShapeWarning`]. A station whose own
/// dashboard is unusable still contributes its modules.
///
/// # Examples
///
/// ```
/// use netatmo_temps::shape_devices;
/// use serde_json::json;
///
/// let devices = vec![json!({
///     "station_name": "Kitchen",
///     "dashboard_data": {"time_utc": 1_700_000_060, "Temperature": 21.5},
///     "modules": [{
///         "module_name": "Balcony",
///         "dashboard_data": {"time_utc": 1_700_000_000, "Temperature": 14.2}
///     }]
/// })];
///
/// let series = shape_devices(&devices);
/// assert_eq!(series.points.len(), 2);
/// assert_eq!(series.points[0].module, "Balcony");
/// assert_eq!(series.points[1].module, "Main Unit");
/// ```
pub fn shape_devices(devices: &[Value]) -> TemperatureSeries {
    let mut series = TemperatureSeries::default();

    for (index, raw) in devices.iter().enumerate() {
        let station = match decode::<StationReading>(raw) {
            Ok(station) => station,
            Err(reason) => {
                series
                    .warnings
                    .push(ShapeWarning::MalformedStation { index, reason });
                continue;
            }
        };
        let Some(device) = station.display_name().map(str::to_owned) else {
            series
                .warnings
                .push(ShapeWarning::UnidentifiedStation { index });
            continue;
        };

        push_reading(&mut series, station.dashboard_data.as_ref(), &device, MAIN_UNIT);

        for (module_index, raw_module) in station.modules.iter().enumerate() {
            let module = match decode::<ModuleReading>(raw_module) {
                Ok(module) => module,
                Err(reason) => {
                    series.warnings.push(ShapeWarning::MalformedModule {
                        device: device.clone(),
                        index: module_index,
                        reason,
                    });
                    continue;
                }
            };
            let Some(module_name) = module.display_name() else {
                series.warnings.push(ShapeWarning::UnidentifiedModule {
                    device: device.clone(),
                    index: module_index,
                });
                continue;
            };
            push_reading(
                &mut series,
                module.dashboard_data.as_ref(),
                &device,
                module_name,
            );
        }
    }

    // Vec::sort_by_key is stable, so ties keep payload order.
    series.points.sort_by_key(|point| point.time);
    series
}

fn push_reading(
    series: &mut TemperatureSeries,
    dashboard: Option<&Value>,
    device: &str,
    module: &str,
) {
    let dashboard = match dashboard.map(decode::<DashboardData>).transpose() {
        Ok(dashboard) => dashboard,
        Err(reason) => {
            series.warnings.push(ShapeWarning::MalformedReading {
                device: device.to_string(),
                module: module.to_string(),
                reason,
            });
            return;
        }
    };
    match to_point(dashboard.as_ref(), device, module) {
        Ok(point) => series.points.push(point),
        Err(warning) => series.warnings.push(warning),
    }
}

fn to_point(
    dashboard: Option<&DashboardData>,
    device: &str,
    module: &str,
) -> Result<TemperaturePoint, ShapeWarning> {
    let Some(temperature) = dashboard.and_then(|d| d.temperature) else {
        return Err(ShapeWarning::MissingTemperature {
            device: device.to_string(),
            module: module.to_string(),
        });
    };
    if !temperature.is_finite() {
        return Err(ShapeWarning::NonFiniteTemperature {
            device: device.to_string(),
            module: module.to_string(),
        });
    }
    let time_utc = dashboard.and_then(|d| d.time_utc);
    let Some(time) = time_utc.and_then(|secs| DateTime::from_timestamp(secs, 0)) else {
        return Err(ShapeWarning::InvalidTimestamp {
            device: device.to_string(),
            module: module.to_string(),
            time_utc,
        });
    };
    Ok(TemperaturePoint::new(time, temperature, device, module))
}

fn decode<T: DeserializeOwned>(raw: &Value) -> Result<T, String> {
    T::deserialize(raw).map_err(|e| e.to_string())
}
