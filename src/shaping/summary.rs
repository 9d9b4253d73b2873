//! Per-device bookkeeping reported in the pipeline log.

use crate::types::temperature_point::TemperaturePoint;
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSummary {
    pub device: String,
    /// Points across the station and all of its modules.
    pub count: usize,
    pub max_temperature: f64,
    pub max_time: DateTime<Utc>,
}

impl fmt::Display for DeviceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} readings, max {:.1}°C at {}",
            self.device,
            self.count,
            self.max_temperature,
            self.max_time.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Counts points and finds the hottest reading per device, ordered by device name.
///
/// On equal maxima the earliest reading in `points` wins.
pub fn summarize(points: &[TemperaturePoint]) -> Vec<DeviceSummary> {
    let mut by_device: BTreeMap<&str, DeviceSummary> = BTreeMap::new();
    for point in points {
        by_device
            .entry(point.device.as_str())
            .and_modify(|summary| {
                summary.count += 1;
                if OrderedFloat(point.temperature) > OrderedFloat(summary.max_temperature) {
                    summary.max_temperature = point.temperature;
                    summary.max_time = point.time;
                }
            })
            .or_insert_with(|| DeviceSummary {
                device: point.device.clone(),
                count: 1,
                max_temperature: point.temperature,
                max_time: point.time,
            });
    }
    by_device.into_values().collect()
}
