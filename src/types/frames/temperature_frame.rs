//! Contains the `TemperatureFrame` structure: the tabular form of a temperature
//! series that chart renderers consume.

use crate::types::temperature_point::TemperaturePoint;
use chrono::{DateTime, Utc};
use polars::prelude::*;

/// Column names of a [`TemperatureFrame`].
pub const TIME_COLUMN: &str = "time";
pub const TEMPERATURE_COLUMN: &str = "temperature";
pub const DEVICE_COLUMN: &str = "device";
pub const MODULE_COLUMN: &str = "module";
pub const LABEL_COLUMN: &str = "label";

/// A wrapper around a Polars `DataFrame` holding temperature points.
///
/// Columns:
///
/// | column        | type                    |
/// |---------------|-------------------------|
/// | `time`        | `Datetime(ms)`, naive UTC |
/// | `temperature` | `f64`, degrees Celsius  |
/// | `device`      | `str`                   |
/// | `module`      | `str`                   |
/// | `label`       | `str`, `"device (module)"` |
///
/// The time column is timezone-naive but always holds UTC, so range filters
/// compare against `naive_utc()` values.
///
/// Row order follows the series the frame was built from, i.e. ascending time.
/// An empty series still produces a frame with these columns, so renderers can
/// check [`TemperatureFrame::is_empty`] and show a "no data" state.
#[derive(Debug, Clone)]
pub struct TemperatureFrame {
    pub frame: DataFrame,
}

impl TemperatureFrame {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Builds a frame from already sorted points.
    ///
    /// # Errors
    ///
    /// Returns a [`PolarsError`] if the columns cannot be assembled.
    pub fn from_points(points: &[TemperaturePoint]) -> PolarsResult<Self> {
        let millis: Vec<i64> = points.iter().map(|p| p.time.timestamp_millis()).collect();
        let temperatures: Vec<f64> = points.iter().map(|p| p.temperature).collect();
        let devices: Vec<&str> = points.iter().map(|p| p.device.as_str()).collect();
        let modules: Vec<&str> = points.iter().map(|p| p.module.as_str()).collect();
        let labels: Vec<String> = points.iter().map(TemperaturePoint::label).collect();

        let frame = df!(
            TIME_COLUMN => millis,
            TEMPERATURE_COLUMN => temperatures,
            DEVICE_COLUMN => devices,
            MODULE_COLUMN => modules,
            LABEL_COLUMN => labels,
        )?
        .lazy()
        .with_column(col(TIME_COLUMN).cast(DataType::Datetime(TimeUnit::Milliseconds, None)))
        .collect()?;

        Ok(Self { frame })
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Keeps the rows matching a Polars predicate.
    ///
    /// # Errors
    ///
    /// Returns a [`PolarsError`] if the predicate cannot be evaluated against the frame.
    pub fn filter(&self, predicate: Expr) -> PolarsResult<TemperatureFrame> {
        let frame = self.frame.clone().lazy().filter(predicate).collect()?;
        Ok(TemperatureFrame::new(frame))
    }

    /// Keeps the rows of one station, its modules included.
    pub fn for_device(&self, device: &str) -> PolarsResult<TemperatureFrame> {
        self.filter(col(DEVICE_COLUMN).eq(lit(device)))
    }

    /// Keeps the rows with `start <= time <= end`.
    pub fn get_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PolarsResult<TemperatureFrame> {
        self.filter(
            col(TIME_COLUMN)
                .gt_eq(lit(start.naive_utc()))
                .and(col(TIME_COLUMN).lt_eq(lit(end.naive_utc()))),
        )
    }

    /// Distinct series labels in order of first appearance.
    pub fn labels(&self) -> PolarsResult<Vec<String>> {
        let labels = self.frame.column(LABEL_COLUMN)?.str()?;
        let mut seen = Vec::new();
        for label in labels.into_iter().flatten() {
            if !seen.iter().any(|s: &String| s == label) {
                seen.push(label.to_string());
            }
        }
        Ok(seen)
    }
}
