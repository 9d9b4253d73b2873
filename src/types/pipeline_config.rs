//! Knobs that used to be hard-coded differently in each dashboard variant.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far back readings are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    /// No `date_begin`/`date_end`, the vendor returns its current data.
    #[default]
    All,
    /// `date_begin = now - n days`, `date_end = now`.
    TrailingDays(u32),
}

impl TimeWindow {
    /// Resolves the window against `now` into `(date_begin, date_end)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use netatmo_temps::TimeWindow;
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();
    /// let (begin, end) = TimeWindow::TrailingDays(7).bounds(now).unwrap();
    /// assert_eq!(begin, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    /// assert_eq!(end, now);
    /// assert!(TimeWindow::All.bounds(now).is_none());
    /// ```
    pub fn bounds(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self {
            TimeWindow::All => None,
            TimeWindow::TrailingDays(days) => {
                let begin = now
                    .checked_sub_signed(Duration::days(i64::from(*days)))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                Some((begin, now))
            }
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::All => write!(f, "all current data"),
            TimeWindow::TrailingDays(days) => write!(f, "trailing {} days", days),
        }
    }
}

/// How many calls are made to the station data endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// One call returning every station on the account.
    #[default]
    SingleCall,
    /// One listing call, then one call per station id.
    PerDevice,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::SingleCall => write!(f, "single call"),
            FetchStrategy::PerDevice => write!(f, "per-device calls"),
        }
    }
}

/// Everything that selects which readings a pipeline run asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window: TimeWindow,
    pub strategy: FetchStrategy,
}

#[bon::bon]
impl PipelineConfig {
    #[builder]
    pub fn new(window: Option<TimeWindow>, strategy: Option<FetchStrategy>) -> Self {
        Self {
            window: window.unwrap_or_default(),
            strategy: strategy.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_to_all_data_in_one_call() {
        let config = PipelineConfig::default();
        assert_eq!(config.window, TimeWindow::All);
        assert_eq!(config.strategy, FetchStrategy::SingleCall);
        assert_eq!(PipelineConfig::builder().build(), config);
    }

    #[test]
    fn builder_sets_fields() {
        let config = PipelineConfig::builder()
            .window(TimeWindow::TrailingDays(7))
            .strategy(FetchStrategy::PerDevice)
            .build();
        assert_eq!(config.window, TimeWindow::TrailingDays(7));
        assert_eq!(config.strategy, FetchStrategy::PerDevice);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"window": {"trailing_days": 3}}"#).unwrap();
        assert_eq!(config.window, TimeWindow::TrailingDays(3));
        assert_eq!(config.strategy, FetchStrategy::SingleCall);

        let config: PipelineConfig =
            serde_json::from_str(r#"{"window": "all", "strategy": "per_device"}"#).unwrap();
        assert_eq!(config.window, TimeWindow::All);
        assert_eq!(config.strategy, FetchStrategy::PerDevice);
    }

    #[test]
    fn zero_day_window_is_empty_interval() {
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();
        assert_eq!(TimeWindow::TrailingDays(0).bounds(now), Some((now, now)));
    }
}
