//! Poll Netatmo weather stations for temperature readings and shape them into a
//! time series ready for charting.
//!
//! The pipeline has three stages: an [`Authenticator`] exchanges the refresh
//! token for an access token, a [`ReadingsFetcher`] downloads the station
//! payload, and [`shape_devices`] flattens it into sorted [`TemperaturePoint`]s.
//! [`Netatmo`] chains them and reports progress to an injected [`LogSink`].

mod auth;
mod error;
mod log_sink;
mod netatmo;
mod readings;
mod shaping;
mod types;

pub use error::{ConfigError, NetatmoError};
pub use netatmo::*;

pub use auth::authenticator::{AccessToken, Authenticator, TokenGrant};
pub use auth::error::AuthenticationError;
pub use log_sink::{ForwardingLogSink, LogEntry, LogSink, MemoryLogSink};
pub use readings::error::FetchError;
pub use readings::fetcher::{FetchedDevices, ReadingsFetcher, SkippedDevice};
pub use shaping::shaper::{shape_devices, TemperatureSeries};
pub use shaping::summary::{summarize, DeviceSummary};
pub use shaping::warning::ShapeWarning;

pub use types::credentials::{Credentials, Endpoints};
pub use types::frames::temperature_frame::*;
pub use types::pipeline_config::{FetchStrategy, PipelineConfig, TimeWindow};
pub use types::station::{DashboardData, ModuleReading, StationReading};
pub use types::temperature_point::{TemperaturePoint, MAIN_UNIT};
