//! This module provides the main entry point: a client that authenticates,
//! fetches station readings and shapes them into a temperature series.

use crate::auth::authenticator::{Authenticator, TokenGrant};
use crate::error::NetatmoError;
use crate::log_sink::{ForwardingLogSink, LogSink};
use crate::readings::fetcher::ReadingsFetcher;
use crate::shaping::shaper::{shape_devices, TemperatureSeries};
use crate::shaping::summary::summarize;
use crate::types::credentials::{Credentials, Endpoints};
use crate::types::pipeline_config::PipelineConfig;
use bon::bon;
use chrono::{DateTime, Utc};
use log::Level;
use std::sync::Arc;

/// The client running the authenticate -> fetch -> shape pipeline.
///
/// Every call to [`Netatmo::temperatures`] is a complete, independent run: a
/// fresh access token is requested and nothing is cached between runs.
///
/// # Examples
///
/// ```no_run
/// # use netatmo_temps::{Credentials, MemoryLogSink, Netatmo, NetatmoError, PipelineConfig, TimeWindow};
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), NetatmoError> {
/// let log = Arc::new(MemoryLogSink::new());
/// let client = Netatmo::builder()
///     .credentials(Credentials::from_env()?)
///     .log_sink(log.clone())
///     .build();
///
/// let series = client
///     .temperatures()
///     .config(PipelineConfig::builder().window(TimeWindow::TrailingDays(7)).build())
///     .call()
///     .await?;
///
/// for point in &series.points {
///     println!("{point}");
/// }
/// for line in log.lines() {
///     println!("{line}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Netatmo {
    authenticator: Authenticator,
    fetcher: ReadingsFetcher,
    log_sink: Arc<dyn LogSink>,
}

#[bon]
impl Netatmo {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `.credentials(Credentials)`: **Required.** App credentials and refresh token.
    /// * `.log_sink(Arc<dyn LogSink>)`: Optional. Where pipeline log lines go. Defaults to
    ///   [`ForwardingLogSink`], i.e. the `log` facade.
    /// * `.endpoints(Endpoints)`: Optional. Defaults to the public Netatmo API.
    /// * `.http_client(reqwest::Client)`: Optional. Shared HTTP client; a new one is created otherwise.
    #[builder]
    pub fn new(
        credentials: Credentials,
        log_sink: Option<Arc<dyn LogSink>>,
        endpoints: Option<Endpoints>,
        http_client: Option<reqwest::Client>,
    ) -> Self {
        let endpoints = endpoints.unwrap_or_default();
        let client = http_client.unwrap_or_default();
        Self {
            authenticator: Authenticator::new(client.clone(), endpoints.token_url, credentials),
            fetcher: ReadingsFetcher::new(client, endpoints.data_url),
            log_sink: log_sink.unwrap_or_else(|| Arc::new(ForwardingLogSink)),
        }
    }

    /// Creates a client from `NETATMO_*` environment variables with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`NetatmoError::Config`] if a variable is missing.
    pub fn from_env() -> Result<Self, NetatmoError> {
        Ok(Self::builder()
            .credentials(Credentials::from_env()?)
            .build())
    }

    /// Runs the whole pipeline once.
    ///
    /// # Arguments
    ///
    /// * `.config(PipelineConfig)`: Optional. Time window and fetch strategy; defaults to all
    ///   current data in a single call.
    /// * `.now(DateTime<Utc>)`: Optional. Reference time for trailing windows; defaults to
    ///   the current time.
    ///
    /// # Returns
    ///
    /// The sorted series. If the readings cannot be fetched the failure is logged and an
    /// empty series is returned, so the caller can render a "no data" state.
    ///
    /// # Errors
    ///
    /// Returns [`NetatmoError::Authentication`] if no access token could be obtained.
    #[builder]
    pub async fn temperatures(
        &self,
        config: Option<PipelineConfig>,
        now: Option<DateTime<Utc>>,
    ) -> Result<TemperatureSeries, NetatmoError> {
        let config = config.unwrap_or_default();
        let now = now.unwrap_or_else(Utc::now);

        let grant = self.authenticate().await?;

        let fetched = match self
            .fetcher
            .fetch(&grant.access_token, config.window, config.strategy, now)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                self.log(Level::Error, &format!("Error fetching station data: {}", e));
                return Ok(TemperatureSeries::default());
            }
        };
        for skipped in &fetched.skipped {
            self.log(
                Level::Warn,
                &format!("Skipped device {}: {}", skipped.device_id, skipped.error),
            );
        }
        self.log(
            Level::Info,
            &format!(
                "Fetched {} device(s) ({})",
                fetched.devices.len(),
                config.window
            ),
        );

        let series = shape_devices(&fetched.devices);
        for warning in &series.warnings {
            self.log(Level::Warn, &warning.to_string());
        }
        for summary in summarize(&series.points) {
            self.log(Level::Info, &summary.to_string());
        }
        if series.is_empty() {
            self.log(Level::Info, "No temperature data available");
        } else {
            self.log(
                Level::Info,
                &format!("Prepared {} temperature point(s)", series.len()),
            );
        }

        Ok(series)
    }

    /// Exchanges the refresh token without fetching anything.
    ///
    /// Useful for picking up a rotated refresh token, see [`TokenGrant::refresh_token`].
    pub async fn authenticate(&self) -> Result<TokenGrant, NetatmoError> {
        match self.authenticator.exchange().await {
            Ok(grant) => Ok(grant),
            Err(e) => {
                self.log(Level::Error, &format!("Authentication failed: {}", e));
                Err(e.into())
            }
        }
    }

    fn log(&self, level: Level, message: &str) {
        self.log_sink.record(level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::MemoryLogSink;
    use crate::types::pipeline_config::{FetchStrategy, TimeWindow};
    use chrono::TimeZone;
    use mockito::Matcher;
    use serde_json::json;

    async fn token_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(r#"{"access_token": "token-1", "refresh_token": "refresh-1", "expires_in": 10800}"#)
            .create_async()
            .await
    }

    fn client(server: &mockito::ServerGuard, sink: Arc<MemoryLogSink>) -> Netatmo {
        Netatmo::builder()
            .credentials(Credentials::new("client-1", "secret-1", "refresh-1"))
            .endpoints(Endpoints::new(
                format!("{}/oauth2/token", server.url()),
                format!("{}/api/getstationsdata", server.url()),
            ))
            .log_sink(sink)
            .build()
    }

    #[tokio::test]
    async fn failed_authentication_is_fatal_and_logged() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth2/token")
            .with_status(401)
            .with_body(r#"{"error": "invalid_client"}"#)
            .create_async()
            .await;
        let data = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let sink = Arc::new(MemoryLogSink::new());
        let result = client(&server, sink.clone()).temperatures().call().await;

        assert!(matches!(result, Err(NetatmoError::Authentication(_))));
        data.assert_async().await;
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::Error);
        assert!(entries[0].message.contains("invalid_client"));
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_empty_series() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let data = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let sink = Arc::new(MemoryLogSink::new());
        let series = client(&server, sink.clone())
            .temperatures()
            .call()
            .await
            .unwrap();

        data.assert_async().await;
        assert!(series.is_empty());
        assert!(sink.lines().iter().any(|line| line.contains("503")));
        assert!(sink
            .entries()
            .iter()
            .any(|e| e.level == Level::Error && e.message.starts_with("Error fetching station data")));
    }

    #[tokio::test]
    async fn logs_warnings_and_summaries() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let body = json!({"body": {"devices": [{
            "_id": "70:ee:50:00:00:01",
            "station_name": "Kitchen",
            "dashboard_data": {"time_utc": 1_700_000_000, "Temperature": 21.5},
            "modules": [
                {"module_name": "Balcony", "dashboard_data": {"time_utc": 1_700_000_060, "Temperature": 14.2}},
                {"module_name": "Rain", "dashboard_data": {"time_utc": 1_700_000_060, "Rain": 0.0}}
            ]
        }]}});
        let data = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let sink = Arc::new(MemoryLogSink::new());
        let series = client(&server, sink.clone())
            .temperatures()
            .config(PipelineConfig {
                window: TimeWindow::TrailingDays(7),
                strategy: FetchStrategy::SingleCall,
            })
            .now(Utc.with_ymd_and_hms(2023, 11, 15, 0, 0, 0).unwrap())
            .call()
            .await
            .unwrap();

        data.assert_async().await;
        assert_eq!(series.len(), 2);
        let messages: Vec<_> = sink.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            [
                "Fetched 1 device(s) (trailing 7 days)",
                "No temperature reported by Kitchen (Rain)",
                "Kitchen: 2 readings, max 21.5°C at 2023-11-14 22:13:20 UTC",
                "Prepared 2 temperature point(s)",
            ]
        );
    }

    #[tokio::test]
    async fn skipped_devices_reach_the_log_sink() {
        let mut server = mockito::Server::new_async().await;
        let _token = token_mock(&mut server).await;
        let listing = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Exact(
                "access_token=token-1&get_favorites=false".into(),
            ))
            .with_status(200)
            .with_body(json!({"body": {"devices": [{"_id": "aa"}, {"_id": "bb"}]}}).to_string())
            .create_async()
            .await;
        let kitchen = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::UrlEncoded("device_id".into(), "aa".into()))
            .with_status(200)
            .with_body(
                json!({"body": {"devices": [{
                    "_id": "aa",
                    "station_name": "Kitchen",
                    "dashboard_data": {"time_utc": 1_700_000_000, "Temperature": 21.5}
                }]}})
                .to_string(),
            )
            .create_async()
            .await;
        let broken = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::UrlEncoded("device_id".into(), "bb".into()))
            .with_status(500)
            .create_async()
            .await;

        let sink = Arc::new(MemoryLogSink::new());
        let series = client(&server, sink.clone())
            .temperatures()
            .config(
                PipelineConfig::builder()
                    .strategy(FetchStrategy::PerDevice)
                    .build(),
            )
            .call()
            .await
            .unwrap();

        listing.assert_async().await;
        kitchen.assert_async().await;
        broken.assert_async().await;
        assert_eq!(series.len(), 1);

        let entries = sink.entries();
        assert_eq!(entries[0].level, Level::Warn);
        assert!(entries[0].message.starts_with("Skipped device bb: "));
        assert!(entries[0].message.contains("500"));
        assert_eq!(entries[1].message, "Fetched 1 device(s) (all current data)");
    }
}
