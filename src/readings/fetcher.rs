//! Retrieval of raw station readings from `getstationsdata`.

use crate::auth::authenticator::AccessToken;
use crate::readings::error::FetchError;
use crate::types::pipeline_config::{FetchStrategy, TimeWindow};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<i64>,
    message: Option<String>,
}

impl From<ApiError> for FetchError {
    fn from(error: ApiError) -> Self {
        FetchError::Api {
            code: error.code.unwrap_or_default(),
            message: error.message.unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}

/// Raw `body.devices` entries plus the stations that had to be left out.
#[derive(Debug, Default)]
pub struct FetchedDevices {
    pub devices: Vec<Value>,
    /// Stations whose own per-device request failed. Always empty for
    /// [`FetchStrategy::SingleCall`].
    pub skipped: Vec<SkippedDevice>,
}

#[derive(Debug)]
pub struct SkippedDevice {
    pub device_id: String,
    pub error: FetchError,
}

pub struct ReadingsFetcher {
    client: Client,
    data_url: String,
}

impl ReadingsFetcher {
    pub fn new(client: Client, data_url: impl Into<String>) -> Self {
        Self {
            client,
            data_url: data_url.into(),
        }
    }

    /// Fetches the raw `body.devices` entries for every station on the account.
    ///
    /// Devices are returned as untyped JSON so that decoding, and skipping
    /// malformed records, is left to the shaper.
    ///
    /// # Errors
    ///
    /// Fails if the first (listing) request fails. Failures of individual
    /// per-device requests are reported in [`FetchedDevices::skipped`] instead.
    pub async fn fetch(
        &self,
        token: &AccessToken,
        window: TimeWindow,
        strategy: FetchStrategy,
        now: DateTime<Utc>,
    ) -> Result<FetchedDevices, FetchError> {
        let bounds = window.bounds(now);
        info!("Fetching station data ({}, {})", window, strategy);

        let listed = self.request(token, bounds, None).await?;
        match strategy {
            FetchStrategy::SingleCall => Ok(FetchedDevices {
                devices: listed,
                skipped: Vec::new(),
            }),
            FetchStrategy::PerDevice => Ok(self.fetch_each(token, bounds, listed).await),
        }
    }

    /// Re-requests every listed station by id. A station whose own request
    /// fails is dropped; stations without an id are kept from the listing.
    async fn fetch_each(
        &self,
        token: &AccessToken,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
        listed: Vec<Value>,
    ) -> FetchedDevices {
        let mut fetched = FetchedDevices {
            devices: Vec::with_capacity(listed.len()),
            skipped: Vec::new(),
        };
        for device in listed {
            let device_id = device.get("_id").and_then(Value::as_str).map(str::to_owned);
            let Some(device_id) = device_id else {
                fetched.devices.push(device);
                continue;
            };
            match self.request(token, bounds, Some(&device_id)).await {
                Ok(found) => fetched.devices.extend(found),
                Err(error) => {
                    debug!("Request for device {} failed: {}", device_id, error);
                    fetched.skipped.push(SkippedDevice { device_id, error });
                }
            }
        }
        fetched
    }

    async fn request(
        &self,
        token: &AccessToken,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
        device_id: Option<&str>,
    ) -> Result<Vec<Value>, FetchError> {
        let url = self.data_url.clone();
        let query = build_query(token, bounds, device_id);
        debug!("GET {} (device: {})", url, device_id.unwrap_or("all"));

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.as_str())
            .query(&query)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;

        if let Ok(ApiErrorBody { error }) = serde_json::from_str::<ApiErrorBody>(&body) {
            warn!("Netatmo returned an error object with status {}", status);
            return Err(error.into());
        }
        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
            return Err(FetchError::HttpStatus { url, status });
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(url.clone(), e))?;
        extract_devices(payload).ok_or(FetchError::MissingDevices(url))
    }
}

fn build_query(
    token: &AccessToken,
    bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    device_id: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("access_token", token.as_str().to_string()),
        ("get_favorites", "false".to_string()),
    ];
    if let Some((begin, end)) = bounds {
        query.push(("date_begin", begin.timestamp().to_string()));
        query.push(("date_end", end.timestamp().to_string()));
    }
    if let Some(id) = device_id {
        query.push(("device_id", id.to_string()));
    }
    query
}

fn extract_devices(mut payload: Value) -> Option<Vec<Value>> {
    match payload.pointer_mut("/body/devices")?.take() {
        Value::Array(devices) => Some(devices),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;
    use serde_json::json;

    fn token() -> AccessToken {
        AccessToken::new("token-1")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap()
    }

    fn devices_body(devices: Value) -> String {
        json!({"status": "ok", "body": {"devices": devices, "user": {}}}).to_string()
    }

    #[tokio::test]
    async fn single_call_returns_devices() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("access_token".into(), "token-1".into()),
                Matcher::UrlEncoded("get_favorites".into(), "false".into()),
            ]))
            .match_header("authorization", "Bearer token-1")
            .with_status(200)
            .with_body(devices_body(json!([{"_id": "a"}, {"_id": "b"}])))
            .create_async()
            .await;

        let fetcher =
            ReadingsFetcher::new(Client::new(), format!("{}/api/getstationsdata", server.url()));
        let devices = fetcher
            .fetch(&token(), TimeWindow::All, FetchStrategy::SingleCall, now())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(devices.devices.len(), 2);
        assert_eq!(devices.devices[1]["_id"], "b");
        assert!(devices.skipped.is_empty());
    }

    #[tokio::test]
    async fn trailing_window_sends_unix_bounds() {
        let mut server = mockito::Server::new_async().await;
        let end = now().timestamp();
        let begin = end - 7 * 24 * 3600;
        let mock = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("date_begin".into(), begin.to_string()),
                Matcher::UrlEncoded("date_end".into(), end.to_string()),
            ]))
            .with_status(200)
            .with_body(devices_body(json!([])))
            .create_async()
            .await;

        let fetcher =
            ReadingsFetcher::new(Client::new(), format!("{}/api/getstationsdata", server.url()));
        let devices = fetcher
            .fetch(
                &token(),
                TimeWindow::TrailingDays(7),
                FetchStrategy::SingleCall,
                now(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(devices.devices.is_empty());
    }

    #[tokio::test]
    async fn per_device_requests_each_station_and_skips_failures() {
        let mut server = mockito::Server::new_async().await;
        let listing = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Regex("^access_token=token-1&get_favorites=false$".into()))
            .with_status(200)
            .with_body(devices_body(json!([
                {"_id": "aa"},
                {"_id": "bb"},
                {"station_name": "no id"}
            ])))
            .create_async()
            .await;
        let first = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::UrlEncoded("device_id".into(), "aa".into()))
            .with_status(200)
            .with_body(devices_body(json!([{"_id": "aa", "station_name": "Kitchen"}])))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::UrlEncoded("device_id".into(), "bb".into()))
            .with_status(500)
            .create_async()
            .await;

        let fetcher =
            ReadingsFetcher::new(Client::new(), format!("{}/api/getstationsdata", server.url()));
        let fetched = fetcher
            .fetch(&token(), TimeWindow::All, FetchStrategy::PerDevice, now())
            .await
            .unwrap();

        listing.assert_async().await;
        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(fetched.devices.len(), 2);
        assert_eq!(fetched.devices[0]["station_name"], "Kitchen");
        assert_eq!(fetched.devices[1]["station_name"], "no id");

        assert_eq!(fetched.skipped.len(), 1);
        assert_eq!(fetched.skipped[0].device_id, "bb");
        assert!(matches!(
            &fetched.skipped[0].error,
            FetchError::HttpStatus { status, .. } if status.as_u16() == 500
        ));
    }

    async fn fetch_single(server: &mockito::ServerGuard) -> Result<FetchedDevices, FetchError> {
        ReadingsFetcher::new(Client::new(), format!("{}/api/getstationsdata", server.url()))
            .fetch(&token(), TimeWindow::All, FetchStrategy::SingleCall, now())
            .await
    }

    #[tokio::test]
    async fn api_error_object_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error": {"code": 3, "message": "Access token expired"}}"#)
            .create_async()
            .await;

        let result = fetch_single(&server).await;
        mock.assert_async().await;
        match result {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, 3);
                assert_eq!(message, "Access token expired");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn api_error_object_with_ok_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": {"code": 9, "message": "Device not found"}}"#)
            .create_async()
            .await;

        let result = fetch_single(&server).await;
        mock.assert_async().await;
        match result {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, 9);
                assert_eq!(message, "Device not found");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn status_error_without_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let result = fetch_single(&server).await;
        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::HttpStatus { status, .. }) if status.as_u16() == 502));
    }

    #[tokio::test]
    async fn payload_without_devices_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/getstationsdata")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "ok", "body": {}}"#)
            .create_async()
            .await;

        let result = fetch_single(&server).await;
        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::MissingDevices(_))));
    }

    #[test]
    fn query_includes_optional_parameters() {
        let bounds = Some((now() - chrono::Duration::days(1), now()));
        let query = build_query(&token(), bounds, Some("aa"));
        let keys: Vec<_> = query.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["access_token", "get_favorites", "date_begin", "date_end", "device_id"]
        );
    }
}
