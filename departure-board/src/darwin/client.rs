//! Darwin LDB HTTP client.
//!
//! Queries the Darwin Live Departure Boards API and hands back the response
//! body as raw JSON. Interpreting it is left to [`super::convert`] so that a
//! payload problem is reported by the board layer, not the network layer.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::board::BoardQuery;

use super::error::DarwinError;
use super::source::BoardSource;

/// Default base URL for Darwin LDB API.
const DEFAULT_BASE_URL: &str =
    "https://api1.raildata.org.uk/1010-live-departure-board-dep1_2/LDBWS";

/// Boards fetched at once unless configured otherwise.
const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// A board request that takes longer than this is treated as failed; the
/// next poll will try again.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fewest rows to ask for. The board is trimmed after filtering, so asking
/// for only `max_results` rows would leave short boards.
const MIN_ROWS: usize = 10;

/// Darwin's limits on `numRows` and `timeOffset`.
const MAX_ROWS: usize = 150;
const MAX_TIME_OFFSET: u32 = 119;

/// How much of an error body to keep in a [`DarwinError::Status`].
const ERROR_DETAIL_CHARS: usize = 200;

/// How the client talks to Darwin.
#[derive(Debug, Clone)]
pub struct DarwinConfig {
    api_key: String,
    base_url: String,
    max_in_flight: usize,
    timeout: Duration,
}

impl DarwinConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point at another LDBWS deployment, such as a local stub.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Boards allowed in flight at once. Never less than one.
    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Darwin LDB API client.
///
/// A semaphore caps how many boards are in flight when several
/// destinations are polled on the same tick.
#[derive(Debug, Clone)]
pub struct DarwinClient {
    http: reqwest::Client,
    base_url: String,
    in_flight: Arc<Semaphore>,
}

impl DarwinClient {
    pub fn new(config: DarwinConfig) -> Result<Self, DarwinError> {
        let mut api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| DarwinError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        let http = reqwest::Client::builder()
            .default_headers(HeaderMap::from_iter([(
                HeaderName::from_static("x-apikey"),
                api_key,
            )]))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            in_flight: Arc::new(Semaphore::new(config.max_in_flight)),
        })
    }

    /// Get the departure board for `query.origin`, filtered by Darwin to
    /// services calling at `query.destination`.
    ///
    /// # Arguments
    ///
    /// * `query` - Station pair, offset and result count
    /// * `time_window` - Minutes past the offset to include (0 to 120)
    pub async fn get_departures_to(
        &self,
        query: &BoardQuery,
        time_window: u16,
    ) -> Result<Value, DarwinError> {
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| DarwinError::Closed)?;

        let url = board_url(&self.base_url, query);
        debug!(%url, destination = %query.destination, "requesting departure board");

        let response = self
            .http
            .get(&url)
            .query(&query_params(query, time_window))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DarwinError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DarwinError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DarwinError::Status {
                origin: query.origin,
                status: status.as_u16(),
                detail: body.chars().take(ERROR_DETAIL_CHARS).collect(),
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            debug!(origin = %query.origin, body = %body.chars().take(ERROR_DETAIL_CHARS).collect::<String>(), "unreadable board body");
            DarwinError::InvalidBody {
                origin: query.origin,
                reason: e.to_string(),
            }
        })
    }
}

impl BoardSource for DarwinClient {
    async fn fetch_board(&self, query: &BoardQuery, time_window: u16) -> Result<Value, DarwinError> {
        self.get_departures_to(query, time_window).await
    }
}

fn board_url(base_url: &str, query: &BoardQuery) -> String {
    format!(
        "{}/api/20220120/GetDepBoardWithDetails/{}",
        base_url.trim_end_matches('/'),
        query.origin.as_str()
    )
}

fn query_params(query: &BoardQuery, time_window: u16) -> Vec<(&'static str, String)> {
    let num_rows = query.max_results.clamp(MIN_ROWS, MAX_ROWS);
    vec![
        ("numRows", num_rows.to_string()),
        (
            "timeOffset",
            query.time_offset_mins.min(MAX_TIME_OFFSET).to_string(),
        ),
        ("timeWindow", time_window.min(120).to_string()),
        ("filterCrs", query.destination.as_str().to_string()),
        ("filterType", "to".to_string()),
    ]
}
