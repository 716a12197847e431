//! Periodic board refresh.
//!
//! Each tick fetches every configured board concurrently, builds and
//! projects it, and swaps the results into the shared [`SensorStore`].

use std::sync::Arc;

use chrono::NaiveDateTime;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::board::{BoardQuery, WindowConfig, build_departure_board};
use crate::config::ServiceHours;
use crate::darwin::BoardSource;
use crate::domain::Crs;

use super::projection::{SensorState, project, unavailable};

/// Reason reported while the poller is idle overnight.
pub const OUTSIDE_SERVICE_HOURS: &str = "outside service hours";

/// Reason reported before the first refresh completes.
pub const NOT_YET_REFRESHED: &str = "waiting for first refresh";

/// A sensor together with the query that feeds it.
#[derive(Debug, Clone)]
pub struct SensorEntry {
    pub query: BoardQuery,
    pub sensor: SensorState,
}

/// Latest sensor states, shared between the poller and the web layer.
#[derive(Debug, Clone, Default)]
pub struct SensorStore {
    entries: Arc<RwLock<Vec<SensorEntry>>>,
}

impl SensorStore {
    /// A store with every query marked as not yet refreshed.
    pub fn new(queries: &[BoardQuery], now: NaiveDateTime) -> Self {
        let entries = queries
            .iter()
            .map(|query| SensorEntry {
                query: query.clone(),
                sensor: unavailable(query, NOT_YET_REFRESHED, now),
            })
            .collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// All sensors in configuration order.
    pub async fn all(&self) -> Vec<SensorState> {
        let entries = self.entries.read().await;
        entries.iter().map(|e| e.sensor.clone()).collect()
    }

    /// The sensor for a station pair, if one is configured.
    pub async fn get(&self, origin: &Crs, destination: &Crs) -> Option<SensorState> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|e| e.query.origin == *origin && e.query.destination == *destination)
            .map(|e| e.sensor.clone())
    }

    async fn replace(&self, entries: Vec<SensorEntry>) {
        *self.entries.write().await = entries;
    }
}

/// Refreshes every configured board from a [`BoardSource`].
pub struct Poller<S> {
    source: S,
    queries: Vec<BoardQuery>,
    window: WindowConfig,
    service_hours: ServiceHours,
    store: SensorStore,
}

impl<S: BoardSource + Sync> Poller<S> {
    pub fn new(
        source: S,
        queries: Vec<BoardQuery>,
        window: WindowConfig,
        service_hours: ServiceHours,
        store: SensorStore,
    ) -> Self {
        Self {
            source,
            queries,
            window,
            service_hours,
            store,
        }
    }

    /// Refresh every board as of `now` and publish the results.
    pub async fn poll_once(&self, now: NaiveDateTime) -> Vec<SensorState> {
        let polls = self.queries.iter().map(|query| self.poll_query(query, now));
        let sensors = join_all(polls).await;

        let entries = self
            .queries
            .iter()
            .cloned()
            .zip(sensors.iter().cloned())
            .map(|(query, sensor)| SensorEntry { query, sensor })
            .collect();
        self.store.replace(entries).await;

        sensors
    }

    async fn poll_query(&self, query: &BoardQuery, now: NaiveDateTime) -> SensorState {
        if !self.service_hours.contains(now) {
            debug!(board = %query.unique_id(), "outside service hours, not polling");
            return unavailable(query, OUTSIDE_SERVICE_HOURS, now);
        }

        let payload = match self.source.fetch_board(query, self.time_window()).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(board = %query.unique_id(), error = %e, "failed to fetch departure board");
                return unavailable(query, e.to_string(), now);
            }
        };

        match build_departure_board(&payload, query, &self.window, now) {
            Ok(board) => {
                debug!(
                    board = %query.unique_id(),
                    services = board.services().len(),
                    "refreshed departure board"
                );
                project(&board, query)
            }
            Err(e) => {
                warn!(board = %query.unique_id(), error = %e, "unusable departure board");
                unavailable(query, e.to_string(), now)
            }
        }
    }

    /// The window passed to the provider, in Darwin's 0-120 range.
    fn time_window(&self) -> u16 {
        self.window
            .time_window_mins
            .map(|mins| mins.clamp(0, 120) as u16)
            .unwrap_or(120)
    }

    /// Poll forever, once per `every`, reading the local clock each tick.
    pub async fn run(self, every: std::time::Duration) {
        info!(
            boards = self.queries.len(),
            every_secs = every.as_secs(),
            "starting departure board poller"
        );

        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let now = chrono::Local::now().naive_local();
            let sensors = self.poll_once(now).await;
            let available = sensors.iter().filter(|s| s.attributes.available).count();
            debug!(available, total = sensors.len(), "poll complete");
        }
    }
}
