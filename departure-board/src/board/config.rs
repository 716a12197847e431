//! Board query and window configuration.

use chrono::Duration;

use crate::domain::Crs;

/// One board to build: services from `origin` that call at `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardQuery {
    /// Station the services depart from.
    pub origin: Crs,

    /// Station the services must call at.
    pub destination: Crs,

    /// Services departing sooner than this are not relevant (minutes).
    /// Typically the walk to the station.
    pub time_offset_mins: u32,

    /// Maximum number of services on the board. Always at least 1.
    pub max_results: usize,
}

impl BoardQuery {
    /// Query with no offset and the default result count.
    pub fn new(origin: Crs, destination: Crs) -> Self {
        Self {
            origin,
            destination,
            time_offset_mins: 0,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_time_offset(mut self, mins: u32) -> Self {
        self.time_offset_mins = mins;
        self
    }

    /// Set the result count; zero is raised to one.
    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n.max(1);
        self
    }

    /// Returns the offset as a Duration.
    pub fn time_offset(&self) -> Duration {
        Duration::minutes(i64::from(self.time_offset_mins))
    }

    /// Stable identifier of the sensor fed by this query.
    pub fn unique_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.origin, self.destination, self.time_offset_mins
        )
    }
}

const DEFAULT_MAX_RESULTS: usize = 10;

/// Tuning for which services fall inside the board's time window.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    /// Services that left up to this long before "now + offset" are kept
    /// (minutes). Covers boards generated slightly before they are read.
    pub grace_mins: i64,

    /// A scheduled time more than this far behind "now" is taken to be
    /// tomorrow (hours).
    pub rollover_hours: i64,

    /// How far past "now + offset" to look (minutes). `None` keeps
    /// everything the provider sent.
    pub time_window_mins: Option<i64>,
}

impl WindowConfig {
    pub fn new(grace_mins: i64, rollover_hours: i64, time_window_mins: Option<i64>) -> Self {
        Self {
            grace_mins,
            rollover_hours,
            time_window_mins,
        }
    }

    /// Returns the grace tolerance as a Duration.
    pub fn grace(&self) -> Duration {
        Duration::minutes(self.grace_mins)
    }

    /// Returns the rollover threshold as a Duration.
    pub fn rollover(&self) -> Duration {
        Duration::hours(self.rollover_hours)
    }

    /// Returns the time window as a Duration, if bounded.
    pub fn time_window(&self) -> Option<Duration> {
        self.time_window_mins.map(Duration::minutes)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            grace_mins: 2,
            rollover_hours: 6,
            time_window_mins: Some(120), // 2 hours, Darwin's maximum
        }
    }
}
