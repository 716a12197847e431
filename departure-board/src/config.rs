//! Service configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;

use crate::board::{BoardQuery, WindowConfig};
use crate::domain::Crs;

/// Configuration errors, reported at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Hours of the day during which boards are polled.
///
/// `start` is inclusive, `end` exclusive, so the default 5-23 polls from
/// 05:00 until 22:59. A range with `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHours {
    pub start: u32,
    pub end: u32,
}

impl ServiceHours {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Parse `"start-end"`, both hours in 0..=24.
    pub fn parse(s: &str) -> Option<Self> {
        let (start, end) = s.trim().split_once('-')?;
        let start: u32 = start.trim().parse().ok()?;
        let end: u32 = end.trim().parse().ok()?;
        if start > 24 || end > 24 {
            return None;
        }
        Some(Self { start, end })
    }

    /// Always polling.
    pub fn all_day() -> Self {
        Self { start: 0, end: 24 }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        let hour = at.hour();
        if self.start <= self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

impl Default for ServiceHours {
    fn default() -> Self {
        Self { start: 5, end: 23 }
    }
}

/// Everything the service needs to run.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Darwin API key; not needed when serving static data
    pub api_key: Option<String>,

    /// Board station
    pub station: Crs,

    /// One sensor per destination
    pub destinations: Vec<Crs>,

    /// Minutes to reach the station
    pub time_offset_mins: u32,

    /// Minutes past the offset to show
    pub time_window_mins: u16,

    /// Services per board
    pub num_services: usize,

    /// Seconds between polls
    pub refresh_secs: u64,

    pub service_hours: ServiceHours,

    pub bind_addr: SocketAddr,

    /// JSON file (or directory of `{CRS}.json`) served instead of the API
    pub static_data: Option<PathBuf>,
}

const DEFAULT_TIME_WINDOW: u16 = 120;
const DEFAULT_NUM_SERVICES: usize = 10;
const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

impl BoardConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let static_data = get("BOARD_STATIC_DATA").map(PathBuf::from);
        let api_key = get("DARWIN_API_KEY");
        if api_key.is_none() && static_data.is_none() {
            return Err(ConfigError::Missing("DARWIN_API_KEY"));
        }

        let station_text = get("BOARD_STATION").ok_or(ConfigError::Missing("BOARD_STATION"))?;
        let station = parse_crs("BOARD_STATION", &station_text)?;

        let destinations_text =
            get("BOARD_DESTINATIONS").ok_or(ConfigError::Missing("BOARD_DESTINATIONS"))?;
        let mut destinations = Vec::new();
        for code in destinations_text.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            let crs = parse_crs("BOARD_DESTINATIONS", code)?;
            if !destinations.contains(&crs) {
                destinations.push(crs);
            }
        }
        if destinations.is_empty() {
            return Err(ConfigError::Missing("BOARD_DESTINATIONS"));
        }

        let time_offset_mins = parse_or("BOARD_TIME_OFFSET", get("BOARD_TIME_OFFSET"), 0u32)?;

        let time_window_mins =
            parse_or("BOARD_TIME_WINDOW", get("BOARD_TIME_WINDOW"), DEFAULT_TIME_WINDOW)?;
        if time_window_mins == 0 || time_window_mins > 120 {
            return Err(invalid("BOARD_TIME_WINDOW", "must be between 1 and 120"));
        }

        let num_services =
            parse_or("BOARD_NUM_SERVICES", get("BOARD_NUM_SERVICES"), DEFAULT_NUM_SERVICES)?;
        if num_services == 0 {
            return Err(invalid("BOARD_NUM_SERVICES", "must be at least 1"));
        }

        let refresh_secs =
            parse_or("BOARD_REFRESH_SECS", get("BOARD_REFRESH_SECS"), DEFAULT_REFRESH_SECS)?;
        if refresh_secs == 0 {
            return Err(invalid("BOARD_REFRESH_SECS", "must be at least 1"));
        }

        let service_hours = match get("BOARD_SERVICE_HOURS") {
            Some(text) => ServiceHours::parse(&text)
                .ok_or_else(|| invalid("BOARD_SERVICE_HOURS", "expected start-end, e.g. 5-23"))?,
            None => ServiceHours::default(),
        };

        let bind_addr: SocketAddr = get("BOARD_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| invalid("BOARD_BIND_ADDR", format!("{e}")))?;

        Ok(Self {
            api_key,
            station,
            destinations,
            time_offset_mins,
            time_window_mins,
            num_services,
            refresh_secs,
            service_hours,
            bind_addr,
            static_data,
        })
    }

    /// One query per configured destination.
    pub fn queries(&self) -> Vec<BoardQuery> {
        self.destinations
            .iter()
            .map(|&destination| {
                BoardQuery::new(self.station, destination)
                    .with_time_offset(self.time_offset_mins)
                    .with_max_results(self.num_services)
            })
            .collect()
    }

    /// Window tuning with the configured time window.
    pub fn window(&self) -> WindowConfig {
        WindowConfig {
            time_window_mins: Some(i64::from(self.time_window_mins)),
            ..WindowConfig::default()
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

fn parse_crs(var: &'static str, text: &str) -> Result<Crs, ConfigError> {
    Crs::parse_normalized(text).map_err(|e| invalid(var, e.to_string()))
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(text) => text.trim().parse().map_err(|e| invalid(var, format!("{e}"))),
        None => Ok(default),
    }
}

fn invalid(var: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: message.into(),
    }
}
