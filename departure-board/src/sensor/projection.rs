//! Flat sensor view of a departure board.
//!
//! The host shows one sensor per board: a short state string plus a bag of
//! attributes. Projection only reads the board.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::board::BoardQuery;
use crate::domain::{CallingPoint, DepartureBoard, Estimate, Service, ServiceTime};

/// State shown when the board has no services.
pub const NO_DEPARTURES: &str = "No departures";

/// State shown when no board could be built.
pub const UNAVAILABLE: &str = "Unavailable";

/// One sensor as exposed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    /// `{station}_{destination}_{offset}`
    pub unique_id: String,

    /// Display name, e.g. "Trains Manchester Piccadilly to London Paddington
    /// (5m walk)". Station codes stand in until a board has been read.
    pub name: String,

    /// Next departure time, or a status word
    pub state: String,

    pub attributes: SensorAttributes,
}

/// Everything the host displays beyond the state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorAttributes {
    /// When Darwin generated the board, or when the failed poll ran
    pub last_refresh: String,

    pub station_name: String,
    pub destination_name: String,

    /// Minutes needed to reach the station
    pub offset: u32,

    pub station_code: String,
    pub target_station_code: String,

    /// The next service, if any
    pub service: Option<ServiceSummary>,

    /// All services on the board, in departure order
    pub services: Vec<ServiceSummary>,

    /// Calling points of the next service
    pub calling_points: Vec<CallingPointSummary>,

    pub station_messages: Vec<String>,

    /// False when the board could not be built
    pub available: bool,

    /// Why the board is unavailable
    pub error: Option<String>,
}

/// A service on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    /// Darwin service ID (ephemeral)
    pub service_id: String,

    /// Scheduled departure, HH:MM
    pub std: String,

    /// Estimate as boards show it: a time, "On time", "Delayed", ...
    pub etd: String,

    /// Time the train is expected to leave, HH:MM
    pub expected_departure: String,

    /// Machine-readable status
    pub status: ServiceStatus,

    /// Minutes late (negative when early), if a time estimate exists
    pub delay_minutes: Option<i64>,

    pub platform: Option<String>,
    pub operator: String,

    /// Where the train terminates
    pub destination: String,
    pub via: Option<String>,

    /// Scheduled arrival at the configured destination, HH:MM
    pub sta: Option<String>,

    /// Estimated arrival at the configured destination
    pub eta: Option<String>,

    pub messages: Vec<String>,
    pub calling_points: Vec<CallingPointSummary>,
}

/// A stop on a service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallingPointSummary {
    pub crs: String,
    pub location_name: String,

    /// Scheduled time, HH:MM
    pub st: String,

    /// Estimate as boards show it
    pub et: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    OnTime,
    Late,
    Delayed,
    Cancelled,
    NoReport,
}

impl ServiceStatus {
    fn of(times: &ServiceTime) -> Self {
        match times.estimate {
            Estimate::Cancelled => ServiceStatus::Cancelled,
            Estimate::Delayed => ServiceStatus::Delayed,
            Estimate::NoReport => ServiceStatus::NoReport,
            Estimate::OnTime => ServiceStatus::OnTime,
            Estimate::Time(_) if times.is_delayed() => ServiceStatus::Late,
            Estimate::Time(_) => ServiceStatus::OnTime,
        }
    }
}

/// Project a board into its sensor.
pub fn project(board: &DepartureBoard, query: &BoardQuery) -> SensorState {
    let services: Vec<ServiceSummary> = board.services().iter().map(summarize_service).collect();
    let next = services.first().cloned();

    SensorState {
        unique_id: query.unique_id(),
        name: sensor_name(board.station_name(), board.destination_name(), query.time_offset_mins),
        state: board
            .next_service()
            .map(service_state)
            .unwrap_or_else(|| NO_DEPARTURES.to_string()),
        attributes: SensorAttributes {
            last_refresh: format_timestamp(board.generated_at()),
            station_name: board.station_name().to_string(),
            destination_name: board.destination_name().to_string(),
            offset: query.time_offset_mins,
            station_code: board.station().to_string(),
            target_station_code: board.destination().to_string(),
            calling_points: next
                .as_ref()
                .map(|s| s.calling_points.clone())
                .unwrap_or_default(),
            service: next,
            services,
            station_messages: board.station_messages().to_vec(),
            available: true,
            error: None,
        },
    }
}

/// The sensor for a board that could not be built.
///
/// Distinct from an empty board: `available` is false and `error` says why.
pub fn unavailable(query: &BoardQuery, reason: impl Into<String>, refreshed_at: NaiveDateTime) -> SensorState {
    SensorState {
        unique_id: query.unique_id(),
        name: sensor_name(
            query.origin.as_str(),
            query.destination.as_str(),
            query.time_offset_mins,
        ),
        state: UNAVAILABLE.to_string(),
        attributes: SensorAttributes {
            last_refresh: format_timestamp(refreshed_at),
            station_name: query.origin.to_string(),
            destination_name: query.destination.to_string(),
            offset: query.time_offset_mins,
            station_code: query.origin.to_string(),
            target_station_code: query.destination.to_string(),
            service: None,
            services: Vec::new(),
            calling_points: Vec::new(),
            station_messages: Vec::new(),
            available: false,
            error: Some(reason.into()),
        },
    }
}

fn sensor_name(station: &str, destination: &str, walk_mins: u32) -> String {
    let mut name = format!("Trains {station} to {destination}");
    if walk_mins > 0 {
        name.push_str(&format!(" ({walk_mins}m walk)"));
    }
    name
}

/// The headline state: a status word for trains that will not leave on
/// time, otherwise the time to expect.
fn service_state(service: &Service) -> String {
    let times = &service.origin_times;
    match times.estimate {
        Estimate::Cancelled => "Cancelled".to_string(),
        Estimate::Delayed => "Delayed".to_string(),
        Estimate::NoReport | Estimate::OnTime => times.scheduled.to_string(),
        Estimate::Time(t) => t.to_string(),
    }
}

fn summarize_service(service: &Service) -> ServiceSummary {
    let times = &service.origin_times;
    ServiceSummary {
        service_id: service.id.clone(),
        std: times.scheduled.to_string(),
        etd: times.estimate.to_string(),
        expected_departure: times.expected().to_string(),
        status: ServiceStatus::of(times),
        delay_minutes: times.delay_minutes(),
        platform: service.platform.clone(),
        operator: service.operator.clone(),
        destination: service.terminus.clone(),
        via: service.via.clone(),
        sta: service.destination_times.map(|t| t.scheduled.to_string()),
        eta: service.destination_times.map(|t| t.estimate.to_string()),
        messages: service.messages.clone(),
        calling_points: service.calling_points.iter().map(summarize_calling_point).collect(),
    }
}

fn summarize_calling_point(cp: &CallingPoint) -> CallingPointSummary {
    CallingPointSummary {
        crs: cp.station.to_string(),
        location_name: cp.name.clone(),
        st: cp.times.scheduled.to_string(),
        et: cp.times.estimate.to_string(),
    }
}

fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}
