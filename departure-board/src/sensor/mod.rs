//! Sensors: the host-facing view of departure boards.
//!
//! [`projection`] flattens one board into a sensor; [`Poller`] keeps every
//! configured sensor up to date in a [`SensorStore`].

mod poller;
mod projection;

pub use poller::{NOT_YET_REFRESHED, OUTSIDE_SERVICE_HOURS, Poller, SensorEntry, SensorStore};
pub use projection::{
    CallingPointSummary, NO_DEPARTURES, SensorAttributes, SensorState, ServiceStatus,
    ServiceSummary, UNAVAILABLE, project, unavailable,
};
