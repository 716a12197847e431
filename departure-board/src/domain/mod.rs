//! Domain types for departure boards.
//!
//! This module contains the normalized model that the rest of the crate
//! works with. Types enforce their invariants at construction time, so code
//! receiving them does not need to re-validate provider data.

mod board;
mod error;
mod service;
mod service_time;
mod station;
mod time;

pub use board::{BoardHeader, DepartureBoard, SkippedRecords};
pub use error::{BoardError, RecordError};
pub use service::{CallingPoint, Service};
pub use service_time::{Estimate, ServiceTime};
pub use station::{Crs, InvalidCrs};
pub use time::{TimeError, TimePoint};
