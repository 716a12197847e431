//! Darwin LDB (Live Departure Boards) input layer.
//!
//! This module fetches raw departure boards and turns them into domain
//! types.
//!
//! Key characteristics of Darwin payloads:
//! - Times are in "HH:MM" format (UK local time) with no date
//! - Estimates are either a time or a status word ("On time", "Delayed",
//!   "Cancelled", "No report")
//! - Field names differ between the current JSON API and older bridges,
//!   and single-element lists are sometimes sent bare
//! - `GetDepBoardWithDetails` returns calling points inline

mod client;
mod convert;
mod error;
mod reconcile;
mod source;
mod types;

pub use client::{DarwinClient, DarwinConfig};
pub use convert::{
    ConvertedBoard, ConvertedService, build_calling_points, convert_payload, convert_service,
    parse_payload,
};
pub use error::DarwinError;
pub use reconcile::{Naming, naming, reconcile};
pub use source::{AnySource, BoardSource, StaticBoardSource};
pub use types::{
    ArrayOfCallingPoints, MessageText, NrccMessages, OneOrMany, RawBoard, RawCallingPoint,
    RawService, RawTimeFields, ServiceLocation,
};
