//! Departure board building.
//!
//! This module is the normalization pipeline: it takes one raw payload and
//! produces the [`DepartureBoard`] for a station pair. It does no I/O and
//! reads no clock; "now" is always passed in.
//!
//! Record-level problems (a service with no scheduled time, a stop with no
//! station code) drop that record and are counted on the board. Only a
//! payload that is not a departure board fails the whole build.

mod assemble;
mod config;
mod filter;


use chrono::NaiveDateTime;
use serde_json::Value;

use crate::darwin::{convert_payload, parse_payload};
use crate::domain::{BoardError, DepartureBoard};

pub use assemble::{DepartureWindow, assemble_board};
pub use config::{BoardQuery, WindowConfig};
pub use filter::filter_to_destination;

/// Build the board for `query` from a parsed payload.
///
/// # Errors
///
/// Returns [`BoardError::ProviderPayload`] when the payload is `null`, not
/// an object, or has no `trainServices` field. An empty board is not an
/// error.
pub fn build_departure_board(
    payload: &Value,
    query: &BoardQuery,
    window: &WindowConfig,
    now: NaiveDateTime,
) -> Result<DepartureBoard, BoardError> {
    let converted = convert_payload(payload)?;
    Ok(assemble_board(converted, query, window, now))
}

/// Build the board for `query` from an unparsed response body.
pub fn build_departure_board_from_str(
    body: &str,
    query: &BoardQuery,
    window: &WindowConfig,
    now: NaiveDateTime,
) -> Result<DepartureBoard, BoardError> {
    let payload = parse_payload(body)?;
    build_departure_board(&payload, query, window, now)
}
