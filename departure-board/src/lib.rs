//! Live departure board service.
//!
//! Fetches Darwin departure boards, normalizes them into the next
//! departures between a station pair, and serves the result as sensors:
//! "when is my next train to X, and is it on time?"

pub mod board;
pub mod config;
pub mod darwin;
pub mod domain;
pub mod sensor;
pub mod web;
