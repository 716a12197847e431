//! Departure board assembly.
//!
//! Folds converted services into one board: filter to the destination,
//! apply the time window, order, truncate and attach messages.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::darwin::ConvertedBoard;
use crate::domain::{BoardHeader, DepartureBoard, Service};

use super::config::{BoardQuery, WindowConfig};
use super::filter::filter_to_destination;

/// Earliest and latest effective departure a board keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepartureWindow {
    pub earliest: NaiveDateTime,
    pub latest: Option<NaiveDateTime>,
    rollover: Duration,
}

impl DepartureWindow {
    /// The window for `query` as seen at `now`.
    ///
    /// Opens at `now + offset`, less the grace tolerance, and closes
    /// `time_window` later when the window is bounded.
    pub fn new(query: &BoardQuery, window: &WindowConfig, now: NaiveDateTime) -> Self {
        let opens = now + query.time_offset();
        Self {
            earliest: opens - window.grace(),
            latest: window.time_window().map(|w| opens + w),
            rollover: window.rollover(),
        }
    }

    /// The effective departure of `service` as a full date-time.
    ///
    /// The scheduled time is anchored to `now`; a concrete estimate is then
    /// anchored to the scheduled date-time, so a late-evening train running
    /// past midnight lands on the next day.
    pub fn departure_at(&self, service: &Service, now: NaiveDateTime) -> NaiveDateTime {
        let scheduled = service.origin_times.scheduled.anchor(now, self.rollover);
        match service.origin_times.estimate.time() {
            Some(estimate) => estimate.anchor_after(scheduled, self.rollover),
            None => scheduled,
        }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.earliest && self.latest.is_none_or(|latest| at <= latest)
    }
}

/// Build the departure board for `query` from a converted payload.
///
/// Pure: `now` is supplied by the caller and the result depends on nothing
/// else.
pub fn assemble_board(
    converted: ConvertedBoard,
    query: &BoardQuery,
    window: &WindowConfig,
    now: NaiveDateTime,
) -> DepartureBoard {
    let bounds = DepartureWindow::new(query, window, now);
    let received = converted.services.len();

    let mut not_calling = 0usize;
    let mut outside_window = 0usize;

    let mut kept: Vec<(NaiveDateTime, Service)> = Vec::with_capacity(received);
    for service in converted.services {
        let Some(service) = filter_to_destination(service, &query.origin, &query.destination)
        else {
            not_calling += 1;
            continue;
        };

        let departs = bounds.departure_at(&service, now);
        if !bounds.contains(departs) {
            outside_window += 1;
            continue;
        }

        kept.push((departs, service));
    }

    kept.sort_by(|(a_at, a), (b_at, b)| a_at.cmp(b_at).then_with(|| a.id.cmp(&b.id)));
    kept.truncate(query.max_results);

    let destination_name = converted
        .filter_location_name
        .clone()
        .or_else(|| {
            kept.iter()
                .find_map(|(_, s)| s.calling_at(&query.destination))
                .map(|cp| cp.name.clone())
        })
        .unwrap_or_else(|| query.destination.to_string());

    let header = BoardHeader {
        generated_at: converted.generated_at.unwrap_or(now),
        station: query.origin,
        station_name: converted
            .location_name
            .clone()
            .unwrap_or_else(|| query.origin.to_string()),
        destination: query.destination,
        destination_name,
    };

    let services: Vec<Service> = kept.into_iter().map(|(_, s)| s).collect();

    debug!(
        board = %query.unique_id(),
        received,
        kept = services.len(),
        not_calling,
        outside_window,
        skipped = converted.skipped.total(),
        "assembled departure board"
    );

    DepartureBoard::new(
        header,
        services,
        dedup_messages(converted.station_messages),
        converted.skipped,
    )
}

/// Remove repeated messages, keeping the first occurrence of each.
fn dedup_messages(messages: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(messages.len());
    for message in messages {
        if !unique.contains(&message) {
            unique.push(message);
        }
    }
    unique
}
