//! The assembled departure board.

use chrono::NaiveDateTime;

use super::{Crs, RecordError, Service};

/// Counts of records dropped while normalizing one payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkippedRecords {
    pub malformed_time: usize,
    pub unknown_station: usize,
    pub malformed_record: usize,
}

impl SkippedRecords {
    /// Count one dropped record.
    pub fn record(&mut self, err: &RecordError) {
        match err {
            RecordError::MalformedTimeField(_) => self.malformed_time += 1,
            RecordError::UnknownStation(_) => self.unknown_station += 1,
            RecordError::MalformedRecord(_) => self.malformed_record += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.malformed_time + self.unknown_station + self.malformed_record
    }
}

/// Upcoming services from one station to one destination.
///
/// A board is built once per poll and never modified afterwards; it only
/// exposes read accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureBoard {
    generated_at: NaiveDateTime,
    station: Crs,
    station_name: String,
    destination: Crs,
    destination_name: String,
    services: Vec<Service>,
    station_messages: Vec<String>,
    skipped: SkippedRecords,
}

/// Station pair and display names a board was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardHeader {
    pub generated_at: NaiveDateTime,
    pub station: Crs,
    pub station_name: String,
    pub destination: Crs,
    pub destination_name: String,
}

impl DepartureBoard {
    pub fn new(
        header: BoardHeader,
        services: Vec<Service>,
        station_messages: Vec<String>,
        skipped: SkippedRecords,
    ) -> Self {
        Self {
            generated_at: header.generated_at,
            station: header.station,
            station_name: header.station_name,
            destination: header.destination,
            destination_name: header.destination_name,
            services,
            station_messages,
            skipped,
        }
    }

    /// When the provider generated the underlying data.
    pub fn generated_at(&self) -> NaiveDateTime {
        self.generated_at
    }

    pub fn station(&self) -> Crs {
        self.station
    }

    pub fn station_name(&self) -> &str {
        &self.station_name
    }

    pub fn destination(&self) -> Crs {
        self.destination
    }

    pub fn destination_name(&self) -> &str {
        &self.destination_name
    }

    /// Services in departure order.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// The next departure, if any.
    pub fn next_service(&self) -> Option<&Service> {
        self.services.first()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Board-wide advisories, deduplicated.
    pub fn station_messages(&self) -> &[String] {
        &self.station_messages
    }

    pub fn skipped(&self) -> SkippedRecords {
        self.skipped
    }
}
