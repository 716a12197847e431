//! Services and their calling points.

use super::{Crs, ServiceTime, TimePoint};

/// A station stop on a service, after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallingPoint {
    /// Station CRS code
    pub station: Crs,
    /// Station display name
    pub name: String,
    /// Scheduled and estimated time at this stop
    pub times: ServiceTime,
}

impl CallingPoint {
    pub fn new(station: Crs, name: impl Into<String>, times: ServiceTime) -> Self {
        Self {
            station,
            name: name.into(),
            times,
        }
    }
}

/// A train service departing the board station.
///
/// `calling_points` are the stops after the board station, in journey order
/// as the provider listed them. A train that divides carries the stops of its
/// other portions in `other_portions`. `destination_times` is only filled in
/// once the service has been matched against a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Darwin service ID (ephemeral)
    pub id: String,
    /// Train operating company name
    pub operator: String,
    /// Platform at the board station, if published
    pub platform: Option<String>,
    /// Where the train terminates, for display ("Bristol Temple Meads")
    pub terminus: String,
    /// "via" text attached to the terminus
    pub via: Option<String>,
    /// Departure from the board station
    pub origin_times: ServiceTime,
    /// Arrival at the configured destination
    pub destination_times: Option<ServiceTime>,
    pub calling_points: Vec<CallingPoint>,
    /// Stops of the portions that divide off, in provider order
    pub other_portions: Vec<Vec<CallingPoint>>,
    /// Service-level advisories (cancellation and delay reasons, alerts)
    pub messages: Vec<String>,
}

impl Service {
    /// The departure time that decides where this service sits on the board.
    pub fn effective_departure(&self) -> TimePoint {
        self.origin_times.expected()
    }

    /// Returns the first calling point at `station`, if the service calls there.
    pub fn calling_at(&self, station: &Crs) -> Option<&CallingPoint> {
        self.calling_points.iter().find(|cp| cp.station == *station)
    }

    /// Make the portion that reaches `station` the one in `calling_points`.
    ///
    /// Returns false, leaving the service unchanged, when no portion calls
    /// there.
    pub fn follow_portion_to(&mut self, station: &Crs) -> bool {
        if self.calling_at(station).is_some() {
            return true;
        }
        let Some(idx) = self
            .other_portions
            .iter()
            .position(|portion| portion.iter().any(|cp| cp.station == *station))
        else {
            return false;
        };
        std::mem::swap(&mut self.calling_points, &mut self.other_portions[idx]);
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.origin_times.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Estimate;

    fn tp(s: &str) -> TimePoint {
        TimePoint::parse_hhmm(s).unwrap()
    }

    fn crs(s: &str) -> Crs {
        Crs::parse(s).unwrap()
    }

    fn service() -> Service {
        Service {
            id: "svc".to_string(),
            operator: "Avanti West Coast".to_string(),
            platform: Some("5".to_string()),
            terminus: "London Euston".to_string(),
            via: None,
            origin_times: ServiceTime::new(tp("10:00"), Estimate::Time(tp("10:04"))),
            destination_times: None,
            calling_points: vec![
                CallingPoint::new(crs("SOT"), "Stoke-on-Trent", ServiceTime::new(tp("10:36"), Estimate::OnTime)),
                CallingPoint::new(crs("EUS"), "London Euston", ServiceTime::new(tp("12:08"), Estimate::OnTime)),
            ],
            other_portions: Vec::new(),
            messages: Vec::new(),
        }
    }

    #[test]
    fn effective_departure_prefers_estimate() {
        assert_eq!(service().effective_departure(), tp("10:04"));
    }

    #[test]
    fn calling_at_finds_stop() {
        let s = service();
        assert_eq!(s.calling_at(&crs("EUS")).unwrap().name, "London Euston");
        assert!(s.calling_at(&crs("PAD")).is_none());
    }

    #[test]
    fn follows_portion_that_reaches_station() {
        let mut s = service();
        s.other_portions = vec![vec![CallingPoint::new(
            crs("CRE"),
            "Crewe",
            ServiceTime::new(tp("10:50"), Estimate::OnTime),
        )]];

        assert!(s.follow_portion_to(&crs("EUS")));
        assert_eq!(s.calling_points[0].station, crs("SOT"));

        assert!(s.follow_portion_to(&crs("CRE")));
        assert_eq!(s.calling_points.len(), 1);
        assert_eq!(s.calling_points[0].name, "Crewe");
        assert_eq!(s.other_portions[0][1].station, crs("EUS"));

        assert!(!s.follow_portion_to(&crs("PAD")));
        assert_eq!(s.calling_points[0].station, crs("CRE"));
    }

    #[test]
    fn cancellation_follows_origin_estimate() {
        let mut s = service();
        assert!(!s.is_cancelled());
        s.origin_times.estimate = Estimate::Cancelled;
        assert!(s.is_cancelled());
    }
}
