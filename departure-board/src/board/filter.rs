//! Destination filtering.

use crate::domain::{Crs, Service};

/// Keep `service` only if it takes you from `origin` to `destination`.
///
/// The service must list `destination` among its calling points; the
/// matching stop's times become `destination_times`. When a train divides,
/// the portion that reaches `destination` becomes its calling points. When a
/// train calls at the destination more than once the first call is used. A
/// board whose origin is its own destination has nothing to show.
pub fn filter_to_destination(mut service: Service, origin: &Crs, destination: &Crs) -> Option<Service> {
    if origin == destination {
        return None;
    }

    if !service.follow_portion_to(destination) {
        return None;
    }
    let times = service.calling_at(destination)?.times;
    service.destination_times = Some(times);
    Some(service)
}
