//! Conversion from Darwin DTOs to domain types.
//!
//! This module turns the raw departure board JSON into reconciled
//! [`Service`]s. Problems with a single service or calling point are logged
//! and counted, and the record is dropped; only a payload that is not a
//! departure board at all is an error.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    BoardError, CallingPoint, Crs, Estimate, RecordError, Service, ServiceTime, SkippedRecords,
};

use super::reconcile::reconcile;
use super::types::{NrccMessages, OneOrMany, RawBoard, RawCallingPoint, RawService, ServiceLocation};

/// Everything extracted from one departure board payload, before any
/// destination filtering or windowing.
#[derive(Debug, Clone, Default)]
pub struct ConvertedBoard {
    /// When Darwin generated the board, if it said so in a readable form
    pub generated_at: Option<NaiveDateTime>,
    /// Board station name
    pub location_name: Option<String>,
    /// Board station code
    pub crs: Option<Crs>,
    /// Name of the station the provider filtered to
    pub filter_location_name: Option<String>,
    /// Services in provider order
    pub services: Vec<Service>,
    /// Board-wide messages in provider order, not yet deduplicated
    pub station_messages: Vec<String>,
    /// Records dropped during conversion
    pub skipped: SkippedRecords,
}

/// Result of converting a Darwin service item.
#[derive(Debug, Clone)]
pub struct ConvertedService {
    pub service: Service,
    /// Calling points that were dropped from this service
    pub dropped: Vec<RecordError>,
}

/// Parse a response body into a JSON value.
pub fn parse_payload(body: &str) -> Result<Value, BoardError> {
    if body.trim().is_empty() {
        return Err(BoardError::ProviderPayload("empty response body".to_string()));
    }
    serde_json::from_str(body).map_err(|e| BoardError::ProviderPayload(format!("not JSON: {e}")))
}

/// Convert a departure board payload to domain types.
///
/// Fails only when the payload is `null`, not an object, or has no usable
/// `trainServices` field. An explicit `"trainServices": null` is an empty
/// board; a single service object is a board of one. Any other value there
/// (a status string, a number) means the provider did not send a board.
pub fn convert_payload(payload: &Value) -> Result<ConvertedBoard, BoardError> {
    if payload.is_null() {
        return Err(BoardError::ProviderPayload("payload is null".to_string()));
    }
    if !payload.is_object() {
        return Err(BoardError::ProviderPayload(
            "payload is not a JSON object".to_string(),
        ));
    }

    if let Some(services) = payload.get("trainServices") {
        if !(services.is_array() || services.is_object() || services.is_null()) {
            return Err(BoardError::ProviderPayload(format!(
                "trainServices is not a list of services: {services}"
            )));
        }
    }

    let board = RawBoard::deserialize(payload)
        .map_err(|e| BoardError::ProviderPayload(format!("unexpected board shape: {e}")))?;

    let raw_services = match &board.train_services {
        None => {
            return Err(BoardError::ProviderPayload(
                "missing trainServices".to_string(),
            ));
        }
        Some(None) => &[][..],
        Some(Some(services)) => services.as_slice(),
    };

    let mut services = Vec::with_capacity(raw_services.len());
    let mut skipped = SkippedRecords::default();

    for (idx, raw) in raw_services.iter().enumerate() {
        match convert_service(raw) {
            Ok(converted) => {
                for err in &converted.dropped {
                    warn!(service = %converted.service.id, error = %err, "dropping calling point");
                    skipped.record(err);
                }
                services.push(converted.service);
            }
            Err(err) => {
                // Log and skip invalid services rather than failing the whole board
                warn!(index = idx, id = ?service_id_hint(raw), error = %err, "dropping service");
                skipped.record(&err);
            }
        }
    }

    let station_messages = board
        .nrcc_messages
        .as_ref()
        .map(station_messages)
        .unwrap_or_default();

    debug!(
        services = services.len(),
        skipped = skipped.total(),
        messages = station_messages.len(),
        "converted departure board"
    );

    Ok(ConvertedBoard {
        generated_at: board.generated_at.as_deref().and_then(parse_generated_at),
        location_name: board.location_name.clone(),
        crs: board
            .crs
            .as_deref()
            .and_then(|c| Crs::parse_normalized(c).ok()),
        filter_location_name: board.filter_location_name.clone(),
        services,
        station_messages,
        skipped,
    })
}

/// Convert a single service item to domain types.
///
/// The service's own departure time must reconcile; its calling points are
/// converted one by one and any that fail are reported in `dropped`.
pub fn convert_service(value: &Value) -> Result<ConvertedService, RecordError> {
    let raw = RawService::deserialize(value)
        .map_err(|e| RecordError::MalformedRecord(e.to_string()))?;

    let origin_times = reconcile(&raw.times)?;
    let (mut portions, dropped) = build_calling_points(&raw);
    let calling_points = if portions.is_empty() {
        Vec::new()
    } else {
        portions.remove(0)
    };
    let (terminus, via) = parse_destination(raw.destination.as_ref());
    let messages = service_messages(&raw, &origin_times);

    let service = Service {
        id: raw.service_id.clone().unwrap_or_default(),
        operator: raw.operator.clone().unwrap_or_default(),
        platform: raw
            .platform
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
        terminus,
        via,
        origin_times,
        destination_times: None,
        calling_points,
        other_portions: portions,
        messages,
    };

    Ok(ConvertedService { service, dropped })
}

/// Build the calling points of a service, one list per portion.
///
/// Each group of `subsequentCallingPoints` is a portion of the train, the
/// first being the one it leaves the board station as; a flat
/// `callingPoints` list is a single portion. Provider order is kept as
/// journey order: sorting by time would misplace stops whose estimates have
/// drifted.
pub fn build_calling_points(raw: &RawService) -> (Vec<Vec<CallingPoint>>, Vec<RecordError>) {
    let raw_portions: Vec<&[Value]> = match (&raw.subsequent_calling_points, &raw.calling_points) {
        (Some(groups), _) => groups
            .as_slice()
            .iter()
            .map(|group| group.calling_point.as_ref().map(OneOrMany::as_slice).unwrap_or(&[]))
            .collect(),
        (None, Some(points)) => vec![points.as_slice()],
        (None, None) => Vec::new(),
    };

    let mut portions = Vec::with_capacity(raw_portions.len());
    let mut dropped = Vec::new();

    for raw_points in raw_portions {
        let mut points = Vec::with_capacity(raw_points.len());
        for value in raw_points {
            match build_calling_point(value) {
                Ok(point) => points.push(point),
                Err(err) => dropped.push(err),
            }
        }
        portions.push(points);
    }

    (portions, dropped)
}

/// Convert one calling point, resolving its station before its times.
fn build_calling_point(value: &Value) -> Result<CallingPoint, RecordError> {
    let raw = RawCallingPoint::deserialize(value)
        .map_err(|e| RecordError::MalformedRecord(e.to_string()))?;

    let code = raw
        .crs
        .as_deref()
        .ok_or_else(|| RecordError::UnknownStation(format!("no station code at {}", describe(&raw))))?;
    let station = Crs::parse_normalized(code)
        .map_err(|e| RecordError::UnknownStation(format!("{code:?}: {e}")))?;

    let times = reconcile(&raw.times)?;
    let name = raw
        .location_name
        .unwrap_or_else(|| station.as_str().to_string());

    Ok(CallingPoint::new(station, name, times))
}

fn describe(raw: &RawCallingPoint) -> &str {
    raw.location_name.as_deref().unwrap_or("unnamed stop")
}

/// Extract the terminus display name and "via" text.
fn parse_destination(destinations: Option<&OneOrMany<ServiceLocation>>) -> (String, Option<String>) {
    let dests = destinations.map(OneOrMany::as_slice).unwrap_or(&[]);

    let names: Vec<&str> = dests
        .iter()
        .filter_map(|d| d.location_name.as_deref().or(d.crs.as_deref()))
        .collect();

    let terminus = if names.is_empty() {
        "Unknown".to_string()
    } else {
        // Multiple destinations (split service)
        names.join(" & ")
    };

    let via = dests.iter().find_map(|d| d.via.clone());

    (terminus, via)
}

/// Collect the service-level advisories.
///
/// A cancelled or delayed service always carries at least one message, even
/// when Darwin gave no reason.
fn service_messages(raw: &RawService, times: &ServiceTime) -> Vec<String> {
    let mut messages = Vec::new();

    match (&raw.cancel_reason, times.estimate) {
        (Some(reason), _) => messages.push(reason.clone()),
        (None, Estimate::Cancelled) => messages.push("This train has been cancelled.".to_string()),
        _ => {}
    }

    if !times.is_cancelled() {
        match (&raw.delay_reason, times.estimate, times.delay_minutes()) {
            (Some(reason), _, _) => messages.push(reason.clone()),
            (None, Estimate::Delayed, _) => messages.push("This train has been delayed.".to_string()),
            (None, _, Some(mins)) if mins > 0 => {
                messages.push(format!("This train is running {mins} minutes late."))
            }
            _ => {}
        }
    }

    if let Some(alerts) = &raw.adhoc_alerts {
        messages.extend(alerts.iter().cloned());
    }

    let mut unique: Vec<String> = Vec::with_capacity(messages.len());
    for message in messages {
        let message = message.trim().to_string();
        if !message.is_empty() && !unique.contains(&message) {
            unique.push(message);
        }
    }
    unique
}

/// Extract board-wide message texts in provider order.
fn station_messages(value: &Value) -> Vec<String> {
    if value.is_null() {
        return Vec::new();
    }
    match NrccMessages::deserialize(value) {
        Ok(messages) => messages
            .texts()
            .into_iter()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable station messages");
            Vec::new()
        }
    }
}

fn parse_generated_at(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

fn service_id_hint(value: &Value) -> Option<&str> {
    value
        .get("serviceID")
        .or_else(|| value.get("serviceId"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimePoint;
    use serde_json::json;

    fn tp(s: &str) -> TimePoint {
        TimePoint::parse_hhmm(s).unwrap()
    }

    fn crs(s: &str) -> Crs {
        Crs::parse(s).unwrap()
    }

    fn service_json() -> Value {
        json!({
            "serviceID": "ABC123",
            "std": "10:00",
            "etd": "On time",
            "platform": "1",
            "operator": "Great Western Railway",
            "destination": [{"locationName": "Bristol Temple Meads", "crs": "BRI", "via": "via Bath Spa"}],
            "subsequentCallingPoints": [{
                "callingPoint": [
                    {"locationName": "Reading", "crs": "RDG", "st": "10:25", "et": "10:27"},
                    {"locationName": "Swindon", "crs": "SWI", "st": "10:52", "et": "On time"},
                    {"locationName": "Bristol Temple Meads", "crs": "BRI", "st": "11:30"}
                ]
            }]
        })
    }

    #[test]
    fn convert_simple_service() {
        let converted = convert_service(&service_json()).unwrap();
        let service = converted.service;

        assert_eq!(service.id, "ABC123");
        assert_eq!(service.operator, "Great Western Railway");
        assert_eq!(service.platform.as_deref(), Some("1"));
        assert_eq!(service.terminus, "Bristol Temple Meads");
        assert_eq!(service.via.as_deref(), Some("via Bath Spa"));
        assert_eq!(service.origin_times.scheduled, tp("10:00"));
        assert_eq!(service.origin_times.estimate, Estimate::OnTime);
        assert!(service.destination_times.is_none());
        assert!(service.messages.is_empty());
        assert!(converted.dropped.is_empty());
    }

    #[test]
    fn calling_points_keep_provider_order() {
        let service = convert_service(&service_json()).unwrap().service;
        let stations: Vec<&str> = service.calling_points.iter().map(|cp| cp.station.as_str()).collect();
        assert_eq!(stations, vec!["RDG", "SWI", "BRI"]);

        assert_eq!(service.calling_points[0].times.estimate, Estimate::Time(tp("10:27")));
        assert_eq!(service.calling_points[1].times.estimate, Estimate::OnTime);
        assert_eq!(service.calling_points[2].times.estimate, Estimate::OnTime);
    }

    #[test]
    fn calling_points_not_resorted_by_estimate() {
        // Swindon's estimate is earlier than Reading's, order must not change
        let value = json!({
            "serviceID": "X",
            "std": "10:00",
            "subsequentCallingPoints": [{
                "callingPoint": [
                    {"locationName": "Reading", "crs": "RDG", "st": "10:25", "et": "11:05"},
                    {"locationName": "Swindon", "crs": "SWI", "st": "10:52", "et": "10:59"}
                ]
            }]
        });
        let service = convert_service(&value).unwrap().service;
        assert_eq!(service.calling_points[0].station, crs("RDG"));
        assert_eq!(service.calling_points[1].station, crs("SWI"));
    }

    #[test]
    fn calling_point_without_station_is_skipped() {
        let value = json!({
            "serviceID": "X",
            "std": "10:00",
            "subsequentCallingPoints": [{
                "callingPoint": [
                    {"locationName": "Reading", "crs": "RDG", "st": "10:25"},
                    {"locationName": "Mystery Halt", "st": "10:40"},
                    {"locationName": "Bad Code", "crs": "B4D", "st": "10:45"},
                    {"locationName": "Swindon", "crs": "swi", "st": "10:52"}
                ]
            }]
        });
        let converted = convert_service(&value).unwrap();

        assert_eq!(converted.service.calling_points.len(), 2);
        assert_eq!(converted.service.calling_points[1].station, crs("SWI"));
        assert_eq!(converted.dropped.len(), 2);
        assert!(converted
            .dropped
            .iter()
            .all(|e| matches!(e, RecordError::UnknownStation(_))));
    }

    #[test]
    fn calling_point_without_time_is_skipped() {
        let value = json!({
            "serviceID": "X",
            "std": "10:00",
            "subsequentCallingPoints": [{
                "callingPoint": [
                    {"locationName": "Reading", "crs": "RDG"},
                    {"locationName": "Swindon", "crs": "SWI", "st": "10:52"}
                ]
            }]
        });
        let converted = convert_service(&value).unwrap();

        assert_eq!(converted.service.calling_points.len(), 1);
        assert!(matches!(converted.dropped[0], RecordError::MalformedTimeField(_)));
    }

    #[test]
    fn legacy_flat_calling_points() {
        let value = json!({
            "serviceId": "L1",
            "time": "08:00",
            "callingPoints": [
                {"locationCode": "sot", "stationName": "Stoke-on-Trent", "time": "08:36"},
                {"locationCode": "EUS", "stationName": "London Euston", "time": "10:08", "estimate": "10:15"}
            ]
        });
        let service = convert_service(&value).unwrap().service;

        assert_eq!(service.id, "L1");
        assert_eq!(service.calling_points.len(), 2);
        assert_eq!(service.calling_points[0].station, crs("SOT"));
        assert_eq!(service.calling_points[1].times.estimate, Estimate::Time(tp("10:15")));
    }

    #[test]
    fn later_portions_are_kept() {
        let value = json!({
            "serviceID": "SPLIT",
            "std": "10:00",
            "subsequentCallingPoints": [
                {"callingPoint": [
                    {"locationName": "Ashford International", "crs": "AFK", "st": "10:40"},
                    {"locationName": "Ramsgate", "crs": "RAM", "st": "11:25"}
                ]},
                {"callingPoint": [{"locationName": "Dover Priory", "crs": "DVP", "st": "11:20"}]}
            ]
        });
        let service = convert_service(&value).unwrap().service;

        let first: Vec<&str> = service.calling_points.iter().map(|cp| cp.station.as_str()).collect();
        assert_eq!(first, vec!["AFK", "RAM"]);
        assert_eq!(service.other_portions.len(), 1);
        assert_eq!(service.other_portions[0][0].station, crs("DVP"));
        assert!(service.calling_at(&crs("DVP")).is_none());
    }

    #[test]
    fn service_without_scheduled_time_is_dropped() {
        let value = json!({"serviceID": "X", "etd": "10:05"});
        assert!(matches!(
            convert_service(&value),
            Err(RecordError::MalformedTimeField(_))
        ));
    }

    #[test]
    fn service_with_wrong_shape_is_malformed() {
        assert!(matches!(
            convert_service(&json!("not a service")),
            Err(RecordError::MalformedRecord(_))
        ));
    }

    #[test]
    fn cancelled_service_gets_message() {
        let mut value = service_json();
        value["isCancelled"] = json!(true);
        value["etd"] = json!("Cancelled");
        let service = convert_service(&value).unwrap().service;

        assert!(service.is_cancelled());
        assert_eq!(service.messages, vec!["This train has been cancelled."]);
    }

    #[test]
    fn cancel_reason_is_used_verbatim() {
        let mut value = service_json();
        value["isCancelled"] = json!(true);
        value["cancelReason"] = json!("This train has been cancelled because of a fault on this train");
        let service = convert_service(&value).unwrap().service;

        assert_eq!(
            service.messages,
            vec!["This train has been cancelled because of a fault on this train"]
        );
    }

    #[test]
    fn delay_messages() {
        let mut value = service_json();
        value["etd"] = json!("Delayed");
        let service = convert_service(&value).unwrap().service;
        assert_eq!(service.messages, vec!["This train has been delayed."]);

        value["etd"] = json!("10:12");
        let service = convert_service(&value).unwrap().service;
        assert_eq!(service.messages, vec!["This train is running 12 minutes late."]);

        value["delayReason"] = json!("This train has been delayed by a late running freight train");
        let service = convert_service(&value).unwrap().service;
        assert_eq!(
            service.messages,
            vec!["This train has been delayed by a late running freight train"]
        );
    }

    #[test]
    fn adhoc_alerts_appended() {
        let mut value = service_json();
        value["adhocAlerts"] = json!(["This train will be formed of 5 coaches.", "This train will be formed of 5 coaches."]);
        let service = convert_service(&value).unwrap().service;
        assert_eq!(service.messages, vec!["This train will be formed of 5 coaches."]);
    }

    #[test]
    fn split_destination_names_joined() {
        let mut value = service_json();
        value["destination"] = json!([
            {"locationName": "Bristol Temple Meads", "crs": "BRI"},
            {"locationName": "Cardiff Central", "crs": "CDF"}
        ]);
        let service = convert_service(&value).unwrap().service;
        assert_eq!(service.terminus, "Bristol Temple Meads & Cardiff Central");
    }

    #[test]
    fn payload_null_is_error() {
        assert!(matches!(
            convert_payload(&Value::Null),
            Err(BoardError::ProviderPayload(_))
        ));
    }

    #[test]
    fn payload_without_services_is_error() {
        let err = convert_payload(&json!({"locationName": "Leeds", "crs": "LDS"})).unwrap_err();
        assert!(err.to_string().contains("trainServices"));
    }

    #[test]
    fn payload_with_scalar_services_is_error() {
        for services in [json!("Service unavailable"), json!(0), json!(false)] {
            let err = convert_payload(&json!({"crs": "MAN", "trainServices": services})).unwrap_err();
            assert!(err.to_string().contains("trainServices"));
        }
    }

    #[test]
    fn payload_with_single_service_object() {
        let board = convert_payload(&json!({"trainServices": service_json()})).unwrap();
        assert_eq!(board.services.len(), 1);
        assert_eq!(board.services[0].id, "ABC123");
    }

    #[test]
    fn payload_with_null_services_is_empty() {
        let board = convert_payload(&json!({"locationName": "Leeds", "crs": "lds", "trainServices": null})).unwrap();
        assert!(board.services.is_empty());
        assert_eq!(board.crs, Some(crs("LDS")));
        assert_eq!(board.location_name.as_deref(), Some("Leeds"));
    }

    #[test]
    fn payload_skips_bad_services() {
        let payload = json!({
            "generatedAt": "2024-03-15T10:30:00.1234567+00:00",
            "trainServices": [service_json(), {"serviceID": "no-time"}, 42]
        });
        let board = convert_payload(&payload).unwrap();

        assert_eq!(board.services.len(), 1);
        assert_eq!(board.skipped.malformed_time, 1);
        assert_eq!(board.skipped.malformed_record, 1);
        assert_eq!(
            board.generated_at.unwrap().format("%H:%M").to_string(),
            "10:30"
        );
    }

    #[test]
    fn payload_station_messages() {
        let payload = json!({
            "trainServices": [],
            "nrccMessages": [{"Value": " Engineering works between Reading and Didcot "}, {"Value": ""}]
        });
        let board = convert_payload(&payload).unwrap();
        assert_eq!(
            board.station_messages,
            vec!["Engineering works between Reading and Didcot"]
        );
    }

    #[test]
    fn parse_payload_rejects_garbage() {
        assert!(parse_payload("").is_err());
        assert!(parse_payload("<html>502 Bad Gateway</html>").is_err());
        assert_eq!(parse_payload("null").unwrap(), Value::Null);
    }
}
