//! Reconciliation of scheduled and estimated time fields.
//!
//! Darwin records carry their times under one of two naming conventions and
//! encode the estimate as a time, a status word, a flag, `null`, or nothing
//! at all depending on the state of the service. [`reconcile`] picks the
//! naming convention once and folds everything into a [`ServiceTime`].

use crate::domain::{Estimate, RecordError, ServiceTime, TimePoint};

use super::types::RawTimeFields;

/// Which naming convention a record's time fields use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// `std`/`etd`/`atd` on services, `st`/`et`/`at` on calling points.
    Current,
    /// `time`/`estimate`.
    Legacy,
}

/// The estimate field as it appeared in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EstimateField<'a> {
    Absent,
    Null,
    Text(&'a str),
}

impl<'a> EstimateField<'a> {
    fn from_field(field: Option<&'a Option<String>>) -> Self {
        match field {
            None => EstimateField::Absent,
            Some(None) => EstimateField::Null,
            Some(Some(text)) => EstimateField::Text(text.trim()),
        }
    }
}

/// Scheduled/estimate fields taken from a single naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Selected<'a> {
    naming: Naming,
    scheduled: Option<&'a str>,
    estimate: EstimateField<'a>,
}

/// Determine the naming convention of a record.
///
/// The current names win whenever any of them is present.
pub fn naming(fields: &RawTimeFields) -> Naming {
    select(fields).naming
}

fn select(fields: &RawTimeFields) -> Selected<'_> {
    let current_scheduled = fields.std.as_deref().or(fields.st.as_deref());
    // An actual time supersedes the estimate once the train has called
    let current_estimate = match fields.atd.as_deref().or(fields.at.as_deref()) {
        Some(actual) => EstimateField::Text(actual.trim()),
        None => EstimateField::from_field(fields.etd.as_ref().or(fields.et.as_ref())),
    };

    let has_current = current_scheduled.is_some() || current_estimate != EstimateField::Absent;
    let has_legacy = fields.time.is_some() || fields.estimate.is_some();

    if has_current || !has_legacy {
        Selected {
            naming: Naming::Current,
            scheduled: current_scheduled,
            estimate: current_estimate,
        }
    } else {
        Selected {
            naming: Naming::Legacy,
            scheduled: fields.time.as_deref(),
            estimate: EstimateField::from_field(fields.estimate.as_ref()),
        }
    }
}

/// Reconcile a record's time fields into one canonical [`ServiceTime`].
///
/// The estimate is resolved in priority order: cancellation, delay without a
/// time, unrecognised text (`NoReport`), a concrete time, and finally
/// `OnTime` when the record has no estimate field at all.
///
/// Fails with [`RecordError::MalformedTimeField`] when the scheduled time is
/// missing or unreadable; the caller should drop the record.
///
/// # Examples
///
/// ```
/// use departure_board::darwin::{RawTimeFields, reconcile};
/// use departure_board::domain::Estimate;
///
/// let fields = RawTimeFields {
///     std: Some("10:00".into()),
///     etd: Some(Some("10:12".into())),
///     ..Default::default()
/// };
/// let times = reconcile(&fields).unwrap();
/// assert_eq!(times.scheduled.to_string(), "10:00");
/// assert_eq!(times.expected().to_string(), "10:12");
///
/// let missing = RawTimeFields::default();
/// assert!(reconcile(&missing).is_err());
///
/// let no_estimate = RawTimeFields { time: Some("09:30".into()), ..Default::default() };
/// assert_eq!(reconcile(&no_estimate).unwrap().estimate, Estimate::OnTime);
/// ```
pub fn reconcile(fields: &RawTimeFields) -> Result<ServiceTime, RecordError> {
    let selected = select(fields);

    let scheduled_text = selected
        .scheduled
        .ok_or_else(|| RecordError::MalformedTimeField("no scheduled time".to_string()))?;

    let scheduled = TimePoint::parse_provider(scheduled_text)
        .map_err(|e| RecordError::MalformedTimeField(format!("scheduled {scheduled_text:?}: {e}")))?
        .with_next_day(fields.next_day == Some(true));

    let estimate = resolve_estimate(fields, selected.estimate);

    Ok(ServiceTime::new(scheduled, estimate))
}

fn resolve_estimate(fields: &RawTimeFields, field: EstimateField<'_>) -> Estimate {
    let text = match field {
        EstimateField::Text(text) => Some(text),
        _ => None,
    };
    let concrete = text.and_then(|t| TimePoint::parse_provider(t).ok());

    let cancelled = fields.is_cancelled == Some(true)
        || fields.cancelled == Some(true)
        || text.is_some_and(|t| t.eq_ignore_ascii_case("cancelled"));
    if cancelled {
        return Estimate::Cancelled;
    }

    let delayed =
        fields.delayed == Some(true) || text.is_some_and(|t| t.eq_ignore_ascii_case("delayed"));
    if delayed && concrete.is_none() {
        return Estimate::Delayed;
    }

    match field {
        EstimateField::Absent => Estimate::OnTime,
        EstimateField::Null => Estimate::NoReport,
        EstimateField::Text(text) => match concrete {
            Some(time) => Estimate::Time(time),
            None if text.eq_ignore_ascii_case("on time") => Estimate::OnTime,
            None => Estimate::NoReport,
        },
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn time_text() -> impl Strategy<Value = String> {
        (0u32..24, 0u32..60).prop_map(|(h, m)| format!("{h:02}:{m:02}"))
    }

    fn estimate_text() -> impl Strategy<Value = Option<Option<String>>> {
        prop_oneof![
            Just(None),
            Just(Some(None)),
            Just(Some(Some("On time".to_string()))),
            Just(Some(Some("Delayed".to_string()))),
            Just(Some(Some("Cancelled".to_string()))),
            Just(Some(Some("No report".to_string()))),
            "[A-Za-z ]{0,12}".prop_map(|s| Some(Some(s))),
            time_text().prop_map(|s| Some(Some(s))),
        ]
    }

    fn raw_fields() -> impl Strategy<Value = RawTimeFields> {
        (
            time_text(),
            estimate_text(),
            any::<bool>(),
            proptest::option::of(any::<bool>()),
            proptest::option::of(any::<bool>()),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(scheduled, estimate, legacy, is_cancelled, delayed, next_day)| {
                if legacy {
                    RawTimeFields {
                        time: Some(scheduled),
                        estimate,
                        cancelled: is_cancelled,
                        delayed,
                        next_day,
                        ..Default::default()
                    }
                } else {
                    RawTimeFields {
                        std: Some(scheduled),
                        etd: estimate,
                        is_cancelled,
                        delayed,
                        next_day,
                        ..Default::default()
                    }
                }
            })
    }

    /// Render a reconciled pair back into current-convention fields.
    fn render(times: &ServiceTime) -> RawTimeFields {
        RawTimeFields {
            std: Some(times.scheduled.to_string()),
            etd: match times.estimate {
                Estimate::OnTime => None,
                other => Some(Some(other.to_string())),
            },
            next_day: times.scheduled.is_next_day().then_some(true),
            ..Default::default()
        }
    }

    proptest! {
        /// Reconciling the same record twice gives the same result
        #[test]
        fn deterministic(fields in raw_fields()) {
            prop_assert_eq!(reconcile(&fields), reconcile(&fields));
        }

        /// Reconciling an already reconciled record changes nothing
        #[test]
        fn idempotent(fields in raw_fields()) {
            let once = reconcile(&fields).unwrap();
            let twice = reconcile(&render(&once)).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// An explicit cancellation always wins, whatever the estimate says
        #[test]
        fn cancellation_never_no_report(fields in raw_fields()) {
            let mut fields = fields;
            fields.is_cancelled = Some(true);
            prop_assert_eq!(reconcile(&fields).unwrap().estimate, Estimate::Cancelled);
        }

        /// A record with a scheduled time always reconciles
        #[test]
        fn scheduled_always_kept(fields in raw_fields()) {
            let times = reconcile(&fields).unwrap();
            let expected = fields.std.as_deref().or(fields.time.as_deref()).unwrap();
            prop_assert_eq!(times.scheduled.to_string(), expected);
        }
    }
}
