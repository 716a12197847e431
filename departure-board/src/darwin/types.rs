//! Darwin API response DTOs.
//!
//! These types map the departure board JSON as loosely as it is sent. They use
//! `Option` liberally because Darwin omits fields rather than sending null
//! values in many cases, and they accept both the current field names and the
//! older ones still seen from some bridges. Services and calling points are
//! kept as raw JSON at the list level so that one bad record can be dropped
//! without losing the rest of the board.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Response from `GetDepBoardWithDetails`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBoard {
    /// When this response was generated (ISO 8601 datetime).
    pub generated_at: Option<String>,

    /// Human-readable name of the board station.
    pub location_name: Option<String>,

    /// CRS code of the board station.
    pub crs: Option<String>,

    /// Name of the station the board was filtered to.
    pub filter_location_name: Option<String>,

    /// CRS code the board was filtered to.
    #[serde(alias = "filtercrs")]
    pub filter_crs: Option<String>,

    /// Train services. Absent means the payload is not a departure board;
    /// `null` is how Darwin says there are no services.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub train_services: Option<Option<OneOrMany<Value>>>,

    /// Network Rail communication messages, in any of the shapes seen.
    pub nrcc_messages: Option<Value>,
}

/// A service on the departure board.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawService {
    /// Ephemeral Darwin service ID. Only valid while on departure board.
    #[serde(rename = "serviceID", alias = "serviceId")]
    pub service_id: Option<String>,

    /// Train operating company name.
    pub operator: Option<String>,

    /// Train operating company ATOC code.
    pub operator_code: Option<String>,

    /// Platform number/letter.
    pub platform: Option<String>,

    /// Scheduled/estimated departure fields, under either naming.
    #[serde(flatten)]
    pub times: RawTimeFields,

    /// Reason for cancellation (if cancelled).
    pub cancel_reason: Option<String>,

    /// Reason for delay (if delayed).
    pub delay_reason: Option<String>,

    /// Free-text alerts attached to this service.
    pub adhoc_alerts: Option<OneOrMany<String>>,

    /// Origin station(s).
    pub origin: Option<OneOrMany<ServiceLocation>>,

    /// Destination station(s); more than one for splitting services.
    pub destination: Option<OneOrMany<ServiceLocation>>,

    /// Subsequent calling points, one group per portion of the train.
    pub subsequent_calling_points: Option<OneOrMany<ArrayOfCallingPoints>>,

    /// Flat list of subsequent calling points (older bridges).
    pub calling_points: Option<OneOrMany<Value>>,
}

/// Wrapper for a list of calling points.
///
/// Darwin wraps calling points in this structure to support split/join
/// services, where multiple arrays represent different portions of a train.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayOfCallingPoints {
    /// The calling points in this portion, kept raw for per-stop recovery.
    pub calling_point: Option<OneOrMany<Value>>,
}

/// A single calling point (station stop).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCallingPoint {
    /// CRS code of the station.
    #[serde(alias = "locationCode")]
    pub crs: Option<String>,

    /// Human-readable station name.
    #[serde(alias = "stationName")]
    pub location_name: Option<String>,

    #[serde(flatten)]
    pub times: RawTimeFields,
}

/// Every time-related field a service or calling point may carry.
///
/// Services use `std`/`etd`/`atd`, calling points `st`/`et`/`at`; older
/// payloads use `time`/`estimate` for both. Estimate fields are
/// `Option<Option<_>>` so an explicit `null` can be told apart from an
/// absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimeFields {
    /// Scheduled departure (service).
    pub std: Option<String>,

    /// Estimated departure (service).
    #[serde(default, deserialize_with = "deserialize_present")]
    pub etd: Option<Option<String>>,

    /// Actual departure (service).
    pub atd: Option<String>,

    /// Scheduled time (calling point).
    pub st: Option<String>,

    /// Estimated time (calling point).
    #[serde(default, deserialize_with = "deserialize_present")]
    pub et: Option<Option<String>>,

    /// Actual time (calling point).
    pub at: Option<String>,

    /// Scheduled time (legacy naming).
    pub time: Option<String>,

    /// Estimated time or status (legacy naming).
    #[serde(default, deserialize_with = "deserialize_present")]
    pub estimate: Option<Option<String>>,

    /// Whether this service or call is cancelled.
    pub is_cancelled: Option<bool>,

    /// Cancellation flag (legacy naming).
    pub cancelled: Option<bool>,

    /// Delay flag (legacy naming).
    pub delayed: Option<bool>,

    /// Whether the times fall on the day after the board date.
    pub next_day: Option<bool>,
}

/// Origin or destination location.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLocation {
    /// Human-readable station name.
    #[serde(alias = "stationName")]
    pub location_name: Option<String>,

    /// CRS code.
    pub crs: Option<String>,

    /// "via" text (e.g., "via Bristol Parkway").
    pub via: Option<String>,
}

/// A value an XML-to-JSON bridge sends either bare or wrapped in a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => std::slice::from_ref(item),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

/// Network Rail communication messages.
///
/// Darwin's JSON API sends a list of `{"Value": ...}` objects; older bridges
/// wrap them as `{"message": ...}` holding a string, a list, or a `#text`
/// node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NrccMessages {
    List(Vec<MessageText>),
    Wrapped { message: OneOrMany<MessageText> },
}

/// The text of one message, in any of its encodings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    Plain(String),
    Value {
        #[serde(rename = "Value")]
        value: String,
    },
    Text {
        #[serde(rename = "#text")]
        text: String,
    },
}

impl MessageText {
    pub fn as_str(&self) -> &str {
        match self {
            MessageText::Plain(s) => s,
            MessageText::Value { value } => value,
            MessageText::Text { text } => text,
        }
    }
}

impl NrccMessages {
    /// All message texts in provider order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            NrccMessages::List(items) => items.iter().map(MessageText::as_str).collect(),
            NrccMessages::Wrapped { message } => message.iter().map(MessageText::as_str).collect(),
        }
    }
}

/// Deserialize a field that is present, keeping an explicit `null` as
/// `Some(None)`. Combined with `#[serde(default)]`, absence gives `None`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
