//! Normalization error types.
//!
//! Record-level errors drop one service or calling point and are recovered
//! locally. Board-level errors abort the whole poll cycle.

/// A single service or calling point could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The scheduled time is missing or is not a time of day
    #[error("malformed time field: {0}")]
    MalformedTimeField(String),

    /// A calling point has no usable station code
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// The record does not have the expected JSON shape
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

/// The payload as a whole is unusable; no board can be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// Payload absent, not JSON, or missing the services array
    #[error("provider payload unusable: {0}")]
    ProviderPayload(String),
}
