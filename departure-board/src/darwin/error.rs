//! Board source error types.

use thiserror::Error;

use crate::domain::Crs;

/// Why a raw departure board could not be fetched.
///
/// Any of these leaves the sensor unavailable until the next poll; none of
/// them is ever shown as an empty board.
#[derive(Debug, Error)]
pub enum DarwinError {
    /// Network failure or timeout talking to Darwin
    #[error("board request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Darwin refused the key
    #[error("Darwin rejected the API key")]
    Unauthorized,

    #[error("Darwin is rate limiting board requests")]
    RateLimited,

    /// Any other non-success status, with the start of the response body
    #[error("Darwin answered {status} for the {origin} board: {detail}")]
    Status { origin: Crs, status: u16, detail: String },

    /// The body of a board (live or on disk) is not JSON
    #[error("{origin} board is not JSON: {reason}")]
    InvalidBody { origin: Crs, reason: String },

    /// The configured key cannot be sent as an `x-apikey` header
    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,

    /// The request limiter was shut down
    #[error("board requests are no longer accepted")]
    Closed,

    /// Static board files could not be loaded
    #[error("static board data: {0}")]
    StaticData(String),

    /// Static boards were loaded but none is for this station
    #[error("no static board for {0}")]
    NoBoard(Crs),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crs(s: &str) -> Crs {
        Crs::parse(s).unwrap()
    }

    #[test]
    fn messages_name_the_board() {
        let err = DarwinError::Status {
            origin: crs("MAN"),
            status: 503,
            detail: "Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Darwin answered 503 for the MAN board: Service Unavailable"
        );

        let err = DarwinError::InvalidBody {
            origin: crs("RDG"),
            reason: "expected value at line 1 column 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "RDG board is not JSON: expected value at line 1 column 1"
        );

        assert_eq!(DarwinError::NoBoard(crs("LDS")).to_string(), "no static board for LDS");
    }
}
