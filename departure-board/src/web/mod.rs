//! Web layer exposing sensor states.
//!
//! Provides read-only JSON endpoints over the sensors the poller maintains.

mod routes;
mod state;

pub use routes::{AppError, ErrorResponse, create_router};
pub use state::AppState;
