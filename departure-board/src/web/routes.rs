//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use tracing::warn;

use crate::domain::Crs;
use crate::sensor::SensorState;

use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sensors", get(list_sensors))
        .route("/sensors/:station/:destination", get(get_sensor))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// All configured sensors.
async fn list_sensors(State(state): State<AppState>) -> Json<Vec<SensorState>> {
    Json(state.sensors.all().await)
}

/// One sensor by station pair. Codes are accepted in any case.
async fn get_sensor(
    State(state): State<AppState>,
    Path((station, destination)): Path<(String, String)>,
) -> Result<Json<SensorState>, AppError> {
    let station_crs = Crs::parse_normalized(&station).map_err(|_| AppError::BadRequest {
        message: format!("Invalid station CRS: {station}"),
    })?;
    let destination_crs =
        Crs::parse_normalized(&destination).map_err(|_| AppError::BadRequest {
            message: format!("Invalid destination CRS: {destination}"),
        })?;

    state
        .sensors
        .get(&station_crs, &destination_crs)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("No sensor configured for {station_crs} to {destination_crs}"),
        })
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
