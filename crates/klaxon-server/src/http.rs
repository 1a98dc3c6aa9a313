use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use klaxon_app::error::AppError;
use klaxon_core::error::DomainError;
use klaxon_core::ids::IncidentId;
use klaxon_ports::error::{IntakeError, ParseError};
use klaxon_ports::inbound::{AlertReceiver, IncidentManager};
use klaxon_ports::outbound::AlertSourceParser;
use klaxon_ports::types::RegistrySnapshot;

#[derive(Clone)]
pub struct AppState {
    pub incidents: Arc<dyn IncidentManager>,
    pub intake: Arc<dyn AlertReceiver>,
    pub parser: Arc<dyn AlertSourceParser>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(current_state))
        .route("/incidents", get(current_state))
        .route("/alert", post(receive_alert))
        .route("/incidents/{id}/ack", post(acknowledge))
        .route("/incidents/{id}/close", post(close))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn current_state(State(state): State<AppState>) -> Json<RegistrySnapshot> {
    Json(state.incidents.current_state().await)
}

/// A shed alert is still a 202: the source must not retry into a full queue.
async fn receive_alert(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let alerts = state.parser.parse(&body)?;
    debug!(
        source = state.parser.source_name(),
        alerts = alerts.len(),
        "webhook parsed"
    );
    let mut dropped = 0;
    for alert in alerts {
        match state.intake.submit_alert(alert) {
            Ok(()) => {}
            Err(IntakeError::QueueFull) => dropped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    let body = if dropped == 0 {
        json!({ "status": "accepted" })
    } else {
        json!({ "status": "dropped", "reason": "queue full" })
    };
    Ok((StatusCode::ACCEPTED, Json(body)))
}

async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let incident_id = IncidentId::parse(&id)?;
    state.incidents.acknowledge(incident_id).await?;
    info!(%incident_id, "incident acknowledged by operator");
    Ok(StatusCode::NO_CONTENT)
}

async fn close(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let incident_id = IncidentId::parse(&id)?;
    state.incidents.close(incident_id).await?;
    info!(%incident_id, "incident closed by operator");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug)]
pub struct ApiError(AppError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e.into())
    }
}

impl From<IntakeError> for ApiError {
    fn from(e: IntakeError) -> Self {
        Self(e.into())
    }
}

impl From<ParseError> for ApiError {
    fn from(e: ParseError) -> Self {
        Self(e.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Domain(DomainError::NoActiveIncident) => StatusCode::NOT_FOUND,
            AppError::Domain(DomainError::IdMismatch { .. }) => StatusCode::CONFLICT,
            AppError::Domain(DomainError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            AppError::Domain(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Intake(IntakeError::QueueFull) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Intake(IntakeError::Closed) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Parse(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self.0, "request rejected");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
