//! Axum Handlers for the REST API
//!
//! The relay accepts a prompt plus a completion type, forwards it to the
//! configured provider and hands the text back. Upstream failures keep their
//! status code so the caller can tell a bad key from a provider outage.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use safeclass_core::llm_client::{CompletionKind, GatewayError};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    models::{CompletionPayload, CompletionResponse, ErrorResponse, HealthResponse},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Gateway(GatewayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            ApiError::NotFound(error) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { error })).into_response()
            }
            ApiError::Gateway(err) => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let error = match &err {
                    GatewayError::InvalidCredentials | GatewayError::Upstream { .. } => {
                        warn!(status = %status, "Completion provider rejected the request: {}", err);
                        err.to_string()
                    }
                    _ => {
                        error!("Internal Server Error: {:?}", err);
                        "An internal server error occurred.".to_string()
                    }
                };
                (status, Json(ErrorResponse { error })).into_response()
            }
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

/// Relay a prompt to the completion provider.
#[utoipa::path(
    post,
    path = "/completion",
    request_body = CompletionPayload,
    responses(
        (status = 200, description = "Completion text", body = CompletionResponse),
        (status = 400, description = "Missing prompt or unknown type", body = ErrorResponse),
        (status = 401, description = "Provider rejected the API key", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn complete(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CompletionPayload>, JsonRejection>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let prompt = payload
        .prompt
        .as_deref()
        .filter(|prompt| !prompt.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Prompt is required".to_string()))?;

    let kind = match payload.kind.as_deref() {
        Some(kind) => kind.parse::<CompletionKind>().map_err(ApiError::BadRequest)?,
        None => CompletionKind::default(),
    };

    info!(kind = %kind, prompt_len = prompt.len(), "Relaying completion request");
    let response = state.completion_client.complete(prompt, kind).await?;

    Ok(Json(CompletionResponse {
        response,
        kind: kind.to_string(),
    }))
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Safe Class Simulation API is running".to_string(),
        model: state.config.provider.chat_model.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}
