//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the relay endpoint, the health check, and OpenAPI documentation.

use crate::{
    handlers,
    models::{CompletionPayload, CompletionResponse, ErrorResponse, HealthResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::complete, handlers::health),
    components(schemas(CompletionPayload, CompletionResponse, HealthResponse, ErrorResponse)),
    tags(
        (name = "Safe Class API", description = "Completion relay for the classroom-conflict training simulator")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Wrong methods on known paths answer like unknown paths.
    let api_router = Router::new()
        .route(
            "/completion",
            post(handlers::complete).fallback(handlers::not_found),
        )
        .route("/health", get(handlers::health).fallback(handlers::not_found))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .fallback(handlers::not_found)
}
