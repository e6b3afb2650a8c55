//! API Models
//!
//! Request and response bodies of the relay, annotated for OpenAPI
//! documentation with `utoipa`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /completion`. Both fields are optional on the wire so that
/// missing values produce a readable 400 instead of a decoding failure.
#[derive(Deserialize, ToSchema, Debug)]
pub struct CompletionPayload {
    #[schema(example = "You are evaluating a teacher's response to a classroom fight...")]
    pub prompt: Option<String>,
    /// One of `dialog`, `feedback`, `student`, `hint`. Defaults to `feedback`.
    #[serde(rename = "type")]
    #[schema(example = "feedback")]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub response: String,
    #[serde(rename = "type")]
    #[schema(example = "feedback")]
    pub kind: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub message: String,
    /// Chat model the gateway is configured to call.
    #[schema(example = "gemini-2.5-flash-lite")]
    pub model: String,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ErrorResponse {
    pub error: String,
}
