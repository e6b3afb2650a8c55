//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the resources
//! shared by every handler.

use crate::config::Config;
use safeclass_core::llm_client::CompletionClient;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub completion_client: Arc<dyn CompletionClient>,
    pub config: Arc<Config>,
}
