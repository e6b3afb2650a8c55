//! Core engine of the classroom-conflict training simulator.
//!
//! Everything here is front-end agnostic: the HTTP relay and the terminal
//! simulator both build on these modules.

pub mod config;
pub mod evaluation;
pub mod llm_client;
pub mod parser;
pub mod prompt;
pub mod relay_client;
pub mod scenario;
pub mod scoring;
pub mod session;
pub mod simulator;
pub mod turn;
