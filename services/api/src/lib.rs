//! Safe Class API Library Crate
//!
//! This library contains the HTTP relay between the training simulator and
//! the completion provider: configuration, application state, handlers and
//! routing. The binaries in `bin/` are thin wrappers around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
