// src/lib.rs
// Public library surface for the server binary, the CLI and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod sensing;
pub mod summarize;

pub use crate::api::{create_router, AppState};
pub use crate::error::SenseError;
pub use crate::sensing::{SensingResponse, SensingService};
