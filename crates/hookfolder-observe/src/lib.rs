//! Observability setup for hookfolder: structured logging via `tracing`,
//! optionally bridged to OpenTelemetry.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing, LogFormat};
