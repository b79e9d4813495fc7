//! Observability bootstrap for Agentgate.
//!
//! Gateway binaries call [`tracing_setup::init_tracing`] once at startup
//! and [`tracing_setup::shutdown_tracing`] before exit; everything else in
//! the workspace just emits `tracing` events.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing};
