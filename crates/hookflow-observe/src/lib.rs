//! Observability setup shared by the Hookflow binaries.

pub mod tracing_setup;
