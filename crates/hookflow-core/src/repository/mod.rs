//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (hookflow-infra) implements. The core crate never depends on any
//! specific storage technology. Every lookup is tenant-scoped: a record
//! owned by another tenant is reported exactly like a missing one.

pub mod channel;
pub mod execution;
pub mod tool;
pub mod workflow;
