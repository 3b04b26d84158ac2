//! Business logic and port definitions for Hookflow.
//!
//! This crate defines the "ports" (repository and collaborator traits) that
//! the infrastructure layer implements, plus the two engines of the system:
//! the trigger front door (`ingest`) and the tool execution engine (`tool`).
//! It depends only on `hookflow-types` -- never on `hookflow-infra` or any
//! database/IO crate.

pub mod ingest;
pub mod repository;
pub mod tool;
pub mod trigger;
