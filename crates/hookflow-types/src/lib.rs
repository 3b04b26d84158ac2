//! Shared domain types for Hookflow.
//!
//! This crate contains the core domain types used across the Hookflow platform:
//! tenant-scoped identifiers, workflows and their triggers, tools and their
//! execution records, the canonical inbound message, and the error types
//! shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod id;
pub mod message;
pub mod tool;
pub mod workflow;
