//! Tool execution engine.
//!
//! - [`schema`]: input validation against a tool's declared schema
//! - [`template`]: `{{key}}` placeholder rendering for bodies and emails
//! - [`backend`]: the per-type backend port and the EMAIL backend
//! - [`engine`]: config validation, timing and the execution record lifecycle
//! - [`service`]: tenant-scoped tool management on top of the engine

pub mod backend;
pub mod engine;
pub mod schema;
pub mod service;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;
