//! HTTP surface for Hookflow.
//!
//! Public trigger endpoints under `/webhooks`, management and channel
//! endpoints under `/api/v1`, plus `/health`.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
