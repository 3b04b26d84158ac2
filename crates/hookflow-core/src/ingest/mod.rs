//! The trigger front door.
//!
//! Inbound events pass credential validation, get normalized into either an
//! enriched webhook payload or a canonical [`Message`](hookflow_types::message::Message),
//! and are handed to a detached task by the [`dispatch::Dispatcher`].

pub mod credential;
pub mod dispatch;
pub mod normalize;
pub mod service;
