//! HTTP request handlers.

pub mod channel;
pub mod health;
pub mod tool;
pub mod webhook;
