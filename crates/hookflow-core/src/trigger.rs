//! Downstream collaborators of the trigger front door.
//!
//! The ingest service hands accepted work to a [`TriggerHandler`] (webhook
//! payloads) or a [`MessageProcessor`] (normalized channel messages). Both run
//! inside a dispatched task, so their failures are logged and never reach the
//! caller that produced the event.
//!
//! The traits return boxed futures so the service can hold them as
//! `Arc<dyn ...>` and swap implementations at startup.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};

use hookflow_types::id::{TenantId, WorkflowId};
use hookflow_types::message::Message;

use crate::ingest::dispatch::DispatchContext;

/// Failure inside a downstream handler.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("processing failed: {0}")]
    Failed(String),

    #[error("processing cancelled")]
    Cancelled,
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ProcessingError>> + Send + 'a>>;

/// Runs a workflow for a webhook payload.
pub trait TriggerHandler: Send + Sync {
    fn handle_trigger<'a>(
        &'a self,
        ctx: DispatchContext,
        tenant_id: TenantId,
        workflow_id: WorkflowId,
        payload: Map<String, Value>,
    ) -> HandlerFuture<'a>;
}

/// Routes a normalized message into the engine.
pub trait MessageProcessor: Send + Sync {
    fn process_message<'a>(&'a self, ctx: DispatchContext, message: Message) -> HandlerFuture<'a>;
}

// ---------------------------------------------------------------------------
// Logging defaults
// ---------------------------------------------------------------------------

/// Handler that only records the trigger. Used when no workflow engine is wired.
#[derive(Debug, Default, Clone)]
pub struct LoggingTriggerHandler;

impl TriggerHandler for LoggingTriggerHandler {
    fn handle_trigger<'a>(
        &'a self,
        ctx: DispatchContext,
        tenant_id: TenantId,
        workflow_id: WorkflowId,
        payload: Map<String, Value>,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            tracing::info!(
                dispatch_id = %ctx.dispatch_id,
                tenant_id = %tenant_id,
                workflow_id = %workflow_id,
                keys = payload.len(),
                "webhook trigger received"
            );
            Ok(())
        })
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoggingMessageProcessor;

impl MessageProcessor for LoggingMessageProcessor {
    fn process_message<'a>(&'a self, ctx: DispatchContext, message: Message) -> HandlerFuture<'a> {
        Box::pin(async move {
            tracing::info!(
                dispatch_id = %ctx.dispatch_id,
                tenant_id = %message.tenant_id,
                message_id = %message.id,
                content_type = %message.content.content_type,
                "channel message received"
            );
            Ok(())
        })
    }
}
