//! Ingest service: the synchronous half of the trigger front door.
//!
//! Every check that can reject an event (lookup, ownership, active flag,
//! trigger type, credential) runs here before anything is dispatched. Once
//! an event is dispatched the caller only ever sees the acknowledgement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use hookflow_types::error::IngestError;
use hookflow_types::id::{ChannelId, MessageId, TenantId, WorkflowId};
use hookflow_types::message::IncomingMessage;
use hookflow_types::workflow::{TriggerType, Workflow};

use crate::ingest::credential::{CredentialSources, validate_credential};
use crate::ingest::dispatch::Dispatcher;
use crate::ingest::normalize::{WebhookRequest, build_webhook_payload, normalize_channel_message};
use crate::repository::channel::ChannelRepository;
use crate::repository::workflow::WorkflowRepository;
use crate::trigger::{MessageProcessor, TriggerHandler};

/// Immediate response to an accepted webhook. Never carries the processing result.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
    pub workflow_id: WorkflowId,
    pub accepted_at: DateTime<Utc>,
    pub dispatch_id: String,
}

/// Immediate response to an accepted channel message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageAck {
    pub status: &'static str,
    pub message_id: MessageId,
    pub accepted_at: DateTime<Utc>,
    pub dispatch_id: String,
}

const ACCEPTED: &str = "accepted";

/// Service that authenticates, normalizes and dispatches inbound events.
///
/// Generic over the lookup ports so hookflow-core never depends on
/// hookflow-infra.
pub struct IngestService<W: WorkflowRepository, C: ChannelRepository> {
    workflows: W,
    channels: C,
    dispatcher: Arc<Dispatcher>,
    trigger_handler: Arc<dyn TriggerHandler>,
    message_processor: Arc<dyn MessageProcessor>,
}

impl<W: WorkflowRepository, C: ChannelRepository> IngestService<W, C> {
    pub fn new(
        workflows: W,
        channels: C,
        dispatcher: Arc<Dispatcher>,
        trigger_handler: Arc<dyn TriggerHandler>,
        message_processor: Arc<dyn MessageProcessor>,
    ) -> Self {
        Self {
            workflows,
            channels,
            dispatcher,
            trigger_handler,
            message_processor,
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Authenticate a webhook, build its payload and dispatch it.
    pub async fn accept_webhook(
        &self,
        tenant_id: &TenantId,
        workflow_id: &WorkflowId,
        request: &WebhookRequest,
        credentials: &CredentialSources,
    ) -> Result<WebhookAck, IngestError> {
        let workflow = self.authorize_webhook(tenant_id, workflow_id, credentials).await?;
        let payload = build_webhook_payload(
            tenant_id,
            workflow_id,
            request,
            &workflow.trigger.config.include_fields,
        );

        let handler = Arc::clone(&self.trigger_handler);
        let (tenant, target) = (tenant_id.clone(), workflow_id.clone());
        let ctx = self.dispatcher.dispatch("webhook", move |ctx| async move {
            handler.handle_trigger(ctx, tenant, target, payload).await
        })?;

        tracing::info!(
            tenant_id = %tenant_id,
            workflow_id = %workflow_id,
            dispatch_id = %ctx.dispatch_id,
            "webhook accepted"
        );

        Ok(WebhookAck {
            status: ACCEPTED,
            workflow_id: workflow_id.clone(),
            accepted_at: ctx.accepted_at,
            dispatch_id: ctx.dispatch_id,
        })
    }

    /// Run the same checks as [`IngestService::accept_webhook`] and return the
    /// payload that would be dispatched, without dispatching it.
    pub async fn preview_webhook(
        &self,
        tenant_id: &TenantId,
        workflow_id: &WorkflowId,
        request: &WebhookRequest,
        credentials: &CredentialSources,
    ) -> Result<Map<String, Value>, IngestError> {
        let workflow = self.authorize_webhook(tenant_id, workflow_id, credentials).await?;
        tracing::debug!(tenant_id = %tenant_id, workflow_id = %workflow_id, "webhook dry run");
        Ok(build_webhook_payload(
            tenant_id,
            workflow_id,
            request,
            &workflow.trigger.config.include_fields,
        ))
    }

    /// Normalize a provider message for a tenant's channel and dispatch it.
    pub async fn accept_channel_message(
        &self,
        tenant_id: &TenantId,
        channel_id: &ChannelId,
        incoming: IncomingMessage,
    ) -> Result<MessageAck, IngestError> {
        if tenant_id.is_empty() || channel_id.is_empty() {
            return Err(IngestError::Validation("tenant_id and channel_id are required".to_string()));
        }

        let channel = self
            .channels
            .find_channel(tenant_id, channel_id)
            .await?
            .ok_or_else(|| IngestError::ChannelNotFound(channel_id.clone()))?;

        if &channel.tenant_id != tenant_id {
            tracing::warn!(tenant_id = %tenant_id, channel_id = %channel_id, "channel tenant mismatch");
            return Err(IngestError::Forbidden("channel belongs to another tenant".to_string()));
        }
        if !channel.is_active {
            return Err(IngestError::ChannelInactive);
        }

        let message = normalize_channel_message(&channel, incoming);
        let message_id = message.id.clone();

        let processor = Arc::clone(&self.message_processor);
        let ctx = self.dispatcher.dispatch("channel_message", move |ctx| async move {
            processor.process_message(ctx, message).await
        })?;

        tracing::info!(
            tenant_id = %tenant_id,
            channel_id = %channel_id,
            message_id = %message_id,
            dispatch_id = %ctx.dispatch_id,
            "channel message accepted"
        );

        Ok(MessageAck {
            status: ACCEPTED,
            message_id,
            accepted_at: ctx.accepted_at,
            dispatch_id: ctx.dispatch_id,
        })
    }

    async fn authorize_webhook(
        &self,
        tenant_id: &TenantId,
        workflow_id: &WorkflowId,
        credentials: &CredentialSources,
    ) -> Result<Workflow, IngestError> {
        if tenant_id.is_empty() || workflow_id.is_empty() {
            return Err(IngestError::Validation("tenant_id and workflow_id are required".to_string()));
        }

        let workflow = self
            .workflows
            .find_workflow(tenant_id, workflow_id)
            .await?
            .ok_or_else(|| IngestError::WorkflowNotFound(workflow_id.clone()))?;

        if &workflow.tenant_id != tenant_id {
            tracing::warn!(tenant_id = %tenant_id, workflow_id = %workflow_id, "workflow tenant mismatch");
            return Err(IngestError::Forbidden("workflow belongs to another tenant".to_string()));
        }
        if !workflow.is_active {
            return Err(IngestError::WorkflowInactive);
        }
        if workflow.trigger.trigger_type != TriggerType::Webhook {
            return Err(IngestError::Validation(format!(
                "workflow trigger is '{}', not webhook",
                workflow.trigger.trigger_type
            )));
        }

        if !validate_credential(&workflow.trigger.config, credentials) {
            tracing::warn!(tenant_id = %tenant_id, workflow_id = %workflow_id, "webhook credential rejected");
            return Err(IngestError::Unauthorized);
        }

        Ok(workflow)
    }
}
