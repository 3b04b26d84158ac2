//! Workflow and trigger types.
//!
//! Workflow CRUD lives outside this subsystem; the ingest path only needs a
//! workflow's owner, its active flag and its trigger. Trigger config arrives
//! as a free-form JSON map and is validated into [`TriggerConfig`] when a
//! workflow is loaded or saved, never per request.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WorkflowError;
use crate::id::{TenantId, WorkflowId};

/// A user-defined workflow, as seen by the trigger front door.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub tenant_id: TenantId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub trigger: Trigger,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create an active workflow with the given trigger.
    pub fn new(tenant_id: TenantId, name: impl Into<String>, trigger: Trigger) -> Self {
        let now = Utc::now();
        Self {
            id: WorkflowId::generate(),
            tenant_id,
            name: name.into(),
            description: None,
            is_active: true,
            trigger,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.name.trim().is_empty() {
            return Err(WorkflowError::Invalid("name must not be empty".to_string()));
        }
        if self.tenant_id.is_empty() {
            return Err(WorkflowError::Invalid("tenant_id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// The event source that starts a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub config: TriggerConfig,
}

impl Trigger {
    /// A webhook trigger with the given config.
    pub fn webhook(config: TriggerConfig) -> Self {
        Self {
            trigger_type: TriggerType::Webhook,
            config,
        }
    }

    /// Build a trigger from a raw type string and a free-form config map.
    ///
    /// This is the load/update-time validation point: a config whose
    /// `api_key` is not a string, or whose `include_fields` is not a list of
    /// strings, is rejected here.
    pub fn from_raw(trigger_type: &str, config: Map<String, Value>) -> Result<Self, WorkflowError> {
        let trigger_type = trigger_type
            .parse::<TriggerType>()
            .map_err(WorkflowError::InvalidTriggerConfig)?;
        let config = TriggerConfig::from_map(config)?;
        Ok(Self {
            trigger_type,
            config,
        })
    }
}

/// How a workflow is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Webhook,
    Schedule,
    Manual,
    Channel,
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerType::Webhook => write!(f, "webhook"),
            TriggerType::Schedule => write!(f, "schedule"),
            TriggerType::Manual => write!(f, "manual"),
            TriggerType::Channel => write!(f, "channel"),
        }
    }
}

impl FromStr for TriggerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "webhook" => Ok(TriggerType::Webhook),
            "schedule" => Ok(TriggerType::Schedule),
            "manual" => Ok(TriggerType::Manual),
            "channel" => Ok(TriggerType::Channel),
            other => Err(format!("unknown trigger type: '{other}'")),
        }
    }
}

/// Typed trigger configuration.
///
/// `api_key` absent or empty means the trigger is public. Keys this type
/// does not know are kept in `extra` so that saving a workflow never drops
/// configuration owned by other parts of the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_fields: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TriggerConfig {
    /// Validate a free-form map against the fixed trigger schema.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, WorkflowError> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| WorkflowError::InvalidTriggerConfig(e.to_string()))
    }

    /// The configured shared secret, if one is set and non-empty.
    pub fn secret(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}
