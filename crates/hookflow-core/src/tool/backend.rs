//! Tool backend port.
//!
//! Each [`ToolType`](hookflow_types::tool::ToolType) executes through exactly
//! one [`ToolBackend`], parameterized by the config variant it consumes, so a
//! backend can only ever see the fields of its own type. HTTP, DATABASE and
//! CUSTOM backends live in hookflow-infra. The EMAIL backend lives here and
//! delegates the actual send to an [`EmailSender`] chosen by provider name.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};

use hookflow_types::error::ToolError;
use hookflow_types::tool::{CustomToolConfig, DatabaseToolConfig, EmailToolConfig, HttpToolConfig};

use super::template::render;

pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ToolError>> + Send + 'a>>;

/// Executes one tool type.
///
/// `budget` is the time the backend should allow itself. The engine enforces
/// an outer deadline as well, but a backend that honors the budget can report
/// a more precise error.
pub trait ToolBackend<C>: Send + Sync {
    fn execute<'a>(&'a self, config: &'a C, input: &'a Value, budget: Duration) -> BackendFuture<'a, Value>;
}

/// One backend per tool type.
#[derive(Clone)]
pub struct ToolBackends {
    pub http: Arc<dyn ToolBackend<HttpToolConfig>>,
    pub database: Arc<dyn ToolBackend<DatabaseToolConfig>>,
    pub email: Arc<dyn ToolBackend<EmailToolConfig>>,
    pub custom: Arc<dyn ToolBackend<CustomToolConfig>>,
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// A rendered email ready for a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A provider that delivers email. Returns the provider's message id.
///
/// Implementations report delivery failures as [`ToolError::External`].
pub trait EmailSender: Send + Sync {
    fn send<'a>(&'a self, email: &'a OutgoingEmail, budget: Duration) -> BackendFuture<'a, String>;
}

/// EMAIL backend: resolves the recipient, renders the template and hands the
/// result to the configured provider.
#[derive(Default, Clone)]
pub struct EmailBackend {
    senders: HashMap<String, Arc<dyn EmailSender>>,
}

impl EmailBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sender(mut self, provider: impl Into<String>, sender: Arc<dyn EmailSender>) -> Self {
        self.senders.insert(provider.into(), sender);
        self
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.senders.keys().map(String::as_str)
    }

    fn recipient(config: &EmailToolConfig, input: &Value) -> Result<String, ToolError> {
        if let Some(to) = config.to.as_deref().filter(|to| !to.is_empty()) {
            return Ok(to.to_string());
        }
        let field = config.to_field.as_deref().unwrap_or_default();
        input
            .get(field)
            .and_then(Value::as_str)
            .filter(|to| !to.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ToolError::Validation(format!("recipient field '{field}' missing from input")))
    }

    /// Configured variables overlaid with the input's top-level fields.
    fn variables(config: &EmailToolConfig, input: &Value) -> Map<String, Value> {
        let mut vars = config.variables.clone();
        if let Some(object) = input.as_object() {
            vars.extend(object.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        vars
    }
}

impl ToolBackend<EmailToolConfig> for EmailBackend {
    fn execute<'a>(
        &'a self,
        config: &'a EmailToolConfig,
        input: &'a Value,
        budget: Duration,
    ) -> BackendFuture<'a, Value> {
        Box::pin(async move {
            let sender = self.senders.get(&config.provider).ok_or_else(|| {
                ToolError::InvalidConfig(format!("unknown email provider '{}'", config.provider))
            })?;

            let to = Self::recipient(config, input)?;
            let vars = Self::variables(config, input);
            let email = OutgoingEmail {
                to,
                subject: render(&config.subject, &vars),
                body: render(&config.template, &vars),
            };

            let message_id = sender.send(&email, budget).await?;
            tracing::debug!(provider = %config.provider, message_id = %message_id, "email sent");

            Ok(json!({
                "provider": config.provider,
                "message_id": message_id,
                "to": email.to,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    impl EmailSender for Outbox {
        fn send<'a>(&'a self, email: &'a OutgoingEmail, _budget: Duration) -> BackendFuture<'a, String> {
            Box::pin(async move {
                if self.fail {
                    return Err(ToolError::External("provider returned 500".to_string()));
                }
                let mut sent = self.sent.lock().unwrap();
                sent.push(email.clone());
                Ok(format!("msg-{}", sent.len()))
            })
        }
    }

    fn config(to: Option<&str>, to_field: Option<&str>) -> EmailToolConfig {
        let mut variables = Map::new();
        variables.insert("company".to_string(), json!("Acme"));
        variables.insert("name".to_string(), json!("customer"));
        EmailToolConfig {
            provider: "outbox".to_string(),
            to: to.map(str::to_string),
            to_field: to_field.map(str::to_string),
            subject: "Order {{order_id}} from {{company}}".to_string(),
            template: "Hello {{name}}".to_string(),
            variables,
        }
    }

    #[tokio::test]
    async fn test_email_renders_and_sends() {
        let outbox = Arc::new(Outbox::default());
        let backend = EmailBackend::new().with_sender("outbox", outbox.clone());

        let output = backend
            .execute(
                &config(None, Some("email")),
                &json!({"email": "ada@example.com", "order_id": 7, "name": "Ada"}),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(output["provider"], json!("outbox"));
        assert_eq!(output["message_id"], json!("msg-1"));
        assert_eq!(output["to"], json!("ada@example.com"));

        let sent = outbox.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Order 7 from Acme");
        assert_eq!(sent[0].body, "Hello Ada");
    }

    #[tokio::test]
    async fn test_fixed_recipient_wins_over_field() {
        let outbox = Arc::new(Outbox::default());
        let backend = EmailBackend::new().with_sender("outbox", outbox.clone());
        let output = backend
            .execute(
                &config(Some("ops@example.com"), Some("email")),
                &json!({"email": "ada@example.com"}),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(output["to"], json!("ops@example.com"));
    }

    #[tokio::test]
    async fn test_missing_recipient_and_unknown_provider() {
        let backend = EmailBackend::new().with_sender("outbox", Arc::new(Outbox::default()));
        let err = backend
            .execute(&config(None, Some("email")), &json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));

        let mut cfg = config(Some("a@b.c"), None);
        cfg.provider = "carrier-pigeon".to_string();
        let err = backend.execute(&cfg, &json!({}), Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_is_external() {
        let backend = EmailBackend::new().with_sender(
            "outbox",
            Arc::new(Outbox {
                fail: true,
                ..Default::default()
            }),
        );
        let err = backend
            .execute(&config(Some("a@b.c"), None), &json!({}), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::External(_)));
    }
}
