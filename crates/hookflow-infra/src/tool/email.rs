//! Email provider adapter.
//!
//! Every configured provider is a JSON-over-HTTP API: the message is POSTed
//! to the provider endpoint with an optional bearer key, and the provider's
//! message id is read back from the response.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use hookflow_core::tool::backend::{BackendFuture, EmailBackend, EmailSender, OutgoingEmail};
use hookflow_types::config::EmailProviderConfig;
use hookflow_types::error::ToolError;

pub struct HttpEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    from: String,
}

impl HttpEmailSender {
    pub fn new(client: reqwest::Client, config: &EmailProviderConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().map(SecretString::from),
            from: config.from.clone(),
        }
    }
}

impl EmailSender for HttpEmailSender {
    fn send<'a>(&'a self, email: &'a OutgoingEmail, budget: Duration) -> BackendFuture<'a, String> {
        Box::pin(async move {
            let mut request = self
                .client
                .post(&self.endpoint)
                .timeout(budget)
                .json(&json!({
                    "from": self.from,
                    "to": email.to,
                    "subject": email.subject,
                    "body": email.body,
                }));
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key.expose_secret());
            }

            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout(budget)
                } else {
                    ToolError::External(format!("email provider unreachable: {e}"))
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(ToolError::External(format!(
                    "email provider returned HTTP {}",
                    status.as_u16()
                )));
            }

            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message_id = ["message_id", "MessageID", "id"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

            tracing::debug!(to = %email.to, %message_id, "email accepted by provider");
            Ok(message_id)
        })
    }
}

/// Register one HTTP sender per configured provider.
pub fn build_email_backend(providers: &[EmailProviderConfig], client: reqwest::Client) -> EmailBackend {
    providers.iter().fold(EmailBackend::new(), |backend, provider| {
        backend.with_sender(
            provider.name.clone(),
            Arc::new(HttpEmailSender::new(client.clone(), provider)),
        )
    })
}
