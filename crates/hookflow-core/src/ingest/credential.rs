//! Shared-secret validation for triggers.
//!
//! A trigger without a configured secret is public. Otherwise the provided
//! credential is taken from the first non-empty source, in this order:
//! 1. the `X-API-Key` header
//! 2. an `Authorization: Bearer <token>` header
//! 3. the `api_key` query parameter
//!
//! The comparison is a plain string equality, not constant-time.

use hookflow_types::workflow::TriggerConfig;

/// Header carrying the API key directly.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter carrying the API key.
pub const API_KEY_QUERY_PARAM: &str = "api_key";

const BEARER_PREFIX: &str = "Bearer ";

/// The places a request may carry a credential.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub api_key_header: Option<String>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    pub query_api_key: Option<String>,
}

impl CredentialSources {
    /// Resolve the provided credential. Empty values fall through to the
    /// next source; `None` when every source is empty.
    pub fn provided(&self) -> Option<&str> {
        let header = self.api_key_header.as_deref().filter(|v| !v.is_empty());
        let bearer = || {
            self.authorization
                .as_deref()
                .and_then(|v| v.strip_prefix(BEARER_PREFIX))
                .filter(|v| !v.is_empty())
        };
        let query = || self.query_api_key.as_deref().filter(|v| !v.is_empty());

        header.or_else(bearer).or_else(query)
    }
}

/// Check the request's credential against a trigger's configured secret.
pub fn validate_credential(config: &TriggerConfig, sources: &CredentialSources) -> bool {
    let Some(expected) = config.secret() else {
        return true;
    };

    match sources.provided() {
        Some(provided) => {
            let valid = provided == expected;
            if !valid {
                tracing::debug!(
                    expected_len = expected.len(),
                    provided_len = provided.len(),
                    "credential mismatch"
                );
            }
            valid
        }
        None => {
            tracing::debug!("no credential provided");
            false
        }
    }
}
