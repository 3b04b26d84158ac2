//! Opaque, string-typed identifiers.
//!
//! Every entity in Hookflow is addressed by a string identifier. New
//! identifiers are UUID v7 (time-sortable) rendered as strings, but any
//! non-empty string supplied by a caller is accepted as-is. The empty string
//! is a distinguished invalid value.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh identifier (UUID v7).
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True if this is the distinguished empty (invalid) identifier.
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Owning tenant. All other records are scoped to exactly one tenant.
    TenantId
);
string_id!(
    /// A user-defined workflow.
    WorkflowId
);
string_id!(
    /// A declared tool.
    ToolId
);
string_id!(
    /// A single tool invocation record.
    ExecutionId
);
string_id!(
    /// A canonical inbound message.
    MessageId
);
string_id!(
    /// A messaging channel (WhatsApp number, Telegram bot, ...).
    ChannelId
);
