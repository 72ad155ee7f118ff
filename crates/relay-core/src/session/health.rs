//! Connectivity report.

use serde::Serialize;

use crate::error::{Error, ErrorKind};

/// Outcome of a connectivity test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionHealth {
    /// Account tested.
    pub account: String,
    /// True when login and inbox access succeeded.
    pub ok: bool,
    /// Wall time of the whole test.
    pub elapsed_ms: u64,
    /// Capabilities the server advertised after login.
    pub capabilities: Vec<String>,
    /// Messages in the inbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<u32>,
    /// Failure category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConnectionHealth {
    pub(crate) fn healthy(
        account: &str,
        elapsed_ms: u64,
        capabilities: Vec<String>,
        messages: u32,
    ) -> Self {
        Self {
            account: account.to_string(),
            ok: true,
            elapsed_ms,
            capabilities,
            messages: Some(messages),
            error_kind: None,
            message: None,
        }
    }

    pub(crate) fn failed(account: &str, elapsed_ms: u64, error: &Error) -> Self {
        Self {
            account: account.to_string(),
            ok: false,
            elapsed_ms,
            capabilities: Vec::new(),
            messages: None,
            error_kind: Some(error.kind()),
            message: Some(error.to_string()),
        }
    }
}
