//! Traits for the outgoing mail transport seam
//!
//! The crate never speaks SMTP itself. Hosts plug in a [`MailTransport`]
//! implementation (a real SMTP client, a relay API, or the in-memory
//! double from `utils`) and the dispatcher drives it through these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Default upper bound applied to each individual send attempt.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Sender identity and secret used to open a transport session.
///
/// The secret is redacted from `Debug` output so credentials can be
/// carried inside request structs without leaking into logs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SmtpCredentials {
    /// Sender address, also used as the login name
    pub address: String,
    /// Application password or token for the sender account
    pub secret: String,
}

impl SmtpCredentials {
    /// Create credentials for the given sender address
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Settings a transport must honor for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportOptions {
    /// Bound on how long a single send may block before the transport
    /// gives up and reports a failure for that message
    pub send_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// Receipt returned by a transport for one delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendAck {
    /// Transport-assigned identifier for the delivered message
    pub message_id: Uuid,
}

/// Credentials were rejected before any message was attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication rejected: {0}")]
pub struct AuthError(pub String);

/// The transport failed or refused one specific send.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("send failed: {0}")]
pub struct SendError(pub String);

/// Factory for authenticated mail sessions.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Session type handed out after successful authentication
    type Session: MailSession;

    /// Open a session for the given credentials.
    ///
    /// A rejection here is fatal for the whole batch; no per-message
    /// work happens until a session exists.
    async fn authenticate(
        &self,
        credentials: &SmtpCredentials,
        options: &TransportOptions,
    ) -> Result<Self::Session, AuthError>;
}

/// An authenticated channel that can deliver messages one at a time.
#[async_trait]
pub trait MailSession: Send + Sync {
    /// Deliver a single message. One call is exactly one attempt;
    /// retry policy belongs to the caller, not the session.
    async fn send(&mut self, to: &str, subject: &str, body: &str) -> Result<SendAck, SendError>;
}
