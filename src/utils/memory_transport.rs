//! In-memory mail transport for testing and demos

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::traits::*;

/// One message captured by [`MemoryTransport`], in delivery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Authenticated sender address
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// In-memory transport implementation for testing and development
///
/// Clones share state, so a test can keep one handle for inspection
/// while the dispatcher owns another.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    state: Arc<RwLock<TransportState>>,
}

#[derive(Debug)]
struct TransportState {
    reject_credentials: bool,
    failing_recipients: HashSet<String>,
    sent: Vec<SentMessage>,
}

impl MemoryTransport {
    /// Create a transport that accepts every credential and delivery
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TransportState {
                reject_credentials: false,
                failing_recipients: HashSet::new(),
                sent: Vec::new(),
            })),
        }
    }

    /// Reject every authentication attempt from now on
    pub fn reject_credentials(&self) {
        self.state.write().unwrap().reject_credentials = true;
    }

    /// Refuse every send addressed to `recipient` from now on
    pub fn fail_recipient(&self, recipient: impl Into<String>) {
        self.state
            .write()
            .unwrap()
            .failing_recipients
            .insert(recipient.into());
    }

    /// Messages delivered so far
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.read().unwrap().sent.clone()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap();
        state.reject_credentials = false;
        state.failing_recipients.clear();
        state.sent.clear();
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Session handed out by [`MemoryTransport`]
#[derive(Debug)]
pub struct MemorySession {
    from: String,
    state: Arc<RwLock<TransportState>>,
}

#[async_trait]
impl MailTransport for MemoryTransport {
    type Session = MemorySession;

    async fn authenticate(
        &self,
        credentials: &SmtpCredentials,
        _options: &TransportOptions,
    ) -> Result<Self::Session, AuthError> {
        if self.state.read().unwrap().reject_credentials {
            return Err(AuthError(format!(
                "credentials rejected for '{}'",
                credentials.address
            )));
        }

        Ok(MemorySession {
            from: credentials.address.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl MailSession for MemorySession {
    async fn send(&mut self, to: &str, subject: &str, body: &str) -> Result<SendAck, SendError> {
        let mut state = self.state.write().unwrap();

        if state.failing_recipients.contains(to) {
            return Err(SendError(format!("delivery to '{}' refused", to)));
        }

        state.sent.push(SentMessage {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });

        Ok(SendAck {
            message_id: Uuid::new_v4(),
        })
    }
}
