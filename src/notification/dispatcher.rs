//! Batch dispatch of missing-invoice notifications
//!
//! One dispatch call is one batch: authenticate once, then walk the
//! unmatched records in order, attempting at most one send per record.
//! Record-level problems (no usable address, a refused delivery) are
//! captured as outcomes and never stop the batch; only a credential
//! rejection aborts the whole call.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::notification::message::NotificationMessage;
use crate::traits::{AuthError, MailSession, MailTransport, SmtpCredentials, TransportOptions};
use crate::types::{Record, EMAIL_COLUMN};
use crate::utils::validation::is_well_formed_email;

/// Why a record was skipped without a send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipCause {
    /// The email field was absent, empty, or not a plausible address
    NoValidEmail,
}

impl fmt::Display for SkipCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCause::NoValidEmail => write!(f, "no valid email"),
        }
    }
}

/// Terminal state of one record within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DispatchStatus {
    /// The transport acknowledged delivery
    Sent { message_id: Uuid },
    /// No send was attempted
    Skipped { reason: SkipCause },
    /// The transport failed or refused the send
    Failed { detail: String },
}

impl DispatchStatus {
    /// Whether this record's message was acknowledged by the transport
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchStatus::Sent { .. })
    }
}

/// Outcome for one input record; a batch yields exactly one per record
/// processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub gstin: String,
    pub status: DispatchStatus,
    pub attempted_at: NaiveDateTime,
}

/// Batch-level result: every outcome plus roll-up counts
///
/// The counts are derived from `outcomes` as records are processed and
/// always agree with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub batch_id: Uuid,
    pub run_at: NaiveDateTime,
    pub outcomes: Vec<DispatchOutcome>,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
    /// True when a cancel request stopped the batch with records left
    pub cancelled: bool,
}

impl DispatchReport {
    fn started() -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            run_at: Utc::now().naive_utc(),
            outcomes: Vec::new(),
            sent: 0,
            skipped: 0,
            failed: 0,
            cancelled: false,
        }
    }

    fn record(&mut self, outcome: DispatchOutcome) {
        match &outcome.status {
            DispatchStatus::Sent { .. } => self.sent += 1,
            DispatchStatus::Skipped { .. } => self.skipped += 1,
            DispatchStatus::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Keys the transport acknowledged in this batch.
    ///
    /// The dispatcher keeps no memory across invocations; a host that
    /// wants re-send protection persists these keys and withholds the
    /// corresponding records from its next batch.
    pub fn sent_gstins(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status.is_sent())
            .map(|outcome| outcome.gstin.as_str())
            .collect()
    }
}

/// Errors that abort a dispatch batch as a whole
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Credentials rejected before any send was attempted
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Dispatch was invoked out of order
    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Cooperative stop signal checked between records
///
/// Clones share the underlying flag, so a host can hand one clone to
/// the dispatch call and keep another to raise from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a flag in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop before the next record
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Drives a mail transport through one notification batch at a time
pub struct NotificationDispatcher<T: MailTransport> {
    transport: T,
    options: TransportOptions,
}

impl<T: MailTransport> NotificationDispatcher<T> {
    /// Create a dispatcher with default transport options
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            options: TransportOptions::default(),
        }
    }

    /// Create a dispatcher with explicit transport options
    pub fn with_options(transport: T, options: TransportOptions) -> Self {
        Self { transport, options }
    }

    /// Options handed to the transport at authentication time
    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Notify every record in the batch, one attempt per record.
    ///
    /// Returns one [`DispatchOutcome`] per input record. Fails only on
    /// credential rejection, in which case nothing was sent.
    pub async fn dispatch(
        &self,
        rows: &[Record],
        credentials: &SmtpCredentials,
    ) -> DispatchResult<DispatchReport> {
        self.dispatch_with_cancel(rows, credentials, &CancelFlag::new())
            .await
    }

    /// As [`dispatch`](Self::dispatch), but stopping between records
    /// once `cancel` is raised. Outcomes already produced are kept and
    /// the report comes back marked cancelled.
    pub async fn dispatch_with_cancel(
        &self,
        rows: &[Record],
        credentials: &SmtpCredentials,
        cancel: &CancelFlag,
    ) -> DispatchResult<DispatchReport> {
        let mut session = self
            .transport
            .authenticate(credentials, &self.options)
            .await?;

        let mut report = DispatchReport::started();
        info!(
            "dispatch batch {} started: {} unmatched records",
            report.batch_id,
            rows.len()
        );

        for record in rows {
            if cancel.is_cancelled() {
                warn!(
                    "dispatch batch {} cancelled after {} of {} records",
                    report.batch_id,
                    report.outcomes.len(),
                    rows.len()
                );
                report.cancelled = true;
                break;
            }
            let outcome = self.send_one(&mut session, record).await;
            report.record(outcome);
        }

        info!(
            "dispatch batch {} finished: {} sent, {} skipped, {} failed",
            report.batch_id, report.sent, report.skipped, report.failed
        );
        Ok(report)
    }

    async fn send_one(&self, session: &mut T::Session, record: &Record) -> DispatchOutcome {
        let email = record.text(EMAIL_COLUMN).map(str::trim).unwrap_or("");
        if !is_well_formed_email(email) {
            warn!("no valid email for GSTIN {}; record skipped", record.gstin);
            return DispatchOutcome {
                gstin: record.gstin.clone(),
                status: DispatchStatus::Skipped {
                    reason: SkipCause::NoValidEmail,
                },
                attempted_at: Utc::now().naive_utc(),
            };
        }

        let message = NotificationMessage::for_record(record, email);
        let status = match session
            .send(&message.to, &message.subject, &message.body)
            .await
        {
            Ok(ack) => {
                info!("notification sent to {} for GSTIN {}", message.to, record.gstin);
                DispatchStatus::Sent {
                    message_id: ack.message_id,
                }
            }
            Err(error) => {
                warn!(
                    "send to {} failed for GSTIN {}: {}",
                    message.to, record.gstin, error
                );
                DispatchStatus::Failed {
                    detail: error.to_string(),
                }
            }
        };

        DispatchOutcome {
            gstin: record.gstin.clone(),
            status,
            attempted_at: Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TRADE_NAME_COLUMN;
    use crate::utils::memory_transport::MemoryTransport;

    fn unmatched(gstin: &str, email: Option<&str>) -> Record {
        let record = Record::new(gstin).with_field(TRADE_NAME_COLUMN, "Acme Traders");
        match email {
            Some(address) => record.with_field(EMAIL_COLUMN, address),
            None => record,
        }
    }

    fn credentials() -> SmtpCredentials {
        SmtpCredentials::new("finance@example.com", "app-password")
    }

    #[tokio::test]
    async fn test_every_record_yields_an_outcome() {
        let transport = MemoryTransport::new();
        let dispatcher = NotificationDispatcher::new(transport.clone());
        let rows = vec![
            unmatched("27XYZAB5678G1H2", Some("vendor@example.com")),
            unmatched("07FGHIJ5678K2Z3", None),
            unmatched("33PQRST9012M3N4", Some("other@example.com")),
        ];

        let report = dispatcher.dispatch(&rows, &credentials()).await.unwrap();

        assert_eq!(report.outcomes.len(), rows.len());
        assert_eq!(report.sent, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert!(!report.cancelled);
        assert!(matches!(
            report.outcomes[1].status,
            DispatchStatus::Skipped {
                reason: SkipCause::NoValidEmail
            }
        ));
        assert_eq!(transport.sent_messages().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_email_skips_without_attempting() {
        let transport = MemoryTransport::new();
        let dispatcher = NotificationDispatcher::new(transport.clone());
        let rows = vec![unmatched("27XYZAB5678G1H2", Some(""))];

        let report = dispatcher.dispatch(&rows, &credentials()).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_with_no_outcomes() {
        let transport = MemoryTransport::new();
        transport.reject_credentials();
        let dispatcher = NotificationDispatcher::new(transport.clone());
        let rows = vec![unmatched("27XYZAB5678G1H2", Some("vendor@example.com"))];

        let result = dispatcher.dispatch(&rows, &credentials()).await;

        assert!(matches!(result, Err(DispatchError::Auth(_))));
        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_does_not_stop_the_batch() {
        let transport = MemoryTransport::new();
        transport.fail_recipient("bad@example.com");
        let dispatcher = NotificationDispatcher::new(transport.clone());
        let rows = vec![
            unmatched("27XYZAB5678G1H2", Some("bad@example.com")),
            unmatched("33PQRST9012M3N4", Some("good@example.com")),
        ];

        let report = dispatcher.dispatch(&rows, &credentials()).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 1);
        assert!(matches!(
            &report.outcomes[0].status,
            DispatchStatus::Failed { detail } if detail.contains("bad@example.com")
        ));
        assert_eq!(report.sent_gstins(), vec!["33PQRST9012M3N4"]);
    }

    #[tokio::test]
    async fn test_cancel_stops_before_the_next_record() {
        let transport = MemoryTransport::new();
        let dispatcher = NotificationDispatcher::new(transport.clone());
        let cancel = CancelFlag::new();
        cancel.cancel();
        let rows = vec![unmatched("27XYZAB5678G1H2", Some("vendor@example.com"))];

        let report = dispatcher
            .dispatch_with_cancel(&rows, &credentials(), &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert!(transport.sent_messages().is_empty());
    }
}
