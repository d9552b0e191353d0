//! Request-scoped reconciliation workflow
//!
//! One [`ReconciliationRun`] carries the state of a single request: the
//! alignment output lives here from the compare step until the request
//! ends, and dispatch is only reachable once that state exists. Nothing
//! is shared across requests.

use tracing::info;

use crate::notification::{
    CancelFlag, DispatchError, DispatchReport, DispatchResult, NotificationDispatcher,
};
use crate::reconciliation::{align, AlignOutput, ReconciliationSummary};
use crate::traits::{MailTransport, SmtpCredentials};
use crate::types::Dataset;

/// State of one reconciliation request, from compare to dispatch
#[derive(Debug, Default)]
pub struct ReconciliationRun {
    output: Option<AlignOutput>,
}

impl ReconciliationRun {
    /// Start a run with no comparison yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the aligner and keep its output for this request
    pub fn reconcile(
        &mut self,
        company: &Dataset,
        payments: &Dataset,
        value_column: &str,
    ) -> &AlignOutput {
        let output = align(company, payments, value_column);
        info!(
            "reconciliation compared {} sheets ({} skipped)",
            output.sheets.len(),
            output.skipped.len()
        );
        self.output.insert(output)
    }

    /// The stored alignment output, if a comparison has run
    pub fn output(&self) -> Option<&AlignOutput> {
        self.output.as_ref()
    }

    /// Roll-up summary of the stored comparison
    pub fn summary(&self) -> Option<ReconciliationSummary> {
        self.output.as_ref().map(AlignOutput::summarize)
    }

    /// Dispatch notifications for one sheet's unmatched-in-company rows.
    ///
    /// Rejected with [`DispatchError::MissingPrerequisite`] when no
    /// comparison has run yet, or when the named sheet was not part of
    /// the comparison (absent or skipped), so a host cannot send from
    /// stale or missing state.
    pub async fn dispatch_unmatched<T: MailTransport>(
        &self,
        sheet: &str,
        dispatcher: &NotificationDispatcher<T>,
        credentials: &SmtpCredentials,
    ) -> DispatchResult<DispatchReport> {
        self.dispatch_unmatched_with_cancel(sheet, dispatcher, credentials, &CancelFlag::new())
            .await
    }

    /// As [`dispatch_unmatched`](Self::dispatch_unmatched), with a
    /// cooperative cancel flag checked between records
    pub async fn dispatch_unmatched_with_cancel<T: MailTransport>(
        &self,
        sheet: &str,
        dispatcher: &NotificationDispatcher<T>,
        credentials: &SmtpCredentials,
        cancel: &CancelFlag,
    ) -> DispatchResult<DispatchReport> {
        let output = self.output.as_ref().ok_or_else(|| {
            DispatchError::MissingPrerequisite(
                "reconcile the datasets before dispatching notifications".to_string(),
            )
        })?;

        let result = output.sheet(sheet).ok_or_else(|| {
            DispatchError::MissingPrerequisite(format!(
                "sheet '{}' was not part of the comparison; nothing to dispatch",
                sheet
            ))
        })?;

        dispatcher
            .dispatch_with_cancel(&result.unmatched_in_company, credentials, cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Record, SheetTableBuilder, EMAIL_COLUMN, TAXABLE_VALUE_COLUMN};
    use crate::utils::memory_transport::MemoryTransport;

    fn datasets() -> (Dataset, Dataset) {
        let company = SheetTableBuilder::new([TAXABLE_VALUE_COLUMN])
            .row(Record::new("29ABCDE1234F1Z5").with_field(TAXABLE_VALUE_COLUMN, 1000))
            .build()
            .unwrap();
        let payments = SheetTableBuilder::new([TAXABLE_VALUE_COLUMN, EMAIL_COLUMN])
            .row(Record::new("29ABCDE1234F1Z5").with_field(TAXABLE_VALUE_COLUMN, 1000))
            .row(
                Record::new("27XYZAB5678G1H2")
                    .with_field(TAXABLE_VALUE_COLUMN, 500)
                    .with_field(EMAIL_COLUMN, "vendor@example.com"),
            )
            .build()
            .unwrap();

        (
            Dataset::new().with_sheet("B2B", company),
            Dataset::new().with_sheet("B2B", payments),
        )
    }

    fn credentials() -> SmtpCredentials {
        SmtpCredentials::new("finance@example.com", "app-password")
    }

    #[tokio::test]
    async fn test_dispatch_before_reconcile_is_rejected() {
        let run = ReconciliationRun::new();
        let dispatcher = NotificationDispatcher::new(MemoryTransport::new());

        let result = run
            .dispatch_unmatched("B2B", &dispatcher, &credentials())
            .await;

        assert!(matches!(
            result,
            Err(DispatchError::MissingPrerequisite(ref message)) if message.contains("reconcile")
        ));
    }

    #[tokio::test]
    async fn test_dispatch_for_uncompared_sheet_is_rejected() {
        let (company, payments) = datasets();
        let mut run = ReconciliationRun::new();
        run.reconcile(&company, &payments, TAXABLE_VALUE_COLUMN);
        let dispatcher = NotificationDispatcher::new(MemoryTransport::new());

        let result = run
            .dispatch_unmatched("Exports", &dispatcher, &credentials())
            .await;

        assert!(matches!(
            result,
            Err(DispatchError::MissingPrerequisite(ref message)) if message.contains("Exports")
        ));
    }

    #[tokio::test]
    async fn test_dispatch_for_skipped_sheet_is_rejected() {
        // B2B is common but the company side lacks the value column, so
        // the comparison skips it; dispatch must treat it as uncompared
        let company_sheet = SheetTableBuilder::new([EMAIL_COLUMN])
            .row(Record::new("29ABCDE1234F1Z5").with_field(EMAIL_COLUMN, "a@b.com"))
            .build()
            .unwrap();
        let payments_sheet = SheetTableBuilder::new([TAXABLE_VALUE_COLUMN, EMAIL_COLUMN])
            .row(
                Record::new("27XYZAB5678G1H2")
                    .with_field(TAXABLE_VALUE_COLUMN, 500)
                    .with_field(EMAIL_COLUMN, "vendor@example.com"),
            )
            .build()
            .unwrap();
        let company = Dataset::new().with_sheet("B2B", company_sheet);
        let payments = Dataset::new().with_sheet("B2B", payments_sheet);

        let mut run = ReconciliationRun::new();
        run.reconcile(&company, &payments, TAXABLE_VALUE_COLUMN);
        assert_eq!(run.output().unwrap().skipped.len(), 1);

        let transport = MemoryTransport::new();
        let dispatcher = NotificationDispatcher::new(transport.clone());
        let result = run
            .dispatch_unmatched("B2B", &dispatcher, &credentials())
            .await;

        assert!(matches!(
            result,
            Err(DispatchError::MissingPrerequisite(ref message)) if message.contains("B2B")
        ));
        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_then_dispatch() {
        let (company, payments) = datasets();
        let mut run = ReconciliationRun::new();
        run.reconcile(&company, &payments, TAXABLE_VALUE_COLUMN);

        let transport = MemoryTransport::new();
        let dispatcher = NotificationDispatcher::new(transport.clone());
        let report = run
            .dispatch_unmatched("B2B", &dispatcher, &credentials())
            .await
            .unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(report.sent_gstins(), vec!["27XYZAB5678G1H2"]);
        assert_eq!(transport.sent_messages()[0].to, "vendor@example.com");

        let summary = run.summary().unwrap();
        assert_eq!(summary.total_matched, 1);
        assert_eq!(summary.total_unmatched_in_company, 1);
    }
}
