//! Notification dispatch example

use gstin_recon::utils::MemoryTransport;
use gstin_recon::{
    Dataset, DispatchStatus, NotificationDispatcher, ReconciliationRun, Record, SheetTable,
    SmtpCredentials, EMAIL_COLUMN, TAXABLE_VALUE_COLUMN, TRADE_NAME_COLUMN,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 GSTIN Recon - Notification Dispatch Example\n");

    // 1. Reconcile first; dispatch feeds on the comparison result
    println!("📊 Reconciling datasets...");
    let company = Dataset::new().with_sheet(
        "B2B",
        SheetTable::builder([TAXABLE_VALUE_COLUMN])
            .row(Record::new("29ABCDE1234F1Z5").with_field(TAXABLE_VALUE_COLUMN, 118000))
            .build()?,
    );
    let payments = Dataset::new().with_sheet(
        "B2B",
        SheetTable::builder([TAXABLE_VALUE_COLUMN, TRADE_NAME_COLUMN, EMAIL_COLUMN])
            .row(Record::new("29ABCDE1234F1Z5").with_field(TAXABLE_VALUE_COLUMN, 118000))
            .row(
                Record::new("27XYZAB5678G1H2")
                    .with_field(TAXABLE_VALUE_COLUMN, 23600)
                    .with_field(TRADE_NAME_COLUMN, "Acme Traders")
                    .with_field(EMAIL_COLUMN, "accounts@acmetraders.example"),
            )
            .row(
                Record::new("33PQRST9012M3N4")
                    .with_field(TAXABLE_VALUE_COLUMN, 9800)
                    .with_field(TRADE_NAME_COLUMN, "Zenith Metals")
                    .with_field(EMAIL_COLUMN, "billing@zenithmetals.example"),
            )
            .row(Record::new("19LMNOP3456Q7R8").with_field(TAXABLE_VALUE_COLUMN, 4500))
            .build()?,
    );

    let mut run = ReconciliationRun::new();
    run.reconcile(&company, &payments, TAXABLE_VALUE_COLUMN);

    let summary = run.summary().ok_or("reconciliation produced no output")?;
    println!(
        "  ✓ {} matched pairs, {} suppliers to notify\n",
        summary.total_matched, summary.total_unmatched_in_company
    );

    // 2. Dispatch notifications over an in-memory transport
    println!("✉️  Dispatching notifications...");
    let transport = MemoryTransport::new();
    transport.fail_recipient("billing@zenithmetals.example");

    let dispatcher = NotificationDispatcher::new(transport.clone());
    let credentials = SmtpCredentials::new("finance@example.com", "app-password");
    let report = run.dispatch_unmatched("B2B", &dispatcher, &credentials).await?;

    // 3. One outcome per unmatched supplier
    for outcome in &report.outcomes {
        match &outcome.status {
            DispatchStatus::Sent { message_id } => {
                println!("  ✓ {} notified (message {})", outcome.gstin, message_id)
            }
            DispatchStatus::Skipped { reason } => {
                println!("  ○ {} skipped: {}", outcome.gstin, reason)
            }
            DispatchStatus::Failed { detail } => {
                println!("  ✗ {} failed: {}", outcome.gstin, detail)
            }
        }
    }
    println!(
        "\n📈 Batch {}: {} sent, {} skipped, {} failed",
        report.batch_id, report.sent, report.skipped, report.failed
    );
    println!();

    // 4. What actually went out
    println!("📬 Delivered mail:");
    for message in transport.sent_messages() {
        println!("  From:    {}", message.from);
        println!("  To:      {}", message.to);
        println!("  Subject: {}", message.subject);
    }

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
