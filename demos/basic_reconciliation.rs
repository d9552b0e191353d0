//! Basic reconciliation example

use gstin_recon::{
    align, ComparisonFilter, Dataset, Record, SheetTable, EMAIL_COLUMN, TAXABLE_VALUE_COLUMN,
    TRADE_NAME_COLUMN,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 GSTIN Recon - Basic Reconciliation Example\n");

    // 1. Build the two datasets the way a spreadsheet import would
    println!("📊 Loading datasets...");
    let company = Dataset::new()
        .with_sheet(
            "B2B",
            SheetTable::builder([TAXABLE_VALUE_COLUMN])
                .row(Record::new("29ABCDE1234F1Z5").with_field(TAXABLE_VALUE_COLUMN, 118000))
                .row(Record::new("07FGHIJ5678K2Z3").with_field(TAXABLE_VALUE_COLUMN, 45500))
                .row(Record::new("19LMNOP3456Q7R8").with_field(TAXABLE_VALUE_COLUMN, 8200))
                .build()?,
        )
        .with_sheet(
            "CDNR",
            SheetTable::builder([TAXABLE_VALUE_COLUMN])
                .row(Record::new("33PQRST9012M3N4").with_field(TAXABLE_VALUE_COLUMN, 1500))
                .build()?,
        );

    let payments = Dataset::new()
        .with_sheet(
            "B2B",
            SheetTable::builder([TAXABLE_VALUE_COLUMN, TRADE_NAME_COLUMN, EMAIL_COLUMN])
                .row(Record::new("29ABCDE1234F1Z5").with_field(TAXABLE_VALUE_COLUMN, 118000))
                .row(Record::new("07FGHIJ5678K2Z3").with_field(TAXABLE_VALUE_COLUMN, 45000))
                .row(
                    Record::new("27XYZAB5678G1H2")
                        .with_field(TAXABLE_VALUE_COLUMN, 23600)
                        .with_field(TRADE_NAME_COLUMN, "Acme Traders")
                        .with_field(EMAIL_COLUMN, "accounts@acmetraders.example"),
                )
                .build()?,
        )
        .with_sheet(
            "CDNR",
            SheetTable::builder([TAXABLE_VALUE_COLUMN])
                .row(Record::new("33PQRST9012M3N4").with_field(TAXABLE_VALUE_COLUMN, 1500))
                .build()?,
        );

    println!("  ✓ Company dataset: {} sheets", company.len());
    println!("  ✓ Payments dataset: {} sheets", payments.len());
    println!();

    // 2. Align the datasets on the shared value column
    println!("🔍 Aligning on '{}'...\n", TAXABLE_VALUE_COLUMN);
    let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);

    for (name, result) in &output.sheets {
        println!("📄 Sheet {}:", name);
        for row in &result.comparison_rows {
            println!(
                "  {}  company ₹{} | payments ₹{} | difference ₹{} -> {}",
                row.gstin, row.company_value, row.payment_value, row.difference, row.claim_status
            );
        }
        for record in &result.unmatched_in_company {
            println!("  {}  missing from the company books", record.gstin);
        }
        for record in &result.unmatched_in_payments {
            println!("  {}  missing from the payment records", record.gstin);
        }
        println!();
    }

    for skipped in &output.skipped {
        println!("⚠️  Sheet {} skipped: {}", skipped.sheet, skipped.reason);
    }

    // 3. Summarize the run
    let summary = output.summarize();
    println!("📈 Summary:");
    println!("  Matched pairs:       {}", summary.total_matched);
    println!("  Claim now:           {}", summary.total_claim_now);
    println!("  Claim deferred:      {}", summary.total_claim_deferred);
    println!("  Missing in company:  {}", summary.total_unmatched_in_company);
    println!("  Missing in payments: {}", summary.total_unmatched_in_payments);
    println!();

    // 4. Pull out only the rows that still need attention
    println!("⚠️  Rows needing follow-up:");
    for (name, result) in &output.sheets {
        for row in result.filter_rows(ComparisonFilter::ClaimDeferred) {
            println!("  [{}] {} differs by ₹{}", name, row.gstin, row.difference);
        }
    }

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
