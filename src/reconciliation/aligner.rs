//! The core alignment pass: pair rows across datasets by GSTIN and
//! classify each matched pair by its value difference
//!
//! The pass is a pure function of its inputs. Neither dataset is
//! modified, nothing is cached between calls, and the same inputs
//! always produce the same output in the same order.

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::types::{Dataset, Record, SheetTable};

/// Claim classification for one matched GSTIN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Values agree exactly; the input credit can be claimed now
    ClaimNow,
    /// Values differ; hold the claim until the books are corrected
    ClaimDeferred,
}

impl ClaimStatus {
    /// Classify a matched pair from its company-minus-payments difference
    pub fn for_difference(difference: &BigDecimal) -> Self {
        if difference.is_zero() {
            ClaimStatus::ClaimNow
        } else {
            ClaimStatus::ClaimDeferred
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimStatus::ClaimNow => write!(f, "Claim Now"),
            ClaimStatus::ClaimDeferred => write!(f, "Claim Deferred"),
        }
    }
}

/// One matched GSTIN with its values from both sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// The key the pair was matched on
    pub gstin: String,
    /// Value recorded in the company dataset
    pub company_value: BigDecimal,
    /// Value recorded in the payments dataset
    pub payment_value: BigDecimal,
    /// Company value minus payment value, exact
    pub difference: BigDecimal,
    /// Classification derived from the difference
    pub claim_status: ClaimStatus,
}

/// Alignment result for one sheet present in both datasets
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SheetResult {
    /// Matched pairs, in company-dataset row order
    pub comparison_rows: Vec<ComparisonRow>,
    /// Payments rows whose GSTIN is absent from the company sheet.
    /// These carry the supplier contact columns and are the rows the
    /// dispatcher later notifies.
    pub unmatched_in_company: Vec<Record>,
    /// Company rows whose GSTIN is absent from the payments sheet.
    /// Surfaced for reporting; nothing downstream acts on them.
    pub unmatched_in_payments: Vec<Record>,
}

/// Which input dataset a skip reason points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingSide {
    Company,
    Payments,
    Both,
}

impl MissingSide {
    fn from_presence(company_has: bool, payments_has: bool) -> Option<Self> {
        match (company_has, payments_has) {
            (true, true) => None,
            (false, true) => Some(MissingSide::Company),
            (true, false) => Some(MissingSide::Payments),
            (false, false) => Some(MissingSide::Both),
        }
    }
}

impl fmt::Display for MissingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingSide::Company => write!(f, "the Company dataset"),
            MissingSide::Payments => write!(f, "the Payments dataset"),
            MissingSide::Both => write!(f, "both datasets"),
        }
    }
}

/// Why a common sheet produced no result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The configured value column is not declared on the named side
    ValueColumnMissing { column: String, side: MissingSide },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ValueColumnMissing { column, side } => {
                write!(f, "value column '{}' missing in {}", column, side)
            }
        }
    }
}

/// A common sheet the pass could not align, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSheet {
    pub sheet: String,
    pub reason: SkipReason,
}

/// Full output of one alignment pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignOutput {
    /// Per-sheet results, keyed by sheet name in lexicographic order
    pub sheets: BTreeMap<String, SheetResult>,
    /// Common sheets that could not be aligned
    pub skipped: Vec<SkippedSheet>,
}

impl AlignOutput {
    /// Look up the result for one sheet
    pub fn sheet(&self, name: &str) -> Option<&SheetResult> {
        self.sheets.get(name)
    }

    /// Names of the sheets that were aligned, in lexicographic order
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Whether the pass aligned no sheets at all
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// All payments rows missing from the company side, across sheets
    /// in name order and rows in source order.
    ///
    /// A GSTIN unmatched on several sheets appears once per sheet; the
    /// dispatcher notifies per record, matching what the books show.
    pub fn unmatched_in_company(&self) -> impl Iterator<Item = &Record> {
        self.sheets
            .values()
            .flat_map(|result| result.unmatched_in_company.iter())
    }
}

/// Align two datasets sheet by sheet on the GSTIN key.
///
/// Only sheets present in both datasets take part. A common sheet
/// missing `value_column` on either side is reported in
/// [`AlignOutput::skipped`] rather than half-aligned. Within a sheet,
/// a cell that is absent or non-numeric reads as zero so a one-sided
/// bookkeeping gap still surfaces as a difference.
pub fn align(company: &Dataset, payments: &Dataset, value_column: &str) -> AlignOutput {
    let mut sheets = BTreeMap::new();
    let mut skipped = Vec::new();

    for name in company.common_sheets(payments) {
        let (Some(company_sheet), Some(payments_sheet)) =
            (company.sheet(&name), payments.sheet(&name))
        else {
            continue;
        };

        let side = MissingSide::from_presence(
            company_sheet.has_column(value_column),
            payments_sheet.has_column(value_column),
        );
        if let Some(side) = side {
            warn!(
                "sheet '{}' skipped: value column '{}' missing in {}",
                name, value_column, side
            );
            skipped.push(SkippedSheet {
                sheet: name,
                reason: SkipReason::ValueColumnMissing {
                    column: value_column.to_string(),
                    side,
                },
            });
            continue;
        }

        debug!(
            "aligning sheet '{}': {} company rows, {} payments rows",
            name,
            company_sheet.len(),
            payments_sheet.len()
        );
        sheets.insert(name, align_sheet(company_sheet, payments_sheet, value_column));
    }

    AlignOutput { sheets, skipped }
}

fn align_sheet(company: &SheetTable, payments: &SheetTable, value_column: &str) -> SheetResult {
    let mut comparison_rows = Vec::new();
    let mut unmatched_in_payments = Vec::new();

    for record in company.rows() {
        match payments.get(&record.gstin) {
            Some(payment_record) => {
                let company_value = cell_value(record, value_column);
                let payment_value = cell_value(payment_record, value_column);
                let difference = &company_value - &payment_value;
                let claim_status = ClaimStatus::for_difference(&difference);
                comparison_rows.push(ComparisonRow {
                    gstin: record.gstin.clone(),
                    company_value,
                    payment_value,
                    difference,
                    claim_status,
                });
            }
            None => unmatched_in_payments.push(record.clone()),
        }
    }

    let unmatched_in_company = payments
        .rows()
        .iter()
        .filter(|record| !company.contains_key(&record.gstin))
        .cloned()
        .collect();

    SheetResult {
        comparison_rows,
        unmatched_in_company,
        unmatched_in_payments,
    }
}

fn cell_value(record: &Record, column: &str) -> BigDecimal {
    record
        .decimal(column)
        .cloned()
        .unwrap_or_else(BigDecimal::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SheetTableBuilder, EMAIL_COLUMN, TAXABLE_VALUE_COLUMN, TRADE_NAME_COLUMN};
    use std::str::FromStr;

    fn sheet(rows: Vec<Record>) -> SheetTable {
        let mut builder = SheetTableBuilder::new([
            TAXABLE_VALUE_COLUMN,
            TRADE_NAME_COLUMN,
            EMAIL_COLUMN,
        ]);
        for row in rows {
            builder.push_row(row);
        }
        builder.build().unwrap()
    }

    fn valued(gstin: &str, value: i64) -> Record {
        Record::new(gstin).with_field(TAXABLE_VALUE_COLUMN, value)
    }

    fn dataset(name: &str, rows: Vec<Record>) -> Dataset {
        Dataset::new().with_sheet(name, sheet(rows))
    }

    #[test]
    fn test_equal_values_claim_now() {
        let company = dataset("B2B", vec![valued("29ABCDE1234F1Z5", 1000)]);
        let payments = dataset("B2B", vec![valued("29ABCDE1234F1Z5", 1000)]);

        let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);
        let result = output.sheet("B2B").unwrap();

        assert_eq!(result.comparison_rows.len(), 1);
        let row = &result.comparison_rows[0];
        assert_eq!(row.gstin, "29ABCDE1234F1Z5");
        assert!(row.difference.is_zero());
        assert_eq!(row.claim_status, ClaimStatus::ClaimNow);
        assert!(result.unmatched_in_company.is_empty());
        assert!(result.unmatched_in_payments.is_empty());
    }

    #[test]
    fn test_value_shortfall_defers_claim() {
        let company = dataset("B2B", vec![valued("29ABCDE1234F1Z5", 1000)]);
        let payments = dataset("B2B", vec![valued("29ABCDE1234F1Z5", 900)]);

        let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);
        let row = &output.sheet("B2B").unwrap().comparison_rows[0];

        assert_eq!(row.difference, BigDecimal::from(100));
        assert_eq!(row.claim_status, ClaimStatus::ClaimDeferred);
    }

    #[test]
    fn test_scale_differences_still_match() {
        let company = dataset(
            "B2B",
            vec![Record::new("29ABCDE1234F1Z5")
                .with_field(TAXABLE_VALUE_COLUMN, BigDecimal::from_str("100.50").unwrap())],
        );
        let payments = dataset(
            "B2B",
            vec![Record::new("29ABCDE1234F1Z5")
                .with_field(TAXABLE_VALUE_COLUMN, BigDecimal::from_str("100.5").unwrap())],
        );

        let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);
        let row = &output.sheet("B2B").unwrap().comparison_rows[0];

        assert_eq!(row.claim_status, ClaimStatus::ClaimNow);
    }

    #[test]
    fn test_unmatched_rows_partition_by_side() {
        let company = dataset(
            "B2B",
            vec![valued("29ABCDE1234F1Z5", 1000), valued("07FGHIJ5678K2Z3", 250)],
        );
        let payments = dataset(
            "B2B",
            vec![valued("27XYZAB5678G1H2", 500), valued("29ABCDE1234F1Z5", 1000)],
        );

        let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);
        let result = output.sheet("B2B").unwrap();

        let matched: Vec<&str> = result
            .comparison_rows
            .iter()
            .map(|row| row.gstin.as_str())
            .collect();
        assert_eq!(matched, vec!["29ABCDE1234F1Z5"]);

        // the payments-only row is the one missing from the company books
        assert_eq!(result.unmatched_in_company.len(), 1);
        assert_eq!(result.unmatched_in_company[0].gstin, "27XYZAB5678G1H2");

        assert_eq!(result.unmatched_in_payments.len(), 1);
        assert_eq!(result.unmatched_in_payments[0].gstin, "07FGHIJ5678K2Z3");
    }

    #[test]
    fn test_missing_cell_reads_as_zero() {
        let company = dataset("B2B", vec![Record::new("29ABCDE1234F1Z5")]);
        let payments = dataset("B2B", vec![valued("29ABCDE1234F1Z5", 100)]);

        let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);
        let row = &output.sheet("B2B").unwrap().comparison_rows[0];

        assert_eq!(row.company_value, BigDecimal::from(0));
        assert_eq!(row.difference, BigDecimal::from(-100));
        assert_eq!(row.claim_status, ClaimStatus::ClaimDeferred);
    }

    #[test]
    fn test_sheet_on_one_side_only_is_excluded() {
        let company = Dataset::new()
            .with_sheet("B2B", sheet(vec![valued("29ABCDE1234F1Z5", 1000)]))
            .with_sheet("B2C", sheet(vec![valued("27XYZAB5678G1H2", 400)]));
        let payments = dataset("B2B", vec![valued("29ABCDE1234F1Z5", 1000)]);

        let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);

        let names: Vec<&str> = output.sheet_names().collect();
        assert_eq!(names, vec!["B2B"]);
        assert!(output.sheet("B2C").is_none());
        assert!(output.skipped.is_empty());
    }

    #[test]
    fn test_sheet_without_value_column_is_skipped() {
        let bare = SheetTableBuilder::new([TRADE_NAME_COLUMN])
            .row(Record::new("29ABCDE1234F1Z5").with_field(TRADE_NAME_COLUMN, "Acme Traders"))
            .build()
            .unwrap();
        let company = Dataset::new().with_sheet("B2B", bare);
        let payments = dataset("B2B", vec![valued("29ABCDE1234F1Z5", 1000)]);

        let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);

        assert!(output.is_empty());
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].sheet, "B2B");
        assert_eq!(
            output.skipped[0].reason,
            SkipReason::ValueColumnMissing {
                column: TAXABLE_VALUE_COLUMN.to_string(),
                side: MissingSide::Company,
            }
        );
    }

    #[test]
    fn test_align_is_repeatable() {
        let company = Dataset::new()
            .with_sheet("B2B", sheet(vec![valued("29ABCDE1234F1Z5", 1000)]))
            .with_sheet("CDNR", sheet(vec![valued("27XYZAB5678G1H2", 300)]));
        let payments = Dataset::new()
            .with_sheet("B2B", sheet(vec![valued("29ABCDE1234F1Z5", 900)]))
            .with_sheet("CDNR", sheet(vec![]));

        let first = align(&company, &payments, TAXABLE_VALUE_COLUMN);
        let second = align(&company, &payments, TAXABLE_VALUE_COLUMN);

        assert_eq!(first, second);
    }

    #[test]
    fn test_unmatched_in_company_walks_sheets_in_name_order() {
        let company = Dataset::new()
            .with_sheet("B2B", sheet(vec![]))
            .with_sheet("CDNR", sheet(vec![]));
        let payments = Dataset::new()
            .with_sheet("CDNR", sheet(vec![valued("33PQRST9012M3N4", 50)]))
            .with_sheet("B2B", sheet(vec![valued("27XYZAB5678G1H2", 500)]));

        let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);
        let gstins: Vec<&str> = output
            .unmatched_in_company()
            .map(|record| record.gstin.as_str())
            .collect();

        assert_eq!(gstins, vec!["27XYZAB5678G1H2", "33PQRST9012M3N4"]);
    }
}
