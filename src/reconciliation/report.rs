//! Filtered views and roll-up summaries over alignment output
//!
//! Everything here is a copy-view: filters and summaries read the
//! alignment output and build fresh values, leaving it untouched.

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::reconciliation::aligner::{AlignOutput, ClaimStatus, ComparisonRow, SheetResult};

/// Row predicate for narrowing a comparison view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComparisonFilter {
    /// Every matched pair
    #[default]
    All,
    /// Pairs whose values agree exactly
    ClaimNow,
    /// Pairs whose values differ
    ClaimDeferred,
    /// Pairs with a non-zero difference, whichever way it leans
    NonZeroDifference,
}

impl ComparisonFilter {
    /// Whether a row passes this filter
    pub fn matches(&self, row: &ComparisonRow) -> bool {
        match self {
            ComparisonFilter::All => true,
            ComparisonFilter::ClaimNow => row.claim_status == ClaimStatus::ClaimNow,
            ComparisonFilter::ClaimDeferred => row.claim_status == ClaimStatus::ClaimDeferred,
            ComparisonFilter::NonZeroDifference => !row.difference.is_zero(),
        }
    }
}

/// Presentation hint for one comparison row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowHighlight {
    /// Values agree; nothing to chase
    Plain,
    /// Values differ; the row needs follow-up
    Flagged,
}

impl RowHighlight {
    /// Derive the hint for a row from its difference
    pub fn for_row(row: &ComparisonRow) -> Self {
        if row.difference.is_zero() {
            RowHighlight::Plain
        } else {
            RowHighlight::Flagged
        }
    }
}

impl SheetResult {
    /// Matched pairs passing the filter, cloned in their original order
    pub fn filter_rows(&self, filter: ComparisonFilter) -> Vec<ComparisonRow> {
        self.comparison_rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect()
    }
}

/// Counts and value totals for one aligned sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub sheet: String,
    pub matched: usize,
    pub claim_now: usize,
    pub claim_deferred: usize,
    pub unmatched_in_company: usize,
    pub unmatched_in_payments: usize,
    /// Sum of company-side values over matched pairs
    pub company_total: BigDecimal,
    /// Sum of payments-side values over matched pairs
    pub payment_total: BigDecimal,
    /// Sum of differences over matched pairs
    pub difference_total: BigDecimal,
}

impl SheetSummary {
    /// Summarize one sheet's alignment result
    pub fn for_sheet(sheet: impl Into<String>, result: &SheetResult) -> Self {
        let mut claim_now = 0;
        let mut claim_deferred = 0;
        let mut company_total = BigDecimal::zero();
        let mut payment_total = BigDecimal::zero();
        let mut difference_total = BigDecimal::zero();

        for row in &result.comparison_rows {
            match row.claim_status {
                ClaimStatus::ClaimNow => claim_now += 1,
                ClaimStatus::ClaimDeferred => claim_deferred += 1,
            }
            company_total += &row.company_value;
            payment_total += &row.payment_value;
            difference_total += &row.difference;
        }

        Self {
            sheet: sheet.into(),
            matched: result.comparison_rows.len(),
            claim_now,
            claim_deferred,
            unmatched_in_company: result.unmatched_in_company.len(),
            unmatched_in_payments: result.unmatched_in_payments.len(),
            company_total,
            payment_total,
            difference_total,
        }
    }
}

/// Roll-up of a whole alignment pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Per-sheet breakdown, in sheet-name order
    pub sheets: Vec<SheetSummary>,
    pub total_matched: usize,
    pub total_claim_now: usize,
    pub total_claim_deferred: usize,
    pub total_unmatched_in_company: usize,
    pub total_unmatched_in_payments: usize,
    /// Common sheets excluded for a missing value column
    pub skipped_sheets: usize,
}

impl AlignOutput {
    /// Roll the whole pass up into per-sheet and overall counts
    pub fn summarize(&self) -> ReconciliationSummary {
        let sheets: Vec<SheetSummary> = self
            .sheets
            .iter()
            .map(|(name, result)| SheetSummary::for_sheet(name.clone(), result))
            .collect();

        ReconciliationSummary {
            total_matched: sheets.iter().map(|summary| summary.matched).sum(),
            total_claim_now: sheets.iter().map(|summary| summary.claim_now).sum(),
            total_claim_deferred: sheets.iter().map(|summary| summary.claim_deferred).sum(),
            total_unmatched_in_company: sheets
                .iter()
                .map(|summary| summary.unmatched_in_company)
                .sum(),
            total_unmatched_in_payments: sheets
                .iter()
                .map(|summary| summary.unmatched_in_payments)
                .sum(),
            skipped_sheets: self.skipped.len(),
            sheets,
        }
    }
}
