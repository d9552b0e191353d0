//! Alignment of GSTIN-keyed datasets and reporting over the result
//!
//! The aligner takes two multi-sheet datasets (the company's purchase
//! ledger and the supplier payments extract), pairs rows by GSTIN, and
//! classifies each matched pair for input-credit claims. The report
//! layer builds filtered views and roll-up summaries on top.

pub mod aligner;
pub mod report;

pub use aligner::{
    align, AlignOutput, ClaimStatus, ComparisonRow, MissingSide, SheetResult, SkipReason,
    SkippedSheet,
};
pub use report::{ComparisonFilter, ReconciliationSummary, RowHighlight, SheetSummary};
