//! # GSTIN Recon
//!
//! A reconciliation library for GSTIN-keyed ledgers: it aligns a company's
//! purchase books against a supplier payments extract sheet by sheet,
//! classifies input-credit claims from exact decimal differences, and
//! dispatches missing-invoice notifications for the records the books lack.
//!
//! ## Features
//!
//! - **Dataset alignment**: sheet-by-sheet GSTIN matching with exact `BigDecimal` differences
//! - **Claim classification**: `ClaimNow` on exact agreement, `ClaimDeferred` otherwise
//! - **Unmatched tracking**: per-sheet rows missing from either side, in source order
//! - **Report views**: claim filters, row highlighting hints, and roll-up summaries
//! - **Notification dispatch**: one missing-invoice email per unmatched record, with per-record outcomes
//! - **Transport abstraction**: SMTP-agnostic design with a trait-based mail seam
//!
//! ## Quick Start
//!
//! ```rust
//! use gstin_recon::{align, ClaimStatus, Dataset, Record, SheetTable, TAXABLE_VALUE_COLUMN};
//!
//! let sheet = SheetTable::builder([TAXABLE_VALUE_COLUMN])
//!     .row(Record::new("29ABCDE1234F1Z5").with_field(TAXABLE_VALUE_COLUMN, 1000))
//!     .build()
//!     .unwrap();
//! let company = Dataset::new().with_sheet("B2B", sheet);
//! let payments = company.clone();
//!
//! let output = align(&company, &payments, TAXABLE_VALUE_COLUMN);
//! let row = &output.sheet("B2B").unwrap().comparison_rows[0];
//! assert_eq!(row.claim_status, ClaimStatus::ClaimNow);
//! ```

pub mod notification;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;
pub mod workflow;

// Re-export commonly used types
pub use notification::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use workflow::*;
