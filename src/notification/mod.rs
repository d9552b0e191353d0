//! Supplier notification: the message template and batch dispatch
//!
//! Records that reconciliation leaves unmatched on the company side are
//! turned into missing-invoice alerts and handed to a mail transport,
//! one attempt per record.

pub mod dispatcher;
pub mod message;

pub use dispatcher::{
    CancelFlag, DispatchError, DispatchOutcome, DispatchReport, DispatchResult, DispatchStatus,
    NotificationDispatcher, SkipCause,
};
pub use message::{recipient_name, NotificationMessage, DEFAULT_SUPPLIER_NAME};
