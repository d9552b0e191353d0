//! The fixed missing-invoice message sent to suppliers

use serde::{Deserialize, Serialize};

use crate::types::{Record, TRADE_NAME_COLUMN};

/// Salutation used when a record carries no usable trade name
pub const DEFAULT_SUPPLIER_NAME: &str = "Supplier";

/// One outgoing email, fully rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl NotificationMessage {
    /// Render the missing-invoice alert for one supplier
    pub fn missing_invoice(gstin: &str, recipient_name: &str, to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: format!("Missing Invoice Alert for GSTIN {}", gstin),
            body: format!(
                "Dear {},\n\
                 \n\
                 Our system shows that your invoice with GSTIN {} is present in our\n\
                 payment records but missing from our internal filing system.\n\
                 \n\
                 Kindly share the corresponding invoice/documents at the earliest so we\n\
                 can reconcile records.\n\
                 \n\
                 Regards,\n\
                 Finance Team\n",
                recipient_name, gstin
            ),
        }
    }

    /// Render the alert for an unmatched payments-side record, resolving
    /// the salutation from its trade-name field
    pub fn for_record(record: &Record, to: impl Into<String>) -> Self {
        Self::missing_invoice(&record.gstin, recipient_name(record), to)
    }
}

/// Supplier display name from a record's `Trade/Legal name` field,
/// falling back to [`DEFAULT_SUPPLIER_NAME`]
pub fn recipient_name(record: &Record) -> &str {
    match record.text(TRADE_NAME_COLUMN) {
        Some(name) if !name.trim().is_empty() => name,
        _ => DEFAULT_SUPPLIER_NAME,
    }
}
