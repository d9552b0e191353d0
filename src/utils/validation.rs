//! Validation utilities for GSTIN keys and recipient addresses
//!
//! The aligner treats keys as opaque strings; these checks are offered
//! to load collaborators that want to reject malformed input up front,
//! and to the dispatcher for deciding whether a send is worth attempting.

/// GSTIN shape errors
#[derive(Debug, thiserror::Error)]
pub enum GstinValidationError {
    #[error("GSTIN must be 15 characters, got {0}")]
    Length(usize),
    #[error("GSTIN must be uppercase alphanumeric: {0}")]
    Charset(String),
    #[error("GSTIN must start with a two-digit state code: {0}")]
    StateCode(String),
    #[error("GSTIN characters 3-12 must follow the PAN pattern: {0}")]
    PanShape(String),
}

/// Validate the structural shape of a 15-character GSTIN.
///
/// Checks length, charset, the leading state-code digits, and the
/// embedded PAN pattern (five letters, four digits, one letter). The
/// check-digit algorithm is deliberately not applied; registrations in
/// the wild fail it often enough that a structural check is the useful
/// boundary here.
pub fn validate_gstin(gstin: &str) -> Result<(), GstinValidationError> {
    let gstin = gstin.trim();

    if gstin.len() != 15 {
        return Err(GstinValidationError::Length(gstin.len()));
    }

    if !gstin
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(GstinValidationError::Charset(gstin.to_string()));
    }

    let bytes = gstin.as_bytes();
    if !bytes[..2].iter().all(u8::is_ascii_digit) {
        return Err(GstinValidationError::StateCode(gstin.to_string()));
    }

    // Characters 3-12 carry the holder's PAN
    let pan_ok = bytes[2..7].iter().all(u8::is_ascii_uppercase)
        && bytes[7..11].iter().all(u8::is_ascii_digit)
        && bytes[11].is_ascii_uppercase();
    if !pan_ok {
        return Err(GstinValidationError::PanShape(gstin.to_string()));
    }

    Ok(())
}

/// Recipient address was missing or implausible
#[derive(Debug, thiserror::Error)]
#[error("invalid email address: '{0}'")]
pub struct InvalidEmail(pub String);

/// Whether an address is plausible enough to attempt a send.
///
/// Deliberately loose: non-empty, exactly one `@` with text on both
/// sides, no whitespace. Anything stricter belongs to the transport.
pub fn is_well_formed_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

/// Validate a recipient address, with the rejected value in the error
pub fn validate_email(email: &str) -> Result<(), InvalidEmail> {
    if is_well_formed_email(email) {
        Ok(())
    } else {
        Err(InvalidEmail(email.to_string()))
    }
}
