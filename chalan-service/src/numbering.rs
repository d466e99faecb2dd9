//! Voucher numbering helpers.
//!
//! Pure and deterministic; no I/O. The scope key scheme is keyed by
//! both org code and period, so one monotonic counter serializes all
//! issuers targeting the same org in the same period bucket.

use chrono::{DateTime, Utc};

use chalan_types::RecipientId;

/// Prefix carried by degraded identifiers minted while the numbering
/// counter was unavailable. Informational only; the persisted
/// numbering tag is what consumers branch on.
pub const FALLBACK_PREFIX: &str = "FB-";

/// Org code used when the organization directory has no code for the
/// issuer.
const DEFAULT_ORG_CODE: &str = "ORG";

/// Normalizes an org code for use in scope keys and voucher numbers:
/// uppercased, with a fixed fallback when absent or blank.
pub fn org_code_or_default(code: Option<&str>) -> String {
    match code {
        Some(c) if !c.trim().is_empty() => c.trim().to_uppercase(),
        _ => DEFAULT_ORG_CODE.to_string(),
    }
}

/// Counter scope for an (org, period) pair.
pub fn scope_key(org_code: &str, period: &str) -> String {
    format!("{}:{}", org_code, period)
}

/// Formats a sequential voucher number: `{ORG}-{PERIOD}-{SEQ:04}`.
pub fn format_number(org_code: &str, period: &str, sequence: i64) -> String {
    format!("{}-{}-{:04}", org_code, period, sequence)
}

/// Builds a degraded voucher identifier from the org code, a timestamp
/// suffix, and a short recipient discriminant (two fallbacks minted in
/// the same millisecond must still not collide on the unique number
/// column).
pub fn fallback_number(org_code: &str, at: DateTime<Utc>, recipient_id: RecipientId) -> String {
    let hex = recipient_id.as_uuid().simple().to_string();
    format!(
        "{}{}-{}-{}",
        FALLBACK_PREFIX,
        org_code,
        at.timestamp_millis(),
        &hex[..8]
    )
}

/// Returns true for identifiers minted by [`fallback_number`].
pub fn is_fallback_number(number: &str) -> bool {
    number.starts_with(FALLBACK_PREFIX)
}
