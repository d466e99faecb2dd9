//! Data Transfer Objects (DTOs) for requests and reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, LedgerId, Numbering, OrgId, RecipientId, VoucherId, VoucherStatus,
};

// ─────────────────────────────────────────────────────────────────────────────
// Issuance DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to issue one voucher per recipient against a period fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueBatchRequest {
    /// Organization issuing the batch
    pub org_id: OrgId,
    /// Recipients to issue vouchers for
    pub recipient_ids: Vec<RecipientId>,
    /// Amount due per voucher, in smallest currency unit
    pub amount: i64,
    /// Date each voucher falls due
    pub due_date: NaiveDate,
    /// Period bucket, e.g. "202401"
    pub period: String,
    /// Optional charge line label; defaults to "Fee {period}"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment_label: Option<String>,
}

/// Repository input for one voucher+installment pair. The adapter
/// persists both inside a single transaction.
#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub recipient_id: RecipientId,
    pub org_id: OrgId,
    pub number: String,
    pub numbering: Numbering,
    pub amount: Amount,
    pub due_date: NaiveDate,
    pub period: String,
    pub installment_label: String,
}

/// Caller-facing view of one issued voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherView {
    pub voucher_id: VoucherId,
    pub voucher_number: String,
    pub numbering: Numbering,
    pub recipient_id: RecipientId,
    /// Display name from the recipient directory, or a placeholder
    /// when resolution failed
    pub recipient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    pub amount: i64,
    pub due_date: NaiveDate,
    pub status: VoucherStatus,
    pub installment_label: String,
    pub period: String,
    pub ledger_id: LedgerId,
}

/// Outcome of issuance for a single recipient.
///
/// Explicitly tagged so callers branch on the outcome type instead of
/// parsing identifier strings for a fallback prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueOutcome {
    /// Voucher issued with a sequential number.
    Issued(VoucherView),
    /// Voucher issued with a degraded, non-sequential identifier
    /// because the numbering counter was unavailable.
    Fallback(VoucherView),
    /// This recipient's voucher/ledger pair rolled back; the rest of
    /// the batch was unaffected.
    Failed {
        recipient_id: RecipientId,
        reason: String,
    },
}

/// Result of a whole issuance batch: per-recipient outcomes plus
/// aggregate counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueBatchReport {
    pub requested: usize,
    pub issued: usize,
    pub fallback: usize,
    pub failed: usize,
    pub outcomes: Vec<IssueOutcome>,
    /// Identifiers of the recipients whose pairs rolled back
    pub failed_recipients: Vec<RecipientId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to record a payment against an unpaid voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub voucher_id: VoucherId,
    /// Owning organization; a voucher owned by another org is treated
    /// as not found
    pub org_id: OrgId,
    pub payment_date: NaiveDate,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Amount received, in smallest currency unit. When absent the
    /// voucher's full amount is applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Repair DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// One voucher the repair run could not rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairFailure {
    pub voucher_id: VoucherId,
    pub reason: String,
}

/// Result of one repair run over fallback-numbered vouchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairReport {
    /// Fallback-numbered vouchers found by the scan
    pub scanned: usize,
    /// Vouchers rewritten to a fresh sequential number
    pub repaired: usize,
    pub failures: Vec<RepairFailure>,
}
