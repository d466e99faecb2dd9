//! Voucher (chalan) domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{OrgId, RecipientId};
use super::ledger::LedgerId;
use super::money::Amount;

/// Unique identifier for a Voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoucherId(Uuid);

impl VoucherId {
    /// Creates a new random VoucherId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a VoucherId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VoucherId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VoucherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for VoucherId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Payment state of a voucher. The transition is `Unpaid -> Paid`,
/// terminal; there is no cancellation state in this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherStatus {
    Unpaid,
    Paid,
}

impl std::fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoucherStatus::Unpaid => write!(f, "UNPAID"),
            VoucherStatus::Paid => write!(f, "PAID"),
        }
    }
}

/// How the voucher number was obtained.
///
/// `Fallback` marks a degraded identifier minted while the numbering
/// counter was unavailable; downstream consumers branch on this tag
/// instead of parsing the number string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Numbering {
    Sequential,
    Fallback,
}

impl std::fmt::Display for Numbering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Numbering::Sequential => write!(f, "SEQUENTIAL"),
            Numbering::Fallback => write!(f, "FALLBACK"),
        }
    }
}

/// An issued payment voucher.
///
/// Vouchers are append-only audit records: created once during
/// issuance, mutated only by the payment recorder (status and payment
/// fields) and the repair tool (fallback number rewrite), never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    /// Unique identifier
    pub id: VoucherId,
    /// Human-readable unique voucher number
    pub number: String,
    /// Whether the number came from the counter or the fallback path
    pub numbering: Numbering,
    /// Recipient the voucher was issued to
    pub recipient_id: RecipientId,
    /// Organization that owns the voucher
    pub org_id: OrgId,
    /// Amount due
    pub amount: Amount,
    /// Date the payment is due
    pub due_date: NaiveDate,
    /// Payment state
    pub status: VoucherStatus,
    /// Period bucket the voucher was issued in (e.g. "202401")
    pub period: String,
    /// Charge line label shown on the voucher
    pub installment_label: String,
    /// Ledger the voucher's installment lives in
    pub ledger_id: LedgerId,
    /// Set when the voucher is paid
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    /// When the voucher was created
    pub created_at: DateTime<Utc>,
}

impl Voucher {
    /// Creates a new unpaid voucher.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        number: String,
        numbering: Numbering,
        recipient_id: RecipientId,
        org_id: OrgId,
        amount: Amount,
        due_date: NaiveDate,
        period: String,
        installment_label: String,
        ledger_id: LedgerId,
    ) -> Self {
        Self {
            id: VoucherId::new(),
            number,
            numbering,
            recipient_id,
            org_id,
            amount,
            due_date,
            status: VoucherStatus::Unpaid,
            period,
            installment_label,
            ledger_id,
            payment_date: None,
            payment_method: None,
            payment_reference: None,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the voucher can still be paid.
    pub fn is_unpaid(&self) -> bool {
        self.status == VoucherStatus::Unpaid
    }

    /// Applies the paid transition. Callers must guard with
    /// [`Voucher::is_unpaid`] first; the transition is terminal.
    pub fn mark_paid(&mut self, date: NaiveDate, method: String, reference: Option<String>) {
        self.status = VoucherStatus::Paid;
        self.payment_date = Some(date);
        self.payment_method = Some(method);
        self.payment_reference = reference;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_voucher() -> Voucher {
        Voucher::issue(
            "ABC-202401-0001".to_string(),
            Numbering::Sequential,
            RecipientId::new(),
            OrgId::new(),
            Amount::new(50000).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            "202401".to_string(),
            "Fee 202401".to_string(),
            LedgerId::new(),
        )
    }

    #[test]
    fn test_issued_voucher_is_unpaid() {
        let voucher = sample_voucher();
        assert_eq!(voucher.status, VoucherStatus::Unpaid);
        assert!(voucher.is_unpaid());
        assert!(voucher.payment_date.is_none());
    }

    #[test]
    fn test_mark_paid() {
        let mut voucher = sample_voucher();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        voucher.mark_paid(date, "bank".to_string(), Some("TXN-9".to_string()));

        assert_eq!(voucher.status, VoucherStatus::Paid);
        assert!(!voucher.is_unpaid());
        assert_eq!(voucher.payment_date, Some(date));
        assert_eq!(voucher.payment_method.as_deref(), Some("bank"));
        assert_eq!(voucher.payment_reference.as_deref(), Some("TXN-9"));
    }
}
