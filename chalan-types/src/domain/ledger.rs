//! Per-recipient fee ledger domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::RecipientId;
use super::money::Amount;
use super::voucher::VoucherId;
use crate::error::DomainError;

/// Unique identifier for a Ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(Uuid);

impl LedgerId {
    /// Creates a new random LedgerId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a LedgerId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LedgerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LedgerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LedgerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for an installment entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallmentId(Uuid);

impl InstallmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InstallmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstallmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment state of a single installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallmentStatus::Pending => write!(f, "PENDING"),
            InstallmentStatus::Paid => write!(f, "PAID"),
        }
    }
}

/// One charge line item within a ledger, associated with exactly one
/// voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentEntry {
    pub id: InstallmentId,
    /// Voucher this installment was issued against
    pub voucher_id: VoucherId,
    pub name: String,
    pub amount: Amount,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub paid_amount: Amount,
    pub paid_date: Option<NaiveDate>,
}

impl InstallmentEntry {
    /// Amount still outstanding on this installment.
    pub fn remaining(&self) -> Amount {
        // paid_amount never exceeds amount, enforced on every payment
        self.amount
            .checked_sub(self.paid_amount)
            .unwrap_or_else(|_| Amount::zero())
    }
}

/// Append-only record of one applied payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub amount: Amount,
    pub date: NaiveDate,
    pub method: String,
    pub reference: Option<String>,
    /// Voucher whose payment produced this event
    pub voucher_id: VoucherId,
}

/// The running account of assigned, paid, and pending amounts for one
/// recipient in one period bucket.
///
/// Invariant: `total_pending == total_assigned - total_paid` at all
/// times. Created on the first installment for a (recipient, period)
/// pair, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    pub id: LedgerId,
    pub recipient_id: RecipientId,
    pub period: String,
    pub total_assigned: Amount,
    pub total_paid: Amount,
    pub total_pending: Amount,
    pub installments: Vec<InstallmentEntry>,
    pub payments: Vec<PaymentEvent>,
    pub created_at: DateTime<Utc>,
}

impl Ledger {
    /// Opens an empty ledger with zeroed totals.
    pub fn open(recipient_id: RecipientId, period: String) -> Self {
        Self {
            id: LedgerId::new(),
            recipient_id,
            period,
            total_assigned: Amount::zero(),
            total_paid: Amount::zero(),
            total_pending: Amount::zero(),
            installments: Vec::new(),
            payments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Appends a new installment and raises the assigned/pending
    /// totals by its amount.
    pub fn apply_new_installment(
        &mut self,
        voucher_id: VoucherId,
        name: String,
        amount: Amount,
        due_date: NaiveDate,
    ) -> InstallmentId {
        let entry = InstallmentEntry {
            id: InstallmentId::new(),
            voucher_id,
            name,
            amount,
            due_date,
            status: InstallmentStatus::Pending,
            paid_amount: Amount::zero(),
            paid_date: None,
        };
        let id = entry.id;
        self.installments.push(entry);
        self.total_assigned = self.total_assigned.checked_add(amount);
        self.total_pending = self.total_pending.checked_add(amount);
        id
    }

    /// Applies a payment against the installment issued for
    /// `voucher_id`.
    ///
    /// Rejects (never clamps) a payment that would exceed the
    /// installment's remaining balance, leaving the ledger untouched.
    pub fn apply_payment(
        &mut self,
        voucher_id: VoucherId,
        amount: Amount,
        date: NaiveDate,
        method: String,
        reference: Option<String>,
    ) -> Result<(), DomainError> {
        let entry = self
            .installments
            .iter_mut()
            .find(|e| e.voucher_id == voucher_id)
            .ok_or_else(|| {
                DomainError::ValidationError(format!("no installment for voucher {}", voucher_id))
            })?;

        let remaining = entry.remaining();
        if amount > remaining {
            return Err(DomainError::Overpayment {
                remaining: remaining.minor(),
                requested: amount.minor(),
            });
        }

        entry.paid_amount = entry.paid_amount.checked_add(amount);
        if entry.paid_amount == entry.amount {
            entry.status = InstallmentStatus::Paid;
        }
        entry.paid_date = Some(date);

        self.total_paid = self.total_paid.checked_add(amount);
        self.total_pending = self.total_pending.checked_sub(amount)?;

        self.payments.push(PaymentEvent {
            amount,
            date,
            method,
            reference,
            voucher_id,
        });

        Ok(())
    }

    /// Checks the core ledger invariant.
    pub fn is_balanced(&self) -> bool {
        self.total_pending.minor() == self.total_assigned.minor() - self.total_paid.minor()
    }
}
