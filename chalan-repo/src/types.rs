//! Database row types and domain conversions for the SQLite adapter.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use chalan_types::{
    Amount, Counter, InstallmentEntry, InstallmentId, InstallmentStatus, Ledger, LedgerId,
    Numbering, OrgId, PaymentEvent, RecipientId, RepoError, Voucher, VoucherId, VoucherStatus,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Counter row from database.
#[derive(FromRow)]
pub struct DbCounter {
    pub scope_key: String,
    pub sequence: i64,
    pub updated_at: String,
}

/// Voucher row from database.
#[derive(FromRow)]
pub struct DbVoucher {
    pub id: String,
    pub number: String,
    pub numbering: String,
    pub recipient_id: String,
    pub org_id: String,
    pub amount: i64,
    pub due_date: String,
    pub status: String,
    pub period: String,
    pub installment_label: String,
    pub ledger_id: String,
    pub payment_date: Option<String>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: String,
}

/// Ledger row from database (totals only; children are loaded
/// separately).
#[derive(FromRow)]
pub struct DbLedger {
    pub id: String,
    pub recipient_id: String,
    pub period: String,
    pub total_assigned: i64,
    pub total_paid: i64,
    pub total_pending: i64,
    pub created_at: String,
}

/// Installment row from database.
#[derive(FromRow)]
pub struct DbInstallment {
    pub id: String,
    pub voucher_id: String,
    pub name: String,
    pub amount: i64,
    pub due_date: String,
    pub status: String,
    pub paid_amount: i64,
    pub paid_date: Option<String>,
}

/// Payment event row from database.
#[derive(FromRow)]
pub struct DbPaymentEvent {
    pub voucher_id: String,
    pub amount: i64,
    pub date: String,
    pub method: String,
    pub reference: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_uuid(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(|e| RepoError::Database(e.to_string()))
}

pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::Database(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, RepoError> {
    s.parse::<NaiveDate>()
        .map_err(|e| RepoError::Database(e.to_string()))
}

pub fn parse_voucher_status(s: &str) -> Result<VoucherStatus, RepoError> {
    match s {
        "UNPAID" => Ok(VoucherStatus::Unpaid),
        "PAID" => Ok(VoucherStatus::Paid),
        _ => Err(RepoError::Database(format!("Unknown voucher status: {}", s))),
    }
}

pub fn parse_numbering(s: &str) -> Result<Numbering, RepoError> {
    match s {
        "SEQUENTIAL" => Ok(Numbering::Sequential),
        "FALLBACK" => Ok(Numbering::Fallback),
        _ => Err(RepoError::Database(format!("Unknown numbering tag: {}", s))),
    }
}

pub fn parse_installment_status(s: &str) -> Result<InstallmentStatus, RepoError> {
    match s {
        "PENDING" => Ok(InstallmentStatus::Pending),
        "PAID" => Ok(InstallmentStatus::Paid),
        _ => Err(RepoError::Database(format!(
            "Unknown installment status: {}",
            s
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbCounter {
    pub fn into_domain(self) -> Result<Counter, RepoError> {
        Ok(Counter {
            scope_key: self.scope_key,
            sequence: self.sequence,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl DbVoucher {
    /// Convert database row to domain Voucher.
    pub fn into_domain(self) -> Result<Voucher, RepoError> {
        Ok(Voucher {
            id: VoucherId::from_uuid(parse_uuid(&self.id)?),
            number: self.number,
            numbering: parse_numbering(&self.numbering)?,
            recipient_id: RecipientId::from_uuid(parse_uuid(&self.recipient_id)?),
            org_id: OrgId::from_uuid(parse_uuid(&self.org_id)?),
            amount: Amount::new(self.amount).map_err(RepoError::Domain)?,
            due_date: parse_date(&self.due_date)?,
            status: parse_voucher_status(&self.status)?,
            period: self.period,
            installment_label: self.installment_label,
            ledger_id: LedgerId::from_uuid(parse_uuid(&self.ledger_id)?),
            payment_date: self.payment_date.as_deref().map(parse_date).transpose()?,
            payment_method: self.payment_method,
            payment_reference: self.payment_reference,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl DbInstallment {
    pub fn into_domain(self) -> Result<InstallmentEntry, RepoError> {
        Ok(InstallmentEntry {
            id: InstallmentId::from_uuid(parse_uuid(&self.id)?),
            voucher_id: VoucherId::from_uuid(parse_uuid(&self.voucher_id)?),
            name: self.name,
            amount: Amount::new(self.amount).map_err(RepoError::Domain)?,
            due_date: parse_date(&self.due_date)?,
            status: parse_installment_status(&self.status)?,
            paid_amount: Amount::new(self.paid_amount).map_err(RepoError::Domain)?,
            paid_date: self.paid_date.as_deref().map(parse_date).transpose()?,
        })
    }
}

impl DbPaymentEvent {
    pub fn into_domain(self) -> Result<PaymentEvent, RepoError> {
        Ok(PaymentEvent {
            amount: Amount::new(self.amount).map_err(RepoError::Domain)?,
            date: parse_date(&self.date)?,
            method: self.method,
            reference: self.reference,
            voucher_id: VoucherId::from_uuid(parse_uuid(&self.voucher_id)?),
        })
    }
}

impl DbLedger {
    /// Convert database row plus loaded children to a domain Ledger.
    pub fn into_domain(
        self,
        installments: Vec<InstallmentEntry>,
        payments: Vec<PaymentEvent>,
    ) -> Result<Ledger, RepoError> {
        Ok(Ledger {
            id: LedgerId::from_uuid(parse_uuid(&self.id)?),
            recipient_id: RecipientId::from_uuid(parse_uuid(&self.recipient_id)?),
            period: self.period,
            total_assigned: Amount::new(self.total_assigned).map_err(RepoError::Domain)?,
            total_paid: Amount::new(self.total_paid).map_err(RepoError::Domain)?,
            total_pending: Amount::new(self.total_pending).map_err(RepoError::Domain)?,
            installments,
            payments,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}
