//! Repository port trait.
//!
//! This is the primary port in the hexagonal architecture.
//! Adapters (SQLite, in-memory) implement this trait.

use crate::domain::{Counter, Ledger, RecipientId, Voucher, VoucherId};
use crate::dto::{NewVoucher, RecordPaymentRequest};
use crate::error::RepoError;

/// The main repository port for voucher and ledger operations.
///
/// All multi-record writes MUST be atomic: a voucher is never
/// persisted without its ledger update, and vice versa.
/// Implementations use storage transactions to ensure consistency.
#[async_trait::async_trait]
pub trait VoucherRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Counter Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Atomically increments the counter for `scope_key`, creating it
    /// at 0 first if absent, and returns the post-increment value.
    ///
    /// Must be a single atomic fetch-and-increment at the storage
    /// layer, never a read-then-write pair. On error the caller must
    /// assume no number was consumed.
    async fn next_counter_value(&self, scope_key: &str) -> Result<i64, RepoError>;

    /// Reads a counter without incrementing it.
    async fn get_counter(&self, scope_key: &str) -> Result<Option<Counter>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Voucher + Ledger Operations (MUST be atomic)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists the voucher and applies its installment to the
    /// recipient's period ledger in one transaction, upserting the
    /// ledger with zeroed totals on first use.
    async fn issue_voucher(&self, new: NewVoucher) -> Result<Voucher, RepoError>;

    /// Transitions an unpaid voucher owned by the requesting org to
    /// paid and applies the payment to its ledger, in one transaction.
    ///
    /// An already-paid, missing, or foreign-org voucher yields
    /// [`RepoError::NotFoundOrAlreadyPaid`]; an amount exceeding the
    /// installment's remaining balance rolls back with an overpayment
    /// error.
    async fn record_payment(&self, req: RecordPaymentRequest) -> Result<Voucher, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads (already-consistent data)
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets a voucher by ID.
    async fn get_voucher(&self, id: VoucherId) -> Result<Option<Voucher>, RepoError>;

    /// Gets a voucher by its unique number.
    async fn get_voucher_by_number(&self, number: &str) -> Result<Option<Voucher>, RepoError>;

    /// Lists all vouchers issued to a recipient.
    async fn list_vouchers_for_recipient(
        &self,
        recipient_id: RecipientId,
    ) -> Result<Vec<Voucher>, RepoError>;

    /// Gets the ledger for a (recipient, period) pair with its
    /// installments and payment events.
    async fn get_ledger(
        &self,
        recipient_id: RecipientId,
        period: &str,
    ) -> Result<Option<Ledger>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Repair Operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists vouchers carrying a fallback (non-sequential) number.
    async fn list_fallback_vouchers(&self) -> Result<Vec<Voucher>, RepoError>;

    /// Rewrites a fallback voucher's number in place and retags it as
    /// sequential. A voucher that is not fallback-numbered is left
    /// alone and reported as not found.
    async fn rewrite_voucher_number(&self, id: VoucherId, number: &str) -> Result<(), RepoError>;
}
