//! In-memory repository adapter.
//!
//! Backs the service-level test suite and serves as the reference
//! implementation of the port's transactional semantics: every
//! multi-record write validates fully before mutating, so a rejected
//! operation leaves no partial state behind.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use chalan_types::{
    Amount, Counter, Ledger, NewVoucher, RecipientId, RecordPaymentRequest, RepoError, Voucher,
    VoucherId, VoucherRepository,
};

/// In-memory repository implementation.
#[derive(Default)]
pub struct MemoryRepo {
    counters: DashMap<String, Counter>,
    vouchers: Mutex<HashMap<VoucherId, Voucher>>,
    ledgers: Mutex<HashMap<(RecipientId, String), Ledger>>,
    fail_counters: AtomicBool,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent counter call fail with a storage error,
    /// simulating an unavailable numbering service. Used to exercise
    /// the issuer's fallback path.
    pub fn set_counter_failure(&self, fail: bool) {
        self.fail_counters.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl VoucherRepository for MemoryRepo {
    async fn next_counter_value(&self, scope_key: &str) -> Result<i64, RepoError> {
        if self.fail_counters.load(Ordering::SeqCst) {
            return Err(RepoError::Database("counter store unavailable".into()));
        }

        // The entry guard is held for the whole increment, so each
        // caller sees a distinct value.
        let mut entry = self
            .counters
            .entry(scope_key.to_string())
            .or_insert_with(|| Counter {
                scope_key: scope_key.to_string(),
                sequence: 0,
                updated_at: Utc::now(),
            });
        entry.sequence += 1;
        entry.updated_at = Utc::now();
        Ok(entry.sequence)
    }

    async fn get_counter(&self, scope_key: &str) -> Result<Option<Counter>, RepoError> {
        Ok(self.counters.get(scope_key).map(|c| c.value().clone()))
    }

    async fn issue_voucher(&self, new: NewVoucher) -> Result<Voucher, RepoError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let mut vouchers = self.vouchers.lock().unwrap();

        if vouchers.values().any(|v| v.number == new.number) {
            return Err(RepoError::Conflict(format!(
                "voucher number {} already exists",
                new.number
            )));
        }

        let ledger = ledgers
            .entry((new.recipient_id, new.period.clone()))
            .or_insert_with(|| Ledger::open(new.recipient_id, new.period.clone()));

        let voucher = Voucher::issue(
            new.number,
            new.numbering,
            new.recipient_id,
            new.org_id,
            new.amount,
            new.due_date,
            new.period,
            new.installment_label,
            ledger.id,
        );

        ledger.apply_new_installment(
            voucher.id,
            voucher.installment_label.clone(),
            voucher.amount,
            voucher.due_date,
        );
        vouchers.insert(voucher.id, voucher.clone());

        Ok(voucher)
    }

    async fn record_payment(&self, req: RecordPaymentRequest) -> Result<Voucher, RepoError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let mut vouchers = self.vouchers.lock().unwrap();

        let voucher = vouchers
            .get_mut(&req.voucher_id)
            .filter(|v| v.org_id == req.org_id)
            .ok_or(RepoError::NotFoundOrAlreadyPaid)?;
        if !voucher.is_unpaid() {
            return Err(RepoError::NotFoundOrAlreadyPaid);
        }

        let amount = match req.amount {
            Some(minor) => Amount::new(minor).map_err(RepoError::Domain)?,
            None => voucher.amount,
        };

        let ledger = ledgers
            .get_mut(&(voucher.recipient_id, voucher.period.clone()))
            .ok_or(RepoError::NotFound)?;

        // The ledger rejects overpayment before mutating anything, so
        // the voucher transition below only happens when both sides
        // can apply.
        ledger
            .apply_payment(
                voucher.id,
                amount,
                req.payment_date,
                req.method.clone(),
                req.reference.clone(),
            )
            .map_err(RepoError::Domain)?;

        voucher.mark_paid(req.payment_date, req.method, req.reference);
        Ok(voucher.clone())
    }

    async fn get_voucher(&self, id: VoucherId) -> Result<Option<Voucher>, RepoError> {
        Ok(self.vouchers.lock().unwrap().get(&id).cloned())
    }

    async fn get_voucher_by_number(&self, number: &str) -> Result<Option<Voucher>, RepoError> {
        Ok(self
            .vouchers
            .lock()
            .unwrap()
            .values()
            .find(|v| v.number == number)
            .cloned())
    }

    async fn list_vouchers_for_recipient(
        &self,
        recipient_id: RecipientId,
    ) -> Result<Vec<Voucher>, RepoError> {
        Ok(self
            .vouchers
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.recipient_id == recipient_id)
            .cloned()
            .collect())
    }

    async fn get_ledger(
        &self,
        recipient_id: RecipientId,
        period: &str,
    ) -> Result<Option<Ledger>, RepoError> {
        Ok(self
            .ledgers
            .lock()
            .unwrap()
            .get(&(recipient_id, period.to_string()))
            .cloned())
    }

    async fn list_fallback_vouchers(&self) -> Result<Vec<Voucher>, RepoError> {
        let mut found: Vec<Voucher> = self
            .vouchers
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.numbering == chalan_types::Numbering::Fallback)
            .cloned()
            .collect();
        found.sort_by_key(|v| v.created_at);
        Ok(found)
    }

    async fn rewrite_voucher_number(&self, id: VoucherId, number: &str) -> Result<(), RepoError> {
        let mut vouchers = self.vouchers.lock().unwrap();
        let voucher = vouchers.get_mut(&id).ok_or(RepoError::NotFound)?;
        if voucher.numbering != chalan_types::Numbering::Fallback {
            return Err(RepoError::NotFound);
        }
        voucher.number = number.to_string();
        voucher.numbering = chalan_types::Numbering::Sequential;
        Ok(())
    }
}
