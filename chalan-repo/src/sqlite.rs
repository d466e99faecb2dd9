//! SQLite repository adapter.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

use chalan_types::{
    Amount, Counter, DomainError, Ledger, NewVoucher, RecipientId, RecordPaymentRequest, RepoError,
    Voucher, VoucherId, VoucherRepository,
};

use crate::types::{DbCounter, DbInstallment, DbLedger, DbPaymentEvent, DbVoucher};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
///
/// All mutual exclusion is delegated to the store: the counter upsert
/// is a single atomic statement, and every voucher+ledger pair is
/// written inside one transaction.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file
        tracing::debug!(database_url, "applying sqlite migrations");
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl VoucherRepository for SqliteRepo {
    async fn next_counter_value(&self, scope_key: &str) -> Result<i64, RepoError> {
        let now = chrono::Utc::now().to_rfc3339();

        // Single atomic fetch-and-increment with lazy creation; a
        // read-then-write pair here would race under concurrency.
        let row: (i64,) = sqlx::query_as(
            r#"INSERT INTO counters (scope_key, sequence, updated_at) VALUES (?, 1, ?)
               ON CONFLICT(scope_key) DO UPDATE
               SET sequence = sequence + 1, updated_at = excluded.updated_at
               RETURNING sequence"#,
        )
        .bind(scope_key)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(row.0)
    }

    async fn get_counter(&self, scope_key: &str) -> Result<Option<Counter>, RepoError> {
        let row: Option<DbCounter> = sqlx::query_as(
            r#"SELECT scope_key, sequence, updated_at FROM counters WHERE scope_key = ?"#,
        )
        .bind(scope_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbCounter::into_domain).transpose()
    }

    async fn issue_voucher(&self, new: NewVoucher) -> Result<Voucher, RepoError> {
        let recipient_str = new.recipient_id.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        // Upsert the (recipient, period) ledger with zeroed totals.
        let candidate_id = chalan_types::LedgerId::new();
        sqlx::query(
            r#"INSERT INTO ledgers (id, recipient_id, period, total_assigned, total_paid, total_pending, created_at)
               VALUES (?, ?, ?, 0, 0, 0, ?)
               ON CONFLICT(recipient_id, period) DO NOTHING"#,
        )
        .bind(candidate_id.to_string())
        .bind(&recipient_str)
        .bind(&new.period)
        .bind(&now)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let (ledger_id_str,): (String,) =
            sqlx::query_as(r#"SELECT id FROM ledgers WHERE recipient_id = ? AND period = ?"#)
                .bind(&recipient_str)
                .bind(&new.period)
                .fetch_one(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        let ledger_id = chalan_types::LedgerId::from_uuid(crate::types::parse_uuid(&ledger_id_str)?);

        let voucher = Voucher::issue(
            new.number,
            new.numbering,
            new.recipient_id,
            new.org_id,
            new.amount,
            new.due_date,
            new.period,
            new.installment_label,
            ledger_id,
        );

        sqlx::query(
            r#"INSERT INTO vouchers (id, number, numbering, recipient_id, org_id, amount, due_date, status, period, installment_label, ledger_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(voucher.id.to_string())
        .bind(&voucher.number)
        .bind(voucher.numbering.to_string())
        .bind(&recipient_str)
        .bind(voucher.org_id.to_string())
        .bind(voucher.amount.minor())
        .bind(voucher.due_date.to_string())
        .bind(voucher.status.to_string())
        .bind(&voucher.period)
        .bind(&voucher.installment_label)
        .bind(&ledger_id_str)
        .bind(voucher.created_at.to_rfc3339())
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO installments (id, ledger_id, voucher_id, name, amount, due_date, status, paid_amount)
               VALUES (?, ?, ?, ?, ?, ?, 'PENDING', 0)"#,
        )
        .bind(chalan_types::InstallmentId::new().to_string())
        .bind(&ledger_id_str)
        .bind(voucher.id.to_string())
        .bind(&voucher.installment_label)
        .bind(voucher.amount.minor())
        .bind(voucher.due_date.to_string())
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(
            r#"UPDATE ledgers
               SET total_assigned = total_assigned + ?, total_pending = total_pending + ?
               WHERE id = ?"#,
        )
        .bind(voucher.amount.minor())
        .bind(voucher.amount.minor())
        .bind(&ledger_id_str)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(voucher)
    }

    async fn record_payment(&self, req: RecordPaymentRequest) -> Result<Voucher, RepoError> {
        let voucher_str = req.voucher_id.to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        // Missing, foreign-org, and already-paid vouchers all map to
        // the same error so client retries stay idempotent.
        let row: Option<DbVoucher> = sqlx::query_as(
            r#"SELECT id, number, numbering, recipient_id, org_id, amount, due_date, status, period, installment_label, ledger_id, payment_date, payment_method, payment_reference, created_at
               FROM vouchers WHERE id = ? AND org_id = ?"#,
        )
        .bind(&voucher_str)
        .bind(req.org_id.to_string())
        .fetch_optional(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let mut voucher = row
            .ok_or(RepoError::NotFoundOrAlreadyPaid)?
            .into_domain()?;
        if !voucher.is_unpaid() {
            return Err(RepoError::NotFoundOrAlreadyPaid);
        }

        let amount = match req.amount {
            Some(minor) => Amount::new(minor).map_err(RepoError::Domain)?,
            None => voucher.amount,
        };

        let installment: Option<DbInstallment> = sqlx::query_as(
            r#"SELECT id, voucher_id, name, amount, due_date, status, paid_amount, paid_date
               FROM installments WHERE voucher_id = ?"#,
        )
        .bind(&voucher_str)
        .fetch_optional(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let installment = installment.ok_or(RepoError::NotFound)?;

        let remaining = installment.amount - installment.paid_amount;
        if amount.minor() > remaining {
            return Err(RepoError::Domain(DomainError::Overpayment {
                remaining,
                requested: amount.minor(),
            }));
        }

        let new_paid = installment.paid_amount + amount.minor();
        let new_status = if new_paid == installment.amount {
            "PAID"
        } else {
            "PENDING"
        };

        // Status guard repeated in the UPDATE: a concurrent payer that
        // committed first makes this a no-op and the transaction rolls
        // back.
        let result = sqlx::query(
            r#"UPDATE vouchers
               SET status = 'PAID', payment_date = ?, payment_method = ?, payment_reference = ?
               WHERE id = ? AND status = 'UNPAID'"#,
        )
        .bind(req.payment_date.to_string())
        .bind(&req.method)
        .bind(&req.reference)
        .bind(&voucher_str)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFoundOrAlreadyPaid);
        }

        sqlx::query(
            r#"UPDATE installments SET paid_amount = ?, status = ?, paid_date = ? WHERE id = ?"#,
        )
        .bind(new_paid)
        .bind(new_status)
        .bind(req.payment_date.to_string())
        .bind(&installment.id)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(
            r#"UPDATE ledgers
               SET total_paid = total_paid + ?, total_pending = total_pending - ?
               WHERE id = ?"#,
        )
        .bind(amount.minor())
        .bind(amount.minor())
        .bind(voucher.ledger_id.to_string())
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO payment_events (id, ledger_id, voucher_id, amount, date, method, reference)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(voucher.ledger_id.to_string())
        .bind(&voucher_str)
        .bind(amount.minor())
        .bind(req.payment_date.to_string())
        .bind(&req.method)
        .bind(&req.reference)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        voucher.mark_paid(req.payment_date, req.method, req.reference);
        Ok(voucher)
    }

    async fn get_voucher(&self, id: VoucherId) -> Result<Option<Voucher>, RepoError> {
        let row: Option<DbVoucher> = sqlx::query_as(
            r#"SELECT id, number, numbering, recipient_id, org_id, amount, due_date, status, period, installment_label, ledger_id, payment_date, payment_method, payment_reference, created_at
               FROM vouchers WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbVoucher::into_domain).transpose()
    }

    async fn get_voucher_by_number(&self, number: &str) -> Result<Option<Voucher>, RepoError> {
        let row: Option<DbVoucher> = sqlx::query_as(
            r#"SELECT id, number, numbering, recipient_id, org_id, amount, due_date, status, period, installment_label, ledger_id, payment_date, payment_method, payment_reference, created_at
               FROM vouchers WHERE number = ?"#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbVoucher::into_domain).transpose()
    }

    async fn list_vouchers_for_recipient(
        &self,
        recipient_id: RecipientId,
    ) -> Result<Vec<Voucher>, RepoError> {
        let rows: Vec<DbVoucher> = sqlx::query_as(
            r#"SELECT id, number, numbering, recipient_id, org_id, amount, due_date, status, period, installment_label, ledger_id, payment_date, payment_method, payment_reference, created_at
               FROM vouchers WHERE recipient_id = ? ORDER BY created_at DESC"#,
        )
        .bind(recipient_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbVoucher::into_domain).collect()
    }

    async fn get_ledger(
        &self,
        recipient_id: RecipientId,
        period: &str,
    ) -> Result<Option<Ledger>, RepoError> {
        let recipient_str = recipient_id.to_string();

        let row: Option<DbLedger> = sqlx::query_as(
            r#"SELECT id, recipient_id, period, total_assigned, total_paid, total_pending, created_at
               FROM ledgers WHERE recipient_id = ? AND period = ?"#,
        )
        .bind(&recipient_str)
        .bind(period)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some(ledger_row) = row else {
            return Ok(None);
        };

        let installment_rows: Vec<DbInstallment> = sqlx::query_as(
            r#"SELECT id, voucher_id, name, amount, due_date, status, paid_amount, paid_date
               FROM installments WHERE ledger_id = ? ORDER BY rowid"#,
        )
        .bind(&ledger_row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let payment_rows: Vec<DbPaymentEvent> = sqlx::query_as(
            r#"SELECT voucher_id, amount, date, method, reference
               FROM payment_events WHERE ledger_id = ? ORDER BY rowid"#,
        )
        .bind(&ledger_row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let installments = installment_rows
            .into_iter()
            .map(DbInstallment::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let payments = payment_rows
            .into_iter()
            .map(DbPaymentEvent::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        ledger_row.into_domain(installments, payments).map(Some)
    }

    async fn list_fallback_vouchers(&self) -> Result<Vec<Voucher>, RepoError> {
        let rows: Vec<DbVoucher> = sqlx::query_as(
            r#"SELECT id, number, numbering, recipient_id, org_id, amount, due_date, status, period, installment_label, ledger_id, payment_date, payment_method, payment_reference, created_at
               FROM vouchers WHERE numbering = 'FALLBACK' ORDER BY created_at ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbVoucher::into_domain).collect()
    }

    async fn rewrite_voucher_number(&self, id: VoucherId, number: &str) -> Result<(), RepoError> {
        // The numbering guard keeps reruns idempotent: a voucher
        // already rewritten is no longer a candidate.
        let result = sqlx::query(
            r#"UPDATE vouchers SET number = ?, numbering = 'SEQUENTIAL'
               WHERE id = ? AND numbering = 'FALLBACK'"#,
        )
        .bind(number)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
