//! Chalan Application Service
//!
//! Orchestrates voucher issuance and payment recording through the
//! repository port. Contains NO infrastructure logic - pure business
//! orchestration.

use std::sync::Arc;

use chrono::Utc;

use chalan_types::{
    AppError, IssueBatchReport, IssueBatchRequest, IssueOutcome, Ledger, NewVoucher, Numbering,
    OrganizationDirectory, RecipientDirectory, RecipientId, RecordPaymentRequest, Voucher,
    VoucherId, VoucherRepository, VoucherView,
};

use crate::numbering;

/// Placeholder used when the recipient directory cannot resolve an id;
/// issuance never aborts on a display-metadata lookup.
const UNRESOLVED_RECIPIENT: &str = "(unknown recipient)";

/// Application service for voucher issuance and payment recording.
///
/// Generic over `R: VoucherRepository` - the adapter is injected at
/// compile time. The recipient and organization directories are
/// external read-only collaborators, injected as trait objects.
pub struct ChalanService<R: VoucherRepository> {
    repo: R,
    recipients: Arc<dyn RecipientDirectory>,
    orgs: Arc<dyn OrganizationDirectory>,
}

impl<R: VoucherRepository> ChalanService<R> {
    /// Creates a new service with the given repository and directories.
    pub fn new(
        repo: R,
        recipients: Arc<dyn RecipientDirectory>,
        orgs: Arc<dyn OrganizationDirectory>,
    ) -> Self {
        Self {
            repo,
            recipients,
            orgs,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────────────

    /// Issues one voucher per recipient against a period fee.
    ///
    /// Each recipient's voucher/ledger pair commits or rolls back on
    /// its own: a failure for one recipient never unwinds vouchers
    /// already committed in the same batch. A counter outage degrades
    /// the affected vouchers to tagged fallback identifiers instead of
    /// failing them.
    pub async fn issue_batch(
        &self,
        req: IssueBatchRequest,
    ) -> Result<IssueBatchReport, AppError> {
        if req.recipient_ids.is_empty() {
            return Err(AppError::BadRequest("Recipient list cannot be empty".into()));
        }
        if req.period.trim().is_empty() {
            return Err(AppError::BadRequest("Period is required".into()));
        }
        if req.amount <= 0 {
            return Err(AppError::BadRequest("Amount must be positive".into()));
        }
        let amount = chalan_types::Amount::new(req.amount)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let org_code =
            numbering::org_code_or_default(self.orgs.resolve_code(req.org_id).await.as_deref());
        let scope = numbering::scope_key(&org_code, &req.period);
        let label = req
            .installment_label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Fee {}", req.period));

        let mut outcomes = Vec::with_capacity(req.recipient_ids.len());

        for recipient_id in &req.recipient_ids {
            let recipient_id = *recipient_id;

            let (number, numbering_tag) = match self.repo.next_counter_value(&scope).await {
                Ok(sequence) => (
                    numbering::format_number(&org_code, &req.period, sequence),
                    Numbering::Sequential,
                ),
                Err(err) => {
                    // No number was consumed; degrade this voucher and
                    // keep processing the batch.
                    tracing::warn!(
                        %recipient_id,
                        scope = %scope,
                        error = %err,
                        "numbering counter unavailable, issuing fallback identifier"
                    );
                    (
                        numbering::fallback_number(&org_code, Utc::now(), recipient_id),
                        Numbering::Fallback,
                    )
                }
            };

            let new = NewVoucher {
                recipient_id,
                org_id: req.org_id,
                number,
                numbering: numbering_tag,
                amount,
                due_date: req.due_date,
                period: req.period.clone(),
                installment_label: label.clone(),
            };

            match self.repo.issue_voucher(new).await {
                Ok(voucher) => {
                    let view = self.view_of(voucher).await;
                    outcomes.push(match numbering_tag {
                        Numbering::Sequential => IssueOutcome::Issued(view),
                        Numbering::Fallback => IssueOutcome::Fallback(view),
                    });
                }
                Err(err) => {
                    tracing::error!(
                        %recipient_id,
                        error = %err,
                        "voucher/ledger transaction rolled back for recipient"
                    );
                    outcomes.push(IssueOutcome::Failed {
                        recipient_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(Self::report_from(outcomes, req.recipient_ids.len()))
    }

    fn report_from(outcomes: Vec<IssueOutcome>, requested: usize) -> IssueBatchReport {
        let mut issued = 0;
        let mut fallback = 0;
        let mut failed_recipients = Vec::new();

        for outcome in &outcomes {
            match outcome {
                IssueOutcome::Issued(_) => issued += 1,
                IssueOutcome::Fallback(_) => fallback += 1,
                IssueOutcome::Failed { recipient_id, .. } => {
                    failed_recipients.push(*recipient_id)
                }
            }
        }

        IssueBatchReport {
            requested,
            issued,
            fallback,
            failed: failed_recipients.len(),
            outcomes,
            failed_recipients,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment
    // ─────────────────────────────────────────────────────────────────────────────

    /// Records a payment against an unpaid voucher owned by the
    /// calling org.
    ///
    /// The repository applies the voucher transition and the ledger
    /// update in one transaction; neither is ever applied alone.
    pub async fn record_payment(
        &self,
        req: RecordPaymentRequest,
    ) -> Result<VoucherView, AppError> {
        if let Some(amount) = req.amount {
            if amount <= 0 {
                return Err(AppError::BadRequest("Amount must be positive".into()));
            }
        }
        if req.method.trim().is_empty() {
            return Err(AppError::BadRequest("Payment method is required".into()));
        }

        let voucher = self.repo.record_payment(req).await?;
        Ok(self.view_of(voucher).await)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets a voucher by ID.
    pub async fn voucher(&self, id: VoucherId) -> Result<VoucherView, AppError> {
        let voucher = self
            .repo
            .get_voucher(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Voucher {}", id)))?;
        Ok(self.view_of(voucher).await)
    }

    /// Gets a voucher by its unique number.
    pub async fn voucher_by_number(&self, number: &str) -> Result<VoucherView, AppError> {
        let voucher = self
            .repo
            .get_voucher_by_number(number)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Voucher {}", number)))?;
        Ok(self.view_of(voucher).await)
    }

    /// Lists all vouchers issued to a recipient.
    pub async fn vouchers_for_recipient(
        &self,
        recipient_id: RecipientId,
    ) -> Result<Vec<VoucherView>, AppError> {
        let vouchers = self.repo.list_vouchers_for_recipient(recipient_id).await?;
        let mut views = Vec::with_capacity(vouchers.len());
        for voucher in vouchers {
            views.push(self.view_of(voucher).await);
        }
        Ok(views)
    }

    /// Gets the ledger for a (recipient, period) pair.
    pub async fn ledger(
        &self,
        recipient_id: RecipientId,
        period: &str,
    ) -> Result<Ledger, AppError> {
        self.repo
            .get_ledger(recipient_id, period)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Ledger for {} in {}", recipient_id, period))
            })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // View assembly
    // ─────────────────────────────────────────────────────────────────────────────

    async fn view_of(&self, voucher: Voucher) -> VoucherView {
        let (recipient_name, roll_number) =
            match self.recipients.resolve(voucher.recipient_id).await {
                Some(profile) => (profile.name, profile.roll_number),
                None => {
                    tracing::warn!(
                        recipient_id = %voucher.recipient_id,
                        "recipient lookup failed, substituting placeholder"
                    );
                    (UNRESOLVED_RECIPIENT.to_string(), None)
                }
            };

        VoucherView {
            voucher_id: voucher.id,
            voucher_number: voucher.number,
            numbering: voucher.numbering,
            recipient_id: voucher.recipient_id,
            recipient_name,
            roll_number,
            amount: voucher.amount.minor(),
            due_date: voucher.due_date,
            status: voucher.status,
            installment_label: voucher.installment_label,
            period: voucher.period,
            ledger_id: voucher.ledger_id,
        }
    }
}
