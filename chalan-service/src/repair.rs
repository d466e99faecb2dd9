//! Offline repair of fallback voucher numbers.

use chalan_types::{
    AppError, OrganizationDirectory, RepairFailure, RepairReport, VoucherRepository,
};

use crate::numbering;

/// Rewrites fallback-numbered vouchers with fresh sequential numbers.
///
/// A one-shot maintenance operation run out-of-band, not part of
/// request-serving concurrency. Idempotent across runs: repaired
/// vouchers drop out of the scan predicate, and a rerun after a
/// partial failure picks up only the unrepaired remainder. Each
/// individual repair still consumes a new, never-reused sequence
/// number.
///
/// Returns an error only on unrecoverable top-level failure (the scan
/// itself failing); per-record failures are logged and reported.
pub async fn run_repair<R: VoucherRepository>(
    repo: &R,
    orgs: &dyn OrganizationDirectory,
) -> Result<RepairReport, AppError> {
    let candidates = repo.list_fallback_vouchers().await?;
    let scanned = candidates.len();
    tracing::info!(scanned, "scanning fallback-numbered vouchers");

    let mut repaired = 0;
    let mut failures = Vec::new();

    for voucher in candidates {
        // An unresolved org code leaves the voucher untouched; the
        // rewrite is permanent, a rerun after the directory heals is
        // not.
        let Some(code) = orgs.resolve_code(voucher.org_id).await else {
            tracing::warn!(
                voucher_id = %voucher.id,
                org_id = %voucher.org_id,
                "organization code unresolved, skipping voucher"
            );
            failures.push(RepairFailure {
                voucher_id: voucher.id,
                reason: "organization code unresolved".to_string(),
            });
            continue;
        };
        let code = numbering::org_code_or_default(Some(&code));

        // Scope from the voucher's original issuance period, not the
        // current one.
        let scope = numbering::scope_key(&code, &voucher.period);
        let sequence = match repo.next_counter_value(&scope).await {
            Ok(sequence) => sequence,
            Err(err) => {
                tracing::warn!(voucher_id = %voucher.id, error = %err, "counter unavailable");
                failures.push(RepairFailure {
                    voucher_id: voucher.id,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let number = numbering::format_number(&code, &voucher.period, sequence);
        match repo.rewrite_voucher_number(voucher.id, &number).await {
            Ok(()) => {
                tracing::info!(
                    voucher_id = %voucher.id,
                    old_number = %voucher.number,
                    new_number = %number,
                    "rewrote fallback voucher number"
                );
                repaired += 1;
            }
            Err(err) => {
                tracing::error!(voucher_id = %voucher.id, error = %err, "rewrite failed");
                failures.push(RepairFailure {
                    voucher_id: voucher.id,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(RepairReport {
        scanned,
        repaired,
        failures,
    })
}
