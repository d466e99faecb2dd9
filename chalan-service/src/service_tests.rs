//! ChalanService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use chalan_repo::MemoryRepo;
    use chalan_types::{
        AppError, IssueBatchRequest, IssueOutcome, Numbering, OrgId, RecipientId,
        RecordPaymentRequest, VoucherStatus,
    };

    use crate::directory::StaticDirectory;
    use crate::numbering::is_fallback_number;
    use crate::{ChalanService, run_repair};

    struct Fixture {
        service: ChalanService<MemoryRepo>,
        directory: Arc<StaticDirectory>,
        org: OrgId,
        recipients: [RecipientId; 3],
    }

    fn setup() -> Fixture {
        let org = OrgId::new();
        let recipients = [RecipientId::new(), RecipientId::new(), RecipientId::new()];

        let directory = Arc::new(
            StaticDirectory::new()
                .with_org(org, "abc")
                .with_recipient(recipients[0], "Asha Verma", Some("R-101"))
                .with_recipient(recipients[1], "Bilal Khan", Some("R-102"))
                .with_recipient(recipients[2], "Chitra Rao", None),
        );

        let service = ChalanService::new(MemoryRepo::new(), directory.clone(), directory.clone());

        Fixture {
            service,
            directory,
            org,
            recipients,
        }
    }

    fn issue_req(org: OrgId, recipients: Vec<RecipientId>, amount: i64) -> IssueBatchRequest {
        IssueBatchRequest {
            org_id: org,
            recipient_ids: recipients,
            amount,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            period: "202401".to_string(),
            installment_label: None,
        }
    }

    fn pay_req(view: &chalan_types::VoucherView, org: OrgId) -> RecordPaymentRequest {
        RecordPaymentRequest {
            voucher_id: view.voucher_id,
            org_id: org,
            payment_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            method: "bank".to_string(),
            reference: Some("TXN-1".to_string()),
            amount: None,
        }
    }

    fn view(outcome: &IssueOutcome) -> &chalan_types::VoucherView {
        match outcome {
            IssueOutcome::Issued(v) | IssueOutcome::Fallback(v) => v,
            IssueOutcome::Failed { recipient_id, .. } => {
                panic!("unexpected failure for {}", recipient_id)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_issue_single_voucher() {
        let fx = setup();

        let report = fx
            .service
            .issue_batch(issue_req(fx.org, vec![fx.recipients[0]], 50000))
            .await
            .unwrap();

        assert_eq!(report.requested, 1);
        assert_eq!(report.issued, 1);
        assert_eq!(report.fallback, 0);
        assert_eq!(report.failed, 0);

        let v = view(&report.outcomes[0]);
        assert_eq!(v.voucher_number, "ABC-202401-0001");
        assert_eq!(v.numbering, Numbering::Sequential);
        assert_eq!(v.recipient_name, "Asha Verma");
        assert_eq!(v.roll_number.as_deref(), Some("R-101"));
        assert_eq!(v.status, VoucherStatus::Unpaid);
        assert_eq!(v.installment_label, "Fee 202401");

        let ledger = fx
            .service
            .ledger(fx.recipients[0], "202401")
            .await
            .unwrap();
        assert_eq!(ledger.total_assigned.minor(), 50000);
        assert_eq!(ledger.total_pending.minor(), 50000);
        assert_eq!(ledger.total_paid.minor(), 0);
        assert_eq!(ledger.installments.len(), 1);
    }

    #[tokio::test]
    async fn test_issue_batch_produces_distinct_sequential_numbers() {
        let fx = setup();

        let report = fx
            .service
            .issue_batch(issue_req(fx.org, fx.recipients.to_vec(), 50000))
            .await
            .unwrap();

        assert_eq!(report.issued, 3);

        let mut numbers: Vec<String> = report
            .outcomes
            .iter()
            .map(|o| view(o).voucher_number.clone())
            .collect();
        numbers.sort();
        assert_eq!(
            numbers,
            vec!["ABC-202401-0001", "ABC-202401-0002", "ABC-202401-0003"]
        );

        for recipient in fx.recipients {
            let ledger = fx.service.ledger(recipient, "202401").await.unwrap();
            assert_eq!(ledger.total_pending.minor(), 50000);
        }
    }

    #[tokio::test]
    async fn test_repeat_issuance_is_additive_on_ledger() {
        let fx = setup();
        let recipient = fx.recipients[0];

        fx.service
            .issue_batch(issue_req(fx.org, vec![recipient], 50000))
            .await
            .unwrap();
        fx.service
            .issue_batch(issue_req(fx.org, vec![recipient], 30000))
            .await
            .unwrap();

        let ledger = fx.service.ledger(recipient, "202401").await.unwrap();
        assert_eq!(ledger.total_assigned.minor(), 80000);
        assert_eq!(ledger.total_pending.minor(), 80000);
        assert_eq!(ledger.total_paid.minor(), 0);
        assert_eq!(ledger.installments.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_recipient_gets_placeholder_name() {
        let fx = setup();
        let stranger = RecipientId::new();

        let report = fx
            .service
            .issue_batch(issue_req(fx.org, vec![stranger], 50000))
            .await
            .unwrap();

        // Lookup failure degrades the view, never the issuance.
        assert_eq!(report.issued, 1);
        let v = view(&report.outcomes[0]);
        assert_eq!(v.recipient_name, "(unknown recipient)");
        assert!(v.roll_number.is_none());
    }

    #[tokio::test]
    async fn test_unknown_org_uses_default_code() {
        let fx = setup();
        let foreign_org = OrgId::new();

        let report = fx
            .service
            .issue_batch(issue_req(foreign_org, vec![fx.recipients[0]], 50000))
            .await
            .unwrap();

        let v = view(&report.outcomes[0]);
        assert_eq!(v.voucher_number, "ORG-202401-0001");
    }

    #[tokio::test]
    async fn test_issue_validation() {
        let fx = setup();

        let result = fx.service.issue_batch(issue_req(fx.org, vec![], 50000)).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let mut req = issue_req(fx.org, vec![fx.recipients[0]], 50000);
        req.period = "  ".to_string();
        let result = fx.service.issue_batch(req).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = fx
            .service
            .issue_batch(issue_req(fx.org, vec![fx.recipients[0]], 0))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_counter_outage_degrades_to_fallback() {
        let fx = setup();
        fx.service.repo().set_counter_failure(true);

        let report = fx
            .service
            .issue_batch(issue_req(fx.org, fx.recipients.to_vec(), 50000))
            .await
            .unwrap();

        // Availability over numbering continuity: every recipient
        // still got a voucher, each tagged as degraded.
        assert_eq!(report.issued, 0);
        assert_eq!(report.fallback, 3);
        assert_eq!(report.failed, 0);

        for outcome in &report.outcomes {
            assert!(matches!(outcome, IssueOutcome::Fallback(_)));
            let v = view(outcome);
            assert_eq!(v.numbering, Numbering::Fallback);
            assert!(is_fallback_number(&v.voucher_number));
            assert!(v.voucher_number.starts_with("FB-ABC-"));
        }

        // The voucher/ledger pairs committed despite the outage.
        for recipient in fx.recipients {
            let ledger = fx.service.ledger(recipient, "202401").await.unwrap();
            assert_eq!(ledger.total_pending.minor(), 50000);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payment
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_record_payment_then_retry_is_rejected() {
        let fx = setup();

        let report = fx
            .service
            .issue_batch(issue_req(fx.org, vec![fx.recipients[0]], 50000))
            .await
            .unwrap();
        let issued = view(&report.outcomes[0]).clone();

        let paid = fx
            .service
            .record_payment(pay_req(&issued, fx.org))
            .await
            .unwrap();
        assert_eq!(paid.status, VoucherStatus::Paid);

        let ledger = fx
            .service
            .ledger(fx.recipients[0], "202401")
            .await
            .unwrap();
        assert_eq!(ledger.total_paid.minor(), 50000);
        assert_eq!(ledger.total_pending.minor(), 0);

        // Second attempt hits the deliberately ambiguous error and
        // leaves the ledger untouched.
        let result = fx.service.record_payment(pay_req(&issued, fx.org)).await;
        assert!(matches!(result, Err(AppError::NotFoundOrAlreadyPaid)));

        let ledger = fx
            .service
            .ledger(fx.recipients[0], "202401")
            .await
            .unwrap();
        assert_eq!(ledger.total_paid.minor(), 50000);
        assert_eq!(ledger.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_overpayment_is_a_conflict() {
        let fx = setup();

        let report = fx
            .service
            .issue_batch(issue_req(fx.org, vec![fx.recipients[0]], 50000))
            .await
            .unwrap();
        let issued = view(&report.outcomes[0]).clone();

        let mut req = pay_req(&issued, fx.org);
        req.amount = Some(60000);
        let result = fx.service.record_payment(req).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let ledger = fx
            .service
            .ledger(fx.recipients[0], "202401")
            .await
            .unwrap();
        assert_eq!(ledger.total_paid.minor(), 0);
        assert_eq!(ledger.total_pending.minor(), 50000);
    }

    #[tokio::test]
    async fn test_payment_validation() {
        let fx = setup();

        let report = fx
            .service
            .issue_batch(issue_req(fx.org, vec![fx.recipients[0]], 50000))
            .await
            .unwrap();
        let issued = view(&report.outcomes[0]).clone();

        let mut req = pay_req(&issued, fx.org);
        req.amount = Some(0);
        assert!(matches!(
            fx.service.record_payment(req).await,
            Err(AppError::BadRequest(_))
        ));

        let mut req = pay_req(&issued, fx.org);
        req.method = "  ".to_string();
        assert!(matches!(
            fx.service.record_payment(req).await,
            Err(AppError::BadRequest(_))
        ));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Repair
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_repair_rewrites_fallback_numbers_once() {
        let fx = setup();

        fx.service.repo().set_counter_failure(true);
        fx.service
            .issue_batch(issue_req(
                fx.org,
                vec![fx.recipients[0], fx.recipients[1]],
                50000,
            ))
            .await
            .unwrap();
        fx.service.repo().set_counter_failure(false);

        let report = run_repair(fx.service.repo(), fx.directory.as_ref())
            .await
            .unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.repaired, 2);
        assert!(report.failures.is_empty());

        let mut numbers: Vec<String> = Vec::new();
        for recipient in [fx.recipients[0], fx.recipients[1]] {
            for v in fx.service.vouchers_for_recipient(recipient).await.unwrap() {
                assert_eq!(v.numbering, Numbering::Sequential);
                assert!(!is_fallback_number(&v.voucher_number));
                numbers.push(v.voucher_number);
            }
        }
        numbers.sort();
        assert_eq!(numbers, vec!["ABC-202401-0001", "ABC-202401-0002"]);

        // Second run over the same dataset finds zero candidates.
        let report = run_repair(fx.service.repo(), fx.directory.as_ref())
            .await
            .unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.repaired, 0);
    }

    #[tokio::test]
    async fn test_repair_skips_vouchers_with_unresolved_org() {
        let fx = setup();
        let unlisted_org = OrgId::new();

        fx.service.repo().set_counter_failure(true);
        fx.service
            .issue_batch(issue_req(unlisted_org, vec![fx.recipients[0]], 50000))
            .await
            .unwrap();
        fx.service.repo().set_counter_failure(false);

        let report = run_repair(fx.service.repo(), fx.directory.as_ref())
            .await
            .unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.repaired, 0);
        assert_eq!(report.failures.len(), 1);

        // Still a candidate on the next run once the directory knows
        // the org.
        let vouchers = fx
            .service
            .vouchers_for_recipient(fx.recipients[0])
            .await
            .unwrap();
        assert_eq!(vouchers[0].numbering, Numbering::Fallback);
    }
}
