use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use fractic_server_error::ServerError;
use loan_service_charge::{
    entities::{
        ActivityColumn, JobState, Loan, LoanId, QuarterSelector, ReportRow, RunContext,
        ServiceChargeConfig, ServiceChargeRecord,
    },
    errors::InvalidCsvContent,
    repositories::{
        LedgerRepositoryImpl, LoanRepository, LoanRepositoryImpl, ServiceChargeRepositoryImpl,
    },
    util::ServiceChargeUtil,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const POSTINGS: &str = "account_tag,amount,posting_date,recorded_at
MOBILIZATION,1000,2024-01-10,2024-01-10T08:00:00
SERVICING,2000,2024-02-01,2024-02-01T08:00:00
INVESTMENT,500,2024-02-15,2024-02-15T08:00:00
OVERHEADS,700,2024-03-01,2024-01-05T08:00:00
PROVISIONS,100,2024-01-31,2024-01-31T08:00:00
BF_SERVICING,300,2024-01-01,2024-01-01T08:00:00
SERVICING,9999,2023-12-31,2023-12-31T08:00:00
";

const METRICS: &str = r#"[
    (quarter: Q1, year: 2024, metrics: (
        total_loans: Some(50),
        total_repayment: Some("12000"),
        average_outstanding_balance: Some("20000"),
        average_repayment_term_months: Some(24),
        total_disbursed_amount: Some("5000"),
    )),
]"#;

const LOANS: &str = "loan_id,outstanding_balance,active
L-1,20000,true
L-2,10000,true
L-3,5000,true
L-4,1000,false
";

struct Fixture {
    ledger: Arc<LedgerRepositoryImpl>,
    loans: Arc<LoanRepositoryImpl>,
    util: ServiceChargeUtil,
    ctx: RunContext,
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

async fn fixture(batch_size: usize) -> Fixture {
    let ctx = RunContext::new("tenant-a", at(2024, 2, 20, 12));
    let ledger = Arc::new(LedgerRepositoryImpl::new());
    let charges = Arc::new(ServiceChargeRepositoryImpl::new());
    let loans = Arc::new(LoanRepositoryImpl::new());
    ledger.load_postings_str(&ctx.tenant, POSTINGS).await.unwrap();
    ledger.load_metrics_str(&ctx.tenant, METRICS).await.unwrap();
    loans.load_loans_str(&ctx.tenant, LOANS).await.unwrap();
    let config = ServiceChargeConfig::new("USD")
        .unwrap()
        .with_dispatch_batch_size(batch_size)
        .unwrap();
    let util = ServiceChargeUtil::new(config, ledger.clone(), charges, loans.clone());
    Fixture {
        ledger,
        loans,
        util,
        ctx,
    }
}

fn amount_of(records: &[ServiceChargeRecord], row: ReportRow) -> Decimal {
    records
        .iter()
        .find(|r| r.row == row)
        .map(|r| r.amount)
        .unwrap()
}

#[tokio::test]
async fn computes_reference_quarter() {
    let f = fixture(500).await;
    let sheet = f.util.final_sheet(&f.ctx, None).await.unwrap();
    let data = sheet.data();

    assert_eq!(sheet.range().selector().to_string(), "Q1-2024");
    assert_eq!(
        data.row(ReportRow::Subtotal),
        &[dec!(1000), dec!(2000), dec!(500), dec!(700), dec!(3500)]
    );
    assert_eq!(
        data.row(ReportRow::TotalSegregationCost),
        &[dec!(0), dec!(3460), dec!(840), dec!(0), dec!(4300)]
    );
    assert_eq!(data.particular(ReportRow::TotalMobilization).unwrap(), dec!(3760));
    assert_eq!(data.particular(ReportRow::LoanServicingPa).unwrap(), dec!(1880));
    assert_eq!(data.particular(ReportRow::LoanServicingPerLoan).unwrap(), dec!(37.6));
    assert_eq!(data.particular(ReportRow::AnnualizedCostI).unwrap(), dec!(9.4));
    assert_eq!(
        data.particular(ReportRow::AnnualizedCostTotal).unwrap(),
        dec!(90.72093023)
    );
}

#[tokio::test]
async fn scheduled_run_persists_dispatches_and_is_idempotent() {
    let f = fixture(2).await;

    let outcome = f.util.run_scheduled(&f.ctx).await.unwrap();
    assert_eq!(
        outcome.transitions,
        vec![
            JobState::Idle,
            JobState::Checking,
            JobState::Computing,
            JobState::Persisting,
            JobState::Dispatching,
            JobState::Done,
        ]
    );
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(amount_of(&outcome.records, ReportRow::LoanServicingPerLoan), dec!(37.60));
    assert_eq!(amount_of(&outcome.records, ReportRow::AnnualizedCostI), dec!(9.40));
    assert_eq!(amount_of(&outcome.records, ReportRow::RepaymentPer100), dec!(15.67));
    assert!(outcome.dispatch.is_clean());
    assert_eq!(outcome.dispatch.succeeded.len(), 3);

    let tenant = &f.ctx.tenant;
    assert_eq!(f.loans.service_charge(tenant, &LoanId::from("L-1")).await, Some(dec!(37.60)));
    assert_eq!(f.loans.service_charge(tenant, &LoanId::from("L-2")).await, Some(dec!(18.80)));
    assert_eq!(f.loans.service_charge(tenant, &LoanId::from("L-3")).await, Some(dec!(9.40)));
    assert_eq!(f.loans.service_charge(tenant, &LoanId::from("L-4")).await, None);

    let second = f.util.run_scheduled(&f.ctx).await.unwrap();
    assert!(second.skipped());
    assert_eq!(second.final_state(), JobState::Skip);
    assert!(second.dispatch.succeeded.is_empty());
    assert_eq!(f.util.records_for(&f.ctx, None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn failed_loans_are_reported_and_retried_without_duplication() {
    let f = fixture(500).await;
    let tenant = &f.ctx.tenant;
    let frozen = LoanId::from("L-2");
    f.loans.set_frozen(tenant, &frozen, true).await.unwrap();

    let outcome = f.util.run_scheduled(&f.ctx).await.unwrap();
    assert_eq!(outcome.final_state(), JobState::Done);
    assert_eq!(outcome.dispatch.succeeded.len(), 2);
    assert_eq!(outcome.dispatch.failed_loan_ids(), vec![frozen.clone()]);
    assert_eq!(f.loans.service_charge(tenant, &frozen).await, None);

    f.loans.set_frozen(tenant, &frozen, false).await.unwrap();
    let retry = f
        .util
        .retry_dispatch(&f.ctx, &outcome.dispatch.failed_loan_ids())
        .await
        .unwrap();
    assert!(retry.is_clean());
    assert_eq!(retry.succeeded, vec![frozen.clone()]);
    assert_eq!(f.loans.service_charge(tenant, &frozen).await, Some(dec!(18.80)));

    // Applying again replaces the line item.
    f.util.retry_dispatch(&f.ctx, &[frozen.clone()]).await.unwrap();
    assert_eq!(f.loans.service_charge(tenant, &frozen).await, Some(dec!(18.80)));
    assert_eq!(
        f.loans.service_charge(tenant, &LoanId::from("L-1")).await,
        Some(dec!(37.60))
    );
    assert_eq!(f.util.records_for(&f.ctx, None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn full_redispatch_after_partial_failure_applies_one_charge_per_loan() {
    let f = fixture(2).await;
    let tenant = &f.ctx.tenant;
    let frozen = LoanId::from("L-2");
    f.loans.set_frozen(tenant, &frozen, true).await.unwrap();
    let outcome = f.util.run_scheduled(&f.ctx).await.unwrap();
    assert_eq!(outcome.dispatch.failed_loan_ids(), vec![frozen.clone()]);
    f.loans.set_frozen(tenant, &frozen, false).await.unwrap();

    for _ in 0..2 {
        let report = f.util.resume_dispatch(&f.ctx, None).await.unwrap();
        assert!(report.is_clean());
        assert_eq!(
            report.succeeded,
            vec![LoanId::from("L-1"), LoanId::from("L-2"), LoanId::from("L-3")]
        );
        for (loan_id, expected) in [("L-1", dec!(37.60)), ("L-2", dec!(18.80)), ("L-3", dec!(9.40))] {
            assert_eq!(
                f.loans.service_charge(tenant, &LoanId::from(loan_id)).await,
                Some(expected),
                "{loan_id}"
            );
        }
        assert_eq!(f.loans.service_charge(tenant, &LoanId::from("L-4")).await, None);
    }
    assert_eq!(f.util.records_for(&f.ctx, None).await.unwrap().len(), 3);
}

/// Loan store whose page reads fail once, on the given call.
struct InterruptedLoans {
    inner: Arc<LoanRepositoryImpl>,
    calls: AtomicUsize,
    fail_on_call: usize,
}

#[async_trait]
impl LoanRepository for InterruptedLoans {
    async fn active_loans(
        &self,
        ctx: &RunContext,
        after: Option<&LoanId>,
        limit: usize,
    ) -> Result<Vec<Loan>, ServerError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on_call {
            return Err(InvalidCsvContent::new("loan page unavailable"));
        }
        self.inner.active_loans(ctx, after, limit).await
    }

    async fn find_loan(
        &self,
        ctx: &RunContext,
        loan_id: &LoanId,
    ) -> Result<Option<Loan>, ServerError> {
        self.inner.find_loan(ctx, loan_id).await
    }

    async fn apply_service_charge(
        &self,
        ctx: &RunContext,
        loan_id: &LoanId,
        amount: Decimal,
    ) -> Result<(), ServerError> {
        self.inner.apply_service_charge(ctx, loan_id, amount).await
    }
}

#[tokio::test]
async fn interrupted_dispatch_is_resumed_by_the_next_run() {
    let ctx = RunContext::new("tenant-a", at(2024, 2, 20, 12));
    let ledger = Arc::new(LedgerRepositoryImpl::new());
    let inner = Arc::new(LoanRepositoryImpl::new());
    ledger.load_postings_str(&ctx.tenant, POSTINGS).await.unwrap();
    ledger.load_metrics_str(&ctx.tenant, METRICS).await.unwrap();
    inner.load_loans_str(&ctx.tenant, LOANS).await.unwrap();
    let loans = Arc::new(InterruptedLoans {
        inner: inner.clone(),
        calls: AtomicUsize::new(0),
        fail_on_call: 1,
    });
    let config = ServiceChargeConfig::new("USD")
        .unwrap()
        .with_dispatch_batch_size(2)
        .unwrap();
    let util = ServiceChargeUtil::new(
        config,
        ledger.clone(),
        Arc::new(ServiceChargeRepositoryImpl::new()),
        loans,
    );
    let charge = |id: &'static str| {
        let inner = inner.clone();
        let tenant = ctx.tenant.clone();
        async move { inner.service_charge(&tenant, &LoanId::from(id)).await }
    };

    // The second page read fails: L-1 and L-2 are charged, L-3 is not.
    assert!(util.run_scheduled(&ctx).await.is_err());
    assert_eq!(charge("L-1").await, Some(dec!(37.60)));
    assert_eq!(charge("L-2").await, Some(dec!(18.80)));
    assert_eq!(charge("L-3").await, None);
    assert_eq!(util.records_for(&ctx, None).await.unwrap().len(), 3);

    // Postings recorded after the first run do not change the resumed charges.
    ledger
        .load_postings_str(
            &ctx.tenant,
            "account_tag,amount,posting_date,recorded_at
SERVICING,5000,2024-02-21,2024-02-21T09:00:00
",
        )
        .await
        .unwrap();
    let later = ctx.at(at(2024, 2, 22, 12));
    let resumed = util.run_scheduled(&later).await.unwrap();
    assert_eq!(
        resumed.transitions,
        vec![
            JobState::Idle,
            JobState::Checking,
            JobState::Dispatching,
            JobState::Done,
        ]
    );
    assert_eq!(resumed.records.len(), 3);
    assert!(resumed.dispatch.is_clean());
    assert_eq!(resumed.dispatch.succeeded.len(), 3);
    assert_eq!(charge("L-1").await, Some(dec!(37.60)));
    assert_eq!(charge("L-2").await, Some(dec!(18.80)));
    assert_eq!(charge("L-3").await, Some(dec!(9.40)));

    assert!(util.run_scheduled(&later).await.unwrap().skipped());
}

#[tokio::test]
async fn redispatch_rejects_a_sheet_that_no_longer_matches_its_records() {
    let f = fixture(500).await;
    f.util.run_scheduled(&f.ctx).await.unwrap();
    // Back-dated posting, visible as of the original run.
    f.ledger
        .load_postings_str(
            &f.ctx.tenant,
            "account_tag,amount,posting_date,recorded_at
SERVICING,1000,2024-02-02,2024-02-02T08:00:00
",
        )
        .await
        .unwrap();
    assert!(f.util.resume_dispatch(&f.ctx, None).await.is_err());
    assert_eq!(
        f.loans.service_charge(&f.ctx.tenant, &LoanId::from("L-1")).await,
        Some(dec!(37.60))
    );
}

#[tokio::test]
async fn redispatch_requires_a_persisted_quarter() {
    let f = fixture(500).await;
    let selector: QuarterSelector = "Q2-2024".parse().unwrap();
    assert!(f.util.resume_dispatch(&f.ctx, Some(selector)).await.is_err());
    assert!(f.util.resume_dispatch(&f.ctx, None).await.is_err());
}

#[tokio::test]
async fn retry_reports_unknown_loans() {
    let f = fixture(500).await;
    let report = f
        .util
        .retry_dispatch(&f.ctx, &[LoanId::from("L-1"), LoanId::from("missing")])
        .await
        .unwrap();
    assert_eq!(report.succeeded, vec![LoanId::from("L-1")]);
    assert_eq!(report.failed_loan_ids(), vec![LoanId::from("missing")]);
}

#[tokio::test]
async fn postings_recorded_after_snapshot_are_excluded() {
    let f = fixture(500).await;
    f.ledger
        .load_postings_str(
            &f.ctx.tenant,
            "account_tag,amount,posting_date,recorded_at\nMOBILIZATION,400,2024-02-10,2024-03-01T09:00:00\n",
        )
        .await
        .unwrap();

    let before = f.util.final_sheet(&f.ctx, None).await.unwrap();
    assert_eq!(
        before
            .data()
            .activity_value(ReportRow::Subtotal, ActivityColumn::Mobilisation)
            .unwrap(),
        dec!(1000)
    );

    let later = f.ctx.at(at(2024, 3, 2, 0));
    let after = f.util.final_sheet(&later, None).await.unwrap();
    assert_eq!(
        after
            .data()
            .activity_value(ReportRow::Subtotal, ActivityColumn::Mobilisation)
            .unwrap(),
        dec!(1400)
    );
}

#[tokio::test]
async fn direct_recompute_bypasses_cached_sheet() {
    let f = fixture(500).await;
    let l1 = LoanId::from("L-1");
    f.util.run_scheduled(&f.ctx).await.unwrap();
    assert_eq!(f.util.charge_for_loan(&f.ctx, &l1, false).await.unwrap(), dec!(37.60));

    f.ledger
        .load_postings_str(
            &f.ctx.tenant,
            "account_tag,amount,posting_date,recorded_at\nBF_SERVICING,600,2024-01-02,2024-01-02T08:00:00\n",
        )
        .await
        .unwrap();

    // TM = 3460 + 900, PA = 2180, per loan = 43.60.
    assert_eq!(f.util.charge_for_loan(&f.ctx, &l1, true).await.unwrap(), dec!(43.60));
    assert_eq!(f.util.charge_for_loan(&f.ctx, &l1, false).await.unwrap(), dec!(37.60));
    assert!(f
        .util
        .charge_for_loan(&f.ctx, &LoanId::from("missing"), false)
        .await
        .is_err());
}

#[tokio::test]
async fn override_selector_targets_other_quarter() {
    let f = fixture(500).await;
    let selector: QuarterSelector = "Q4-2023".parse().unwrap();

    let sheet = f.util.final_sheet(&f.ctx, Some(selector)).await.unwrap();
    assert_eq!(sheet.range().formatted_from(), "2023-10-01");
    assert_eq!(sheet.range().formatted_to(), "2023-12-31");
    assert_eq!(
        sheet
            .data()
            .activity_value(ReportRow::Subtotal, ActivityColumn::LoanServicing)
            .unwrap(),
        dec!(9999)
    );

    let outcome = f.util.run_for(&f.ctx, selector).await.unwrap();
    assert_eq!(outcome.final_state(), JobState::Done);
    assert_eq!(f.util.records_for(&f.ctx, Some(selector)).await.unwrap().len(), 3);
    assert!(f.util.records_for(&f.ctx, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn tenants_are_isolated() {
    let f = fixture(500).await;
    let other = RunContext::new("tenant-b", f.ctx.as_of);
    let sheet = f.util.final_sheet(&other, None).await.unwrap();
    assert_eq!(
        sheet.data().row(ReportRow::Subtotal),
        &[dec!(0), dec!(0), dec!(0), dec!(0), dec!(0)]
    );
    let outcome = f.util.run_scheduled(&other).await.unwrap();
    assert!(outcome.dispatch.succeeded.is_empty());
    assert!(!f.util.run_scheduled(&f.ctx).await.unwrap().skipped());
}
