use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use fractic_server_error::ServerError;
use futures::future::join_all;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        logic::{
            per_loan_charge_calculator::PerLoanChargeCalculator, quarter_resolver::QuarterResolver,
        },
        repositories::{ledger_repository::LedgerRepository, loan_repository::LoanRepository},
        usecases::compute_final_sheet_usecase::{
            ComputeFinalSheetUsecase as _, ComputeFinalSheetUsecaseImpl,
        },
    },
    entities::{
        DispatchFailure, DispatchReport, FinalSheet, Loan, LoanId, RunContext,
        ServiceChargeConfig, TenantId,
    },
    errors::LoanNotFound,
};

#[async_trait]
pub trait LoanChargeUsecase: Send + Sync {
    /// Service charge for one loan. By default derived from the tenant's
    /// most recent final sheet; with `use_direct_recompute` the current
    /// quarter is recomputed from the ledger first and the cached sheet is
    /// left untouched.
    async fn charge_for_loan(
        &self,
        ctx: &RunContext,
        loan_id: &LoanId,
        use_direct_recompute: bool,
    ) -> Result<Decimal, ServerError>;

    /// Applies charges derived from `sheet` to every active loan, page by
    /// page. Individual failures are collected in the report.
    async fn dispatch_all(
        &self,
        ctx: &RunContext,
        sheet: &FinalSheet,
    ) -> Result<DispatchReport, ServerError>;

    /// Applies charges derived from `sheet` to the named loans only.
    async fn dispatch_loans(
        &self,
        ctx: &RunContext,
        sheet: &FinalSheet,
        loan_ids: &[LoanId],
    ) -> DispatchReport;
}

pub(crate) struct LoanChargeUsecaseImpl<L, N>
where
    L: LedgerRepository,
    N: LoanRepository,
{
    config: Arc<ServiceChargeConfig>,
    compute_usecase: Arc<ComputeFinalSheetUsecaseImpl<L>>,
    loan_repository: Arc<N>,
    latest: RwLock<HashMap<TenantId, Arc<FinalSheet>>>,
}

impl<L, N> LoanChargeUsecaseImpl<L, N>
where
    L: LedgerRepository,
    N: LoanRepository,
{
    pub(crate) fn new(
        config: Arc<ServiceChargeConfig>,
        compute_usecase: Arc<ComputeFinalSheetUsecaseImpl<L>>,
        loan_repository: Arc<N>,
    ) -> Self {
        Self {
            config,
            compute_usecase,
            loan_repository,
            latest: RwLock::new(HashMap::new()),
        }
    }

    /// Makes `sheet` the tenant's most recent sheet.
    pub(crate) async fn remember(&self, ctx: &RunContext, sheet: Arc<FinalSheet>) {
        self.latest.write().await.insert(ctx.tenant.clone(), sheet);
    }

    pub(crate) async fn latest_sheet(&self, ctx: &RunContext) -> Option<Arc<FinalSheet>> {
        self.latest.read().await.get(&ctx.tenant).cloned()
    }

    async fn current_sheet(&self, ctx: &RunContext) -> Result<FinalSheet, ServerError> {
        let range = QuarterResolver::current_quarter(ctx.today)?;
        self.compute_usecase.compute(ctx, &range).await
    }

    async fn apply(
        &self,
        ctx: &RunContext,
        calculator: &PerLoanChargeCalculator<'_>,
        loan: &Loan,
    ) -> Result<(), ServerError> {
        let amount = calculator.charge_for(loan)?;
        self.loan_repository
            .apply_service_charge(ctx, &loan.id, amount)
            .await?;
        debug!(loan_id = %loan.id, amount = %amount, "applied service charge");
        Ok(())
    }

    async fn apply_page(
        &self,
        ctx: &RunContext,
        calculator: &PerLoanChargeCalculator<'_>,
        loans: &[Loan],
    ) -> DispatchReport {
        let results = join_all(loans.iter().map(|loan| self.apply(ctx, calculator, loan))).await;
        let mut report = DispatchReport::default();
        for (loan, result) in loans.iter().zip(results) {
            match result {
                Ok(()) => report.succeeded.push(loan.id.clone()),
                Err(e) => {
                    warn!(loan_id = %loan.id, error = %e, "service charge update failed");
                    report.failures.push(DispatchFailure {
                        loan_id: loan.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

#[async_trait]
impl<L, N> LoanChargeUsecase for LoanChargeUsecaseImpl<L, N>
where
    L: LedgerRepository,
    N: LoanRepository,
{
    async fn charge_for_loan(
        &self,
        ctx: &RunContext,
        loan_id: &LoanId,
        use_direct_recompute: bool,
    ) -> Result<Decimal, ServerError> {
        let loan = self
            .loan_repository
            .find_loan(ctx, loan_id)
            .await?
            .ok_or_else(|| LoanNotFound::new(&loan_id.0))?;
        let sheet = if use_direct_recompute {
            Arc::new(self.current_sheet(ctx).await?)
        } else {
            match self.latest_sheet(ctx).await {
                Some(sheet) => sheet,
                None => {
                    let sheet = Arc::new(self.current_sheet(ctx).await?);
                    self.remember(ctx, sheet.clone()).await;
                    sheet
                }
            }
        };
        PerLoanChargeCalculator::new(&sheet, self.config.working_precision).charge_for(&loan)
    }

    async fn dispatch_all(
        &self,
        ctx: &RunContext,
        sheet: &FinalSheet,
    ) -> Result<DispatchReport, ServerError> {
        let calculator = PerLoanChargeCalculator::new(sheet, self.config.working_precision);
        let batch_size = self.config.dispatch_batch_size;
        let mut report = DispatchReport::default();
        let mut cursor: Option<LoanId> = None;
        let mut batch = 0usize;
        loop {
            let page = match self
                .loan_repository
                .active_loans(ctx, cursor.as_ref(), batch_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        tenant = %ctx.tenant,
                        after = ?cursor,
                        succeeded = report.succeeded.len(),
                        failed = report.failures.len(),
                        error = %e,
                        "service charge dispatch interrupted; resume it for the quarter"
                    );
                    return Err(e);
                }
            };
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(last.id.clone());
            batch += 1;
            let page_report = self.apply_page(ctx, &calculator, &page).await;
            info!(
                tenant = %ctx.tenant,
                batch,
                succeeded = page_report.succeeded.len(),
                failed = page_report.failures.len(),
                "dispatched service charge batch"
            );
            report.merge(page_report);
            if page.len() < batch_size {
                break;
            }
        }
        Ok(report)
    }

    async fn dispatch_loans(
        &self,
        ctx: &RunContext,
        sheet: &FinalSheet,
        loan_ids: &[LoanId],
    ) -> DispatchReport {
        let calculator = PerLoanChargeCalculator::new(sheet, self.config.working_precision);
        let mut report = DispatchReport::default();
        for chunk in loan_ids.chunks(self.config.dispatch_batch_size) {
            let mut loans = Vec::with_capacity(chunk.len());
            for loan_id in chunk {
                match self.loan_repository.find_loan(ctx, loan_id).await {
                    Ok(Some(loan)) => loans.push(loan),
                    Ok(None) => report.failures.push(DispatchFailure {
                        loan_id: loan_id.clone(),
                        reason: LoanNotFound::new(&loan_id.0).to_string(),
                    }),
                    Err(e) => report.failures.push(DispatchFailure {
                        loan_id: loan_id.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
            report.merge(self.apply_page(ctx, &calculator, &loans).await);
        }
        report
    }
}
