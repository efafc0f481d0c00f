use std::sync::Arc;

use fractic_server_error::ServerError;
use rust_decimal::Decimal;

use crate::{
    data::repositories::{
        ledger_repository_impl::LedgerRepositoryImpl, loan_repository_impl::LoanRepositoryImpl,
        service_charge_repository_impl::ServiceChargeRepositoryImpl,
    },
    domain::{
        logic::{cost_category_tagger::CostCategoryTagger, quarter_resolver::QuarterResolver},
        repositories::{
            ledger_repository::LedgerRepository, loan_repository::LoanRepository,
            service_charge_repository::ServiceChargeRepository,
        },
        usecases::{
            compute_final_sheet_usecase::{
                ComputeFinalSheetUsecase as _, ComputeFinalSheetUsecaseImpl,
            },
            loan_charge_usecase::{LoanChargeUsecase as _, LoanChargeUsecaseImpl},
            scheduled_recompute_usecase::{
                ScheduledRecomputeUsecase as _, ScheduledRecomputeUsecaseImpl,
            },
        },
    },
    entities::{
        DispatchReport, FinalSheet, JobOutcome, LoanId, QuarterRange, QuarterSelector,
        RunContext, ServiceChargeConfig, ServiceChargeRecord,
    },
};

/// Entry point wiring the service charge computation to its collaborators.
///
/// The repositories are supplied by the caller; the in-memory
/// implementations are the defaults.
pub struct ServiceChargeUtil<
    L = LedgerRepositoryImpl,
    C = ServiceChargeRepositoryImpl,
    N = LoanRepositoryImpl,
> where
    L: LedgerRepository,
    C: ServiceChargeRepository,
    N: LoanRepository,
{
    compute_usecase: Arc<ComputeFinalSheetUsecaseImpl<L>>,
    loan_charge_usecase: Arc<LoanChargeUsecaseImpl<L, N>>,
    scheduled_recompute_usecase: ScheduledRecomputeUsecaseImpl<L, C, N>,
    service_charge_repository: Arc<C>,
}

impl<L, C, N> ServiceChargeUtil<L, C, N>
where
    L: LedgerRepository,
    C: ServiceChargeRepository,
    N: LoanRepository,
{
    pub fn new(
        config: ServiceChargeConfig,
        ledger_repository: Arc<L>,
        service_charge_repository: Arc<C>,
        loan_repository: Arc<N>,
    ) -> Self {
        let config = Arc::new(config);
        let tagger = Arc::new(CostCategoryTagger::new(&config));
        let compute_usecase = Arc::new(ComputeFinalSheetUsecaseImpl::new(
            config.clone(),
            tagger,
            ledger_repository,
        ));
        let loan_charge_usecase = Arc::new(LoanChargeUsecaseImpl::new(
            config.clone(),
            compute_usecase.clone(),
            loan_repository,
        ));
        let scheduled_recompute_usecase = ScheduledRecomputeUsecaseImpl::new(
            config,
            compute_usecase.clone(),
            loan_charge_usecase.clone(),
            service_charge_repository.clone(),
        );
        Self {
            compute_usecase,
            loan_charge_usecase,
            scheduled_recompute_usecase,
            service_charge_repository,
        }
    }

    /// Computes the final sheet on demand, for the selected quarter or the
    /// quarter containing `ctx.today`. Nothing is persisted.
    pub async fn final_sheet(
        &self,
        ctx: &RunContext,
        selector: Option<QuarterSelector>,
    ) -> Result<FinalSheet, ServerError> {
        let range = resolve(ctx, selector)?;
        self.compute_usecase.compute(ctx, &range).await
    }

    /// Scheduled entry point for the current quarter.
    pub async fn run_scheduled(&self, ctx: &RunContext) -> Result<JobOutcome, ServerError> {
        self.scheduled_recompute_usecase.run(ctx, None).await
    }

    pub async fn run_for(
        &self,
        ctx: &RunContext,
        selector: QuarterSelector,
    ) -> Result<JobOutcome, ServerError> {
        self.scheduled_recompute_usecase.run(ctx, Some(selector)).await
    }

    pub async fn charge_for_loan(
        &self,
        ctx: &RunContext,
        loan_id: &LoanId,
        use_direct_recompute: bool,
    ) -> Result<Decimal, ServerError> {
        self.loan_charge_usecase
            .charge_for_loan(ctx, loan_id, use_direct_recompute)
            .await
    }

    /// Re-applies charges for the named loans only. The sheet is the one
    /// last computed or dispatched for the tenant; after a restart it is the
    /// current quarter's persisted sheet, rebuilt as of its records'
    /// `computed_at`. A quarter that was never persisted is computed fresh.
    pub async fn retry_dispatch(
        &self,
        ctx: &RunContext,
        loan_ids: &[LoanId],
    ) -> Result<DispatchReport, ServerError> {
        let sheet = match self.loan_charge_usecase.latest_sheet(ctx).await {
            Some(sheet) => sheet,
            None => {
                let range = QuarterResolver::current_quarter(ctx.today)?;
                let sheet = match self
                    .scheduled_recompute_usecase
                    .persisted_sheet(ctx, &range)
                    .await?
                {
                    Some((_, sheet)) => sheet,
                    None => Arc::new(self.compute_usecase.compute(ctx, &range).await?),
                };
                self.loan_charge_usecase.remember(ctx, sheet.clone()).await;
                sheet
            }
        };
        Ok(self
            .loan_charge_usecase
            .dispatch_loans(ctx, &sheet, loan_ids)
            .await)
    }

    /// Re-applies charges to every active loan from the persisted sheet of
    /// the selected (or current) quarter. Safe to repeat: each loan's line
    /// item is replaced, never accumulated.
    pub async fn resume_dispatch(
        &self,
        ctx: &RunContext,
        selector: Option<QuarterSelector>,
    ) -> Result<DispatchReport, ServerError> {
        self.scheduled_recompute_usecase
            .resume_dispatch(ctx, selector)
            .await
    }

    pub async fn records_for(
        &self,
        ctx: &RunContext,
        selector: Option<QuarterSelector>,
    ) -> Result<Vec<ServiceChargeRecord>, ServerError> {
        let range = resolve(ctx, selector)?;
        self.service_charge_repository
            .records_for(ctx, range.quarter(), range.year())
            .await
    }
}

fn resolve(ctx: &RunContext, selector: Option<QuarterSelector>) -> Result<QuarterRange, ServerError> {
    match selector {
        Some(selector) => QuarterResolver::resolve(&selector),
        None => QuarterResolver::current_quarter(ctx.today),
    }
}
