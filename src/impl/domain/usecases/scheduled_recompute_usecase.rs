use std::sync::Arc;

use async_trait::async_trait;
use fractic_server_error::ServerError;
use tracing::{error, info, warn};

use crate::{
    domain::{
        logic::{quarter_resolver::QuarterResolver, utils::round_half_up},
        repositories::{
            ledger_repository::LedgerRepository, loan_repository::LoanRepository,
            service_charge_repository::ServiceChargeRepository,
        },
        usecases::{
            compute_final_sheet_usecase::{
                ComputeFinalSheetUsecase as _, ComputeFinalSheetUsecaseImpl,
            },
            loan_charge_usecase::{LoanChargeUsecase as _, LoanChargeUsecaseImpl},
        },
    },
    entities::{
        DispatchReport, FinalSheet, JobOutcome, JobState, QuarterRange, QuarterSelector,
        ReportRow, RunContext, ServiceChargeConfig, ServiceChargeRecord,
    },
    errors::{GenericCalculationFailure, QuarterNotComputed},
};

#[async_trait]
pub trait ScheduledRecomputeUsecase: Send + Sync {
    /// Computes, persists and dispatches the quarter's service charges unless
    /// its headline records already exist. When they exist but their
    /// dispatch never completed, the dispatch is run again from the
    /// persisted sheet. Without a selector the quarter containing
    /// `ctx.today` is used.
    async fn run(
        &self,
        ctx: &RunContext,
        selector: Option<QuarterSelector>,
    ) -> Result<JobOutcome, ServerError>;

    /// Re-applies charges to every active loan from the quarter's persisted
    /// sheet, whether or not an earlier dispatch completed.
    async fn resume_dispatch(
        &self,
        ctx: &RunContext,
        selector: Option<QuarterSelector>,
    ) -> Result<DispatchReport, ServerError>;
}

pub(crate) struct ScheduledRecomputeUsecaseImpl<L, C, N>
where
    L: LedgerRepository,
    C: ServiceChargeRepository,
    N: LoanRepository,
{
    config: Arc<ServiceChargeConfig>,
    compute_usecase: Arc<ComputeFinalSheetUsecaseImpl<L>>,
    loan_charge_usecase: Arc<LoanChargeUsecaseImpl<L, N>>,
    service_charge_repository: Arc<C>,
}

/// Tracks the state machine of one run and logs every transition.
struct JobRun<'a> {
    ctx: &'a RunContext,
    range: Option<QuarterRange>,
    transitions: Vec<JobState>,
}

impl<'a> JobRun<'a> {
    fn start(ctx: &'a RunContext) -> Self {
        Self {
            ctx,
            range: None,
            transitions: vec![JobState::Idle],
        }
    }

    fn state(&self) -> JobState {
        self.transitions.last().copied().unwrap_or(JobState::Idle)
    }

    fn advance(&mut self, next: JobState) -> Result<(), ServerError> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(GenericCalculationFailure::new(
                "scheduled recompute",
                &format!("invalid job transition {current} -> {next}"),
            ));
        }
        info!(
            tenant = %self.ctx.tenant,
            quarter = ?self.range.as_ref().map(|r| r.selector()),
            from = %current,
            to = %next,
            "service charge job transition"
        );
        self.transitions.push(next);
        Ok(())
    }

    /// Moves to `Failed` and hands back the error for propagation.
    fn fail(&mut self, e: ServerError) -> ServerError {
        error!(
            tenant = %self.ctx.tenant,
            state = %self.state(),
            error = %e,
            "service charge job failed"
        );
        match self.advance(JobState::Failed) {
            Ok(()) => e,
            Err(transition_error) => transition_error,
        }
    }

    fn finish(
        self,
        range: QuarterRange,
        records: Vec<ServiceChargeRecord>,
        dispatch: DispatchReport,
    ) -> JobOutcome {
        JobOutcome {
            range,
            transitions: self.transitions,
            records,
            dispatch,
        }
    }
}

impl<L, C, N> ScheduledRecomputeUsecaseImpl<L, C, N>
where
    L: LedgerRepository,
    C: ServiceChargeRepository,
    N: LoanRepository,
{
    pub(crate) fn new(
        config: Arc<ServiceChargeConfig>,
        compute_usecase: Arc<ComputeFinalSheetUsecaseImpl<L>>,
        loan_charge_usecase: Arc<LoanChargeUsecaseImpl<L, N>>,
        service_charge_repository: Arc<C>,
    ) -> Self {
        Self {
            config,
            compute_usecase,
            loan_charge_usecase,
            service_charge_repository,
        }
    }

    /// Rebuilds the sheet the quarter's headline records were persisted from,
    /// reading the ledger as of the records' `computed_at`. `None` when the
    /// quarter has no records.
    pub(crate) async fn persisted_sheet(
        &self,
        ctx: &RunContext,
        range: &QuarterRange,
    ) -> Result<Option<(Vec<ServiceChargeRecord>, Arc<FinalSheet>)>, ServerError> {
        let records = self
            .service_charge_repository
            .records_for(ctx, range.quarter, range.year)
            .await?;
        let Some(computed_at) = records.first().map(|r| r.computed_at) else {
            return Ok(None);
        };
        let pinned = ctx.at(computed_at);
        let sheet = self.compute_usecase.compute(&pinned, range).await?;
        let rebuilt = self.headline_records(&pinned, &sheet)?;
        for record in &records {
            let matches = rebuilt
                .iter()
                .any(|r| r.row == record.row && r.amount == record.amount);
            if !matches {
                return Err(GenericCalculationFailure::new(
                    record.row.label(),
                    &format!(
                        "sheet rebuilt for {range} as of {computed_at} no longer matches the persisted amount {}",
                        record.amount
                    ),
                ));
            }
        }
        Ok(Some((records, Arc::new(sheet))))
    }

    async fn dispatch_from(
        &self,
        ctx: &RunContext,
        range: &QuarterRange,
        sheet: Arc<FinalSheet>,
    ) -> Result<DispatchReport, ServerError> {
        self.loan_charge_usecase.remember(ctx, sheet.clone()).await;
        let dispatch = self.loan_charge_usecase.dispatch_all(ctx, &sheet).await?;
        if !dispatch.is_clean() {
            warn!(
                tenant = %ctx.tenant,
                quarter = %range,
                failed = dispatch.failures.len(),
                failed_loans = ?dispatch.failed_loan_ids(),
                "service charge dispatch finished with failures; retry the failed loans"
            );
        }
        self.service_charge_repository
            .mark_dispatch_completed(ctx, range.quarter, range.year)
            .await?;
        Ok(dispatch)
    }

    fn headline_records(
        &self,
        ctx: &RunContext,
        sheet: &FinalSheet,
    ) -> Result<Vec<ServiceChargeRecord>, ServerError> {
        let precision = self.config.presentation_precision();
        ReportRow::HEADLINE
            .iter()
            .map(|row| {
                Ok(ServiceChargeRecord {
                    quarter: sheet.range.quarter,
                    year: sheet.range.year,
                    row: *row,
                    amount: round_half_up(sheet.data.particular(*row)?, precision),
                    computed_at: ctx.as_of,
                })
            })
            .collect()
    }
}

#[async_trait]
impl<L, C, N> ScheduledRecomputeUsecase for ScheduledRecomputeUsecaseImpl<L, C, N>
where
    L: LedgerRepository,
    C: ServiceChargeRepository,
    N: LoanRepository,
{
    async fn run(
        &self,
        ctx: &RunContext,
        selector: Option<QuarterSelector>,
    ) -> Result<JobOutcome, ServerError> {
        let mut run = JobRun::start(ctx);
        run.advance(JobState::Checking)?;
        let range = resolve(ctx, selector)?;
        run.range = Some(range.clone());
        if self
            .service_charge_repository
            .headline_exists(ctx, range.quarter, range.year)
            .await?
        {
            if self
                .service_charge_repository
                .dispatch_completed(ctx, range.quarter, range.year)
                .await?
            {
                run.advance(JobState::Skip)?;
                return Ok(run.finish(range, Vec::new(), DispatchReport::default()));
            }
            // Records persisted by a run whose dispatch was interrupted.
            run.advance(JobState::Dispatching)?;
            let (records, sheet) = match self.persisted_sheet(ctx, &range).await {
                Ok(Some(persisted)) => persisted,
                Ok(None) => {
                    return Err(run.fail(QuarterNotComputed::new(&range.selector().to_string())))
                }
                Err(e) => return Err(run.fail(e)),
            };
            let dispatch = match self.dispatch_from(ctx, &range, sheet).await {
                Ok(report) => report,
                Err(e) => return Err(run.fail(e)),
            };
            run.advance(JobState::Done)?;
            info!(
                tenant = %ctx.tenant,
                quarter = %range,
                succeeded = dispatch.succeeded.len(),
                failed = dispatch.failures.len(),
                "service charge job resumed and done"
            );
            return Ok(run.finish(range, records, dispatch));
        }

        run.advance(JobState::Computing)?;
        let sheet = match self.compute_usecase.compute(ctx, &range).await {
            Ok(sheet) => Arc::new(sheet),
            Err(e) => return Err(run.fail(e)),
        };

        run.advance(JobState::Persisting)?;
        let records = match self.headline_records(ctx, &sheet) {
            Ok(records) => records,
            Err(e) => return Err(run.fail(e)),
        };
        match self
            .service_charge_repository
            .insert_headline(ctx, records.clone())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                // Another run persisted this quarter between our check and
                // insert.
                run.advance(JobState::Skip)?;
                return Ok(run.finish(range, Vec::new(), DispatchReport::default()));
            }
            Err(e) => return Err(run.fail(e)),
        }

        run.advance(JobState::Dispatching)?;
        let dispatch = match self.dispatch_from(ctx, &range, sheet).await {
            Ok(report) => report,
            Err(e) => return Err(run.fail(e)),
        };

        run.advance(JobState::Done)?;
        info!(
            tenant = %ctx.tenant,
            quarter = %range,
            succeeded = dispatch.succeeded.len(),
            failed = dispatch.failures.len(),
            "service charge job done"
        );
        Ok(run.finish(range, records, dispatch))
    }

    async fn resume_dispatch(
        &self,
        ctx: &RunContext,
        selector: Option<QuarterSelector>,
    ) -> Result<DispatchReport, ServerError> {
        let range = resolve(ctx, selector)?;
        let (_, sheet) = self
            .persisted_sheet(ctx, &range)
            .await?
            .ok_or_else(|| QuarterNotComputed::new(&range.selector().to_string()))?;
        info!(tenant = %ctx.tenant, quarter = %range, "re-dispatching service charges");
        self.dispatch_from(ctx, &range, sheet).await
    }
}

fn resolve(ctx: &RunContext, selector: Option<QuarterSelector>) -> Result<QuarterRange, ServerError> {
    match selector {
        Some(selector) => QuarterResolver::resolve(&selector),
        None => QuarterResolver::current_quarter(ctx.today),
    }
}
