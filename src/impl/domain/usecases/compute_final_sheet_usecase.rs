use std::sync::Arc;

use async_trait::async_trait;
use fractic_server_error::ServerError;
use tracing::info;

use crate::{
    domain::{
        logic::{
            allocation_engine::AllocationEngine, cost_category_tagger::CostCategoryTagger,
            journal_aggregator::JournalAggregator,
        },
        repositories::ledger_repository::LedgerRepository,
    },
    entities::{FinalSheet, QuarterRange, RunContext, ServiceChargeConfig},
};

#[async_trait]
pub trait ComputeFinalSheetUsecase: Send + Sync {
    /// Aggregates the quarter's postings as of `ctx.as_of` and runs the
    /// allocation on them. Always reads the ledger; nothing is cached.
    async fn compute(&self, ctx: &RunContext, range: &QuarterRange)
        -> Result<FinalSheet, ServerError>;
}

pub(crate) struct ComputeFinalSheetUsecaseImpl<L>
where
    L: LedgerRepository,
{
    config: Arc<ServiceChargeConfig>,
    tagger: Arc<CostCategoryTagger>,
    ledger_repository: Arc<L>,
}

#[async_trait]
impl<L> ComputeFinalSheetUsecase for ComputeFinalSheetUsecaseImpl<L>
where
    L: LedgerRepository,
{
    async fn compute(
        &self,
        ctx: &RunContext,
        range: &QuarterRange,
    ) -> Result<FinalSheet, ServerError> {
        let postings = self.ledger_repository.postings(ctx, range).await?;
        let metrics = self.ledger_repository.portfolio_metrics(ctx, range).await?;
        let totals = JournalAggregator::new(&self.tagger).aggregate(range, &postings)?;
        let data = AllocationEngine::new(&self.config).allocate(&totals, &metrics)?;
        info!(
            tenant = %ctx.tenant,
            quarter = %range,
            as_of = %ctx.as_of,
            postings = postings.len(),
            "computed final sheet"
        );
        Ok(FinalSheet::new(
            range.clone(),
            self.config.currency,
            self.config.repeat_brought_forward_row,
            metrics,
            data,
        ))
    }
}

impl<L: LedgerRepository> ComputeFinalSheetUsecaseImpl<L> {
    pub(crate) fn new(
        config: Arc<ServiceChargeConfig>,
        tagger: Arc<CostCategoryTagger>,
        ledger_repository: Arc<L>,
    ) -> Self {
        Self {
            config,
            tagger,
            ledger_repository,
        }
    }
}
