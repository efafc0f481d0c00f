use async_trait::async_trait;
use fractic_server_error::ServerError;

use crate::entities::{LedgerPosting, PortfolioMetrics, QuarterRange, RunContext};

/// Read access to the general ledger and loan portfolio figures.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Tagged postings dated inside `range` and recorded no later than
    /// `ctx.as_of`.
    async fn postings(
        &self,
        ctx: &RunContext,
        range: &QuarterRange,
    ) -> Result<Vec<LedgerPosting>, ServerError>;

    /// Portfolio figures for `range` as known at `ctx.as_of`. Figures not yet
    /// available are absent.
    async fn portfolio_metrics(
        &self,
        ctx: &RunContext,
        range: &QuarterRange,
    ) -> Result<PortfolioMetrics, ServerError>;
}
