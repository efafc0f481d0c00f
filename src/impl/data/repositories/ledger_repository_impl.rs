use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use fractic_server_error::ServerError;
use tokio::sync::RwLock;

use crate::{
    data::datasources::{
        portfolio_metrics_ron_datasource::{
            PortfolioMetricsRevision, PortfolioMetricsRonDatasource,
            PortfolioMetricsRonDatasourceImpl,
        },
        postings_csv_datasource::{PostingsCsvDatasource, PostingsCsvDatasourceImpl},
    },
    domain::repositories::ledger_repository::LedgerRepository,
    entities::{
        LedgerPosting, PortfolioMetrics, QuarterRange, QuarterSelector, RunContext, TenantId,
    },
};

/// In-memory, tenant-scoped ledger fed from CSV postings and RON portfolio
/// metrics. Metrics are kept as revisions ordered by the time they became
/// known, so reads as of an earlier snapshot see the figures of that time.
pub struct LedgerRepositoryImpl {
    postings_datasource: PostingsCsvDatasourceImpl,
    metrics_datasource: PortfolioMetricsRonDatasourceImpl,
    postings: RwLock<HashMap<TenantId, Vec<LedgerPosting>>>,
    metrics: RwLock<HashMap<(TenantId, QuarterSelector), Vec<(NaiveDateTime, PortfolioMetrics)>>>,
}

impl LedgerRepositoryImpl {
    pub fn new() -> Self {
        Self {
            postings_datasource: PostingsCsvDatasourceImpl::new(),
            metrics_datasource: PortfolioMetricsRonDatasourceImpl::new(),
            postings: RwLock::new(HashMap::new()),
            metrics: RwLock::new(HashMap::new()),
        }
    }

    pub async fn record_postings(&self, tenant: &TenantId, postings: Vec<LedgerPosting>) {
        self.postings
            .write()
            .await
            .entry(tenant.clone())
            .or_default()
            .extend(postings);
    }

    pub async fn load_postings_str(&self, tenant: &TenantId, csv: &str) -> Result<(), ServerError> {
        let postings = self.postings_datasource.from_string(csv)?;
        self.record_postings(tenant, postings).await;
        Ok(())
    }

    pub async fn load_postings_file<P>(&self, tenant: &TenantId, path: P) -> Result<(), ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        let postings = self.postings_datasource.from_file(path).await?;
        self.record_postings(tenant, postings).await;
        Ok(())
    }

    /// Figures for the quarter known from the start, replacing any earlier
    /// such figures.
    pub async fn set_metrics(
        &self,
        tenant: &TenantId,
        selector: QuarterSelector,
        metrics: PortfolioMetrics,
    ) {
        self.record_metrics(tenant, selector, NaiveDateTime::MIN, metrics)
            .await;
    }

    /// Adds a revision of the quarter's figures, visible to reads as of
    /// `recorded_at` or later. A revision with the same `recorded_at` is
    /// replaced.
    pub async fn record_metrics(
        &self,
        tenant: &TenantId,
        selector: QuarterSelector,
        recorded_at: NaiveDateTime,
        metrics: PortfolioMetrics,
    ) {
        let mut stored = self.metrics.write().await;
        let revisions = stored.entry((tenant.clone(), selector)).or_default();
        match revisions.binary_search_by_key(&recorded_at, |(at, _)| *at) {
            Ok(i) => revisions[i].1 = metrics,
            Err(i) => revisions.insert(i, (recorded_at, metrics)),
        }
    }

    pub async fn load_metrics_str(&self, tenant: &TenantId, ron: &str) -> Result<(), ServerError> {
        let revisions = self.metrics_datasource.from_string(ron)?;
        self.record_revisions(tenant, revisions).await;
        Ok(())
    }

    pub async fn load_metrics_file<P>(&self, tenant: &TenantId, path: P) -> Result<(), ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        let revisions = self.metrics_datasource.from_file(path).await?;
        self.record_revisions(tenant, revisions).await;
        Ok(())
    }

    async fn record_revisions(&self, tenant: &TenantId, revisions: Vec<PortfolioMetricsRevision>) {
        for revision in revisions {
            self.record_metrics(
                tenant,
                revision.selector,
                revision.recorded_at.unwrap_or(NaiveDateTime::MIN),
                revision.metrics,
            )
            .await;
        }
    }
}

impl Default for LedgerRepositoryImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRepository for LedgerRepositoryImpl {
    async fn postings(
        &self,
        ctx: &RunContext,
        range: &QuarterRange,
    ) -> Result<Vec<LedgerPosting>, ServerError> {
        Ok(self
            .postings
            .read()
            .await
            .get(&ctx.tenant)
            .map(|postings| {
                postings
                    .iter()
                    .filter(|p| range.contains(p.posting_date) && p.recorded_at <= ctx.as_of)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn portfolio_metrics(
        &self,
        ctx: &RunContext,
        range: &QuarterRange,
    ) -> Result<PortfolioMetrics, ServerError> {
        Ok(self
            .metrics
            .read()
            .await
            .get(&(ctx.tenant.clone(), range.selector()))
            .and_then(|revisions| {
                revisions
                    .iter()
                    .rev()
                    .find(|(recorded_at, _)| *recorded_at <= ctx.as_of)
            })
            .map(|(_, metrics)| metrics.clone())
            .unwrap_or_default())
    }
}
