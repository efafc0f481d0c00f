use async_trait::async_trait;
use fractic_server_error::ServerError;

use crate::entities::{Quarter, RunContext, ServiceChargeRecord};

#[async_trait]
pub trait ServiceChargeRepository: Send + Sync {
    async fn headline_exists(
        &self,
        ctx: &RunContext,
        quarter: Quarter,
        year: i32,
    ) -> Result<bool, ServerError>;

    /// Inserts all records or none. Returns `false` without writing anything
    /// when any record's (tenant, quarter, year, row) key already exists.
    async fn insert_headline(
        &self,
        ctx: &RunContext,
        records: Vec<ServiceChargeRecord>,
    ) -> Result<bool, ServerError>;

    async fn records_for(
        &self,
        ctx: &RunContext,
        quarter: Quarter,
        year: i32,
    ) -> Result<Vec<ServiceChargeRecord>, ServerError>;

    /// Whether a run finished dispatching charges for the quarter. Headline
    /// records without a completed dispatch mean the run was interrupted.
    async fn dispatch_completed(
        &self,
        ctx: &RunContext,
        quarter: Quarter,
        year: i32,
    ) -> Result<bool, ServerError>;

    async fn mark_dispatch_completed(
        &self,
        ctx: &RunContext,
        quarter: Quarter,
        year: i32,
    ) -> Result<(), ServerError>;
}
