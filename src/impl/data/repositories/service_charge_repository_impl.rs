use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use fractic_server_error::ServerError;
use tokio::sync::Mutex;

use crate::{
    domain::repositories::service_charge_repository::ServiceChargeRepository,
    entities::{Quarter, ReportRow, RunContext, ServiceChargeRecord, TenantId},
};

type RecordKey = (TenantId, Quarter, i32, ReportRow);
type QuarterKey = (TenantId, Quarter, i32);

/// In-memory store of headline records, unique per (tenant, quarter, year,
/// row), plus the quarters whose dispatch completed.
pub struct ServiceChargeRepositoryImpl {
    records: Mutex<HashMap<RecordKey, ServiceChargeRecord>>,
    dispatched: Mutex<HashSet<QuarterKey>>,
}

impl ServiceChargeRepositoryImpl {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            dispatched: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for ServiceChargeRepositoryImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceChargeRepository for ServiceChargeRepositoryImpl {
    async fn headline_exists(
        &self,
        ctx: &RunContext,
        quarter: Quarter,
        year: i32,
    ) -> Result<bool, ServerError> {
        let records = self.records.lock().await;
        Ok(ReportRow::HEADLINE
            .iter()
            .any(|row| records.contains_key(&(ctx.tenant.clone(), quarter, year, *row))))
    }

    async fn insert_headline(
        &self,
        ctx: &RunContext,
        records: Vec<ServiceChargeRecord>,
    ) -> Result<bool, ServerError> {
        let mut stored = self.records.lock().await;
        let keyed: Vec<(RecordKey, ServiceChargeRecord)> = records
            .into_iter()
            .map(|r| ((ctx.tenant.clone(), r.quarter, r.year, r.row), r))
            .collect();
        if keyed.iter().any(|(key, _)| stored.contains_key(key)) {
            return Ok(false);
        }
        stored.extend(keyed);
        Ok(true)
    }

    async fn records_for(
        &self,
        ctx: &RunContext,
        quarter: Quarter,
        year: i32,
    ) -> Result<Vec<ServiceChargeRecord>, ServerError> {
        let stored = self.records.lock().await;
        let mut records: Vec<ServiceChargeRecord> = stored
            .iter()
            .filter(|((tenant, q, y, _), _)| *tenant == ctx.tenant && *q == quarter && *y == year)
            .map(|(_, r)| r.clone())
            .collect();
        records.sort_by_key(|r| r.row.ordinal());
        Ok(records)
    }

    async fn dispatch_completed(
        &self,
        ctx: &RunContext,
        quarter: Quarter,
        year: i32,
    ) -> Result<bool, ServerError> {
        Ok(self
            .dispatched
            .lock()
            .await
            .contains(&(ctx.tenant.clone(), quarter, year)))
    }

    async fn mark_dispatch_completed(
        &self,
        ctx: &RunContext,
        quarter: Quarter,
        year: i32,
    ) -> Result<(), ServerError> {
        self.dispatched
            .lock()
            .await
            .insert((ctx.tenant.clone(), quarter, year));
        Ok(())
    }
}
