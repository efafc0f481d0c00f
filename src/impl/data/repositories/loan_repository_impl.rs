use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
};

use async_trait::async_trait;
use fractic_server_error::ServerError;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::{
    data::datasources::loans_csv_datasource::{LoansCsvDatasource, LoansCsvDatasourceImpl},
    domain::repositories::loan_repository::LoanRepository,
    entities::{Loan, LoanId, RunContext, TenantId},
    errors::{ChargeUpdateRejected, LoanNotFound},
};

#[derive(Debug, Clone)]
struct LoanEntry {
    loan: Loan,
    service_charge: Option<Decimal>,
    /// Frozen loans reject fee schedule changes.
    frozen: bool,
}

/// In-memory, tenant-scoped loan book holding one service-charge line item
/// per loan.
pub struct LoanRepositoryImpl {
    datasource: LoansCsvDatasourceImpl,
    loans: RwLock<HashMap<TenantId, BTreeMap<LoanId, LoanEntry>>>,
}

impl LoanRepositoryImpl {
    pub fn new() -> Self {
        Self {
            datasource: LoansCsvDatasourceImpl::new(),
            loans: RwLock::new(HashMap::new()),
        }
    }

    /// Adds or replaces loans. A replaced loan keeps its service charge.
    pub async fn upsert_loans(&self, tenant: &TenantId, loans: Vec<Loan>) {
        let mut book = self.loans.write().await;
        let tenant_book = book.entry(tenant.clone()).or_default();
        for loan in loans {
            match tenant_book.get_mut(&loan.id) {
                Some(entry) => entry.loan = loan,
                None => {
                    tenant_book.insert(
                        loan.id.clone(),
                        LoanEntry {
                            loan,
                            service_charge: None,
                            frozen: false,
                        },
                    );
                }
            }
        }
    }

    pub async fn load_loans_str(&self, tenant: &TenantId, csv: &str) -> Result<(), ServerError> {
        let loans = self.datasource.from_string(csv)?;
        self.upsert_loans(tenant, loans).await;
        Ok(())
    }

    pub async fn load_loans_file<P>(&self, tenant: &TenantId, path: P) -> Result<(), ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        let loans = self.datasource.from_file(path).await?;
        self.upsert_loans(tenant, loans).await;
        Ok(())
    }

    pub async fn set_frozen(
        &self,
        tenant: &TenantId,
        loan_id: &LoanId,
        frozen: bool,
    ) -> Result<(), ServerError> {
        let mut book = self.loans.write().await;
        let entry = book
            .get_mut(tenant)
            .and_then(|b| b.get_mut(loan_id))
            .ok_or_else(|| LoanNotFound::new(&loan_id.0))?;
        entry.frozen = frozen;
        Ok(())
    }

    /// The loan's current service-charge line item, if one was applied.
    pub async fn service_charge(&self, tenant: &TenantId, loan_id: &LoanId) -> Option<Decimal> {
        self.loans
            .read()
            .await
            .get(tenant)
            .and_then(|b| b.get(loan_id))
            .and_then(|e| e.service_charge)
    }
}

impl Default for LoanRepositoryImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoanRepository for LoanRepositoryImpl {
    async fn active_loans(
        &self,
        ctx: &RunContext,
        after: Option<&LoanId>,
        limit: usize,
    ) -> Result<Vec<Loan>, ServerError> {
        let book = self.loans.read().await;
        let Some(tenant_book) = book.get(&ctx.tenant) else {
            return Ok(Vec::new());
        };
        let lower = match after {
            Some(id) => Bound::Excluded(id.clone()),
            None => Bound::Unbounded,
        };
        Ok(tenant_book
            .range((lower, Bound::Unbounded))
            .map(|(_, e)| &e.loan)
            .filter(|l| l.active)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_loan(
        &self,
        ctx: &RunContext,
        loan_id: &LoanId,
    ) -> Result<Option<Loan>, ServerError> {
        Ok(self
            .loans
            .read()
            .await
            .get(&ctx.tenant)
            .and_then(|b| b.get(loan_id))
            .map(|e| e.loan.clone()))
    }

    async fn apply_service_charge(
        &self,
        ctx: &RunContext,
        loan_id: &LoanId,
        amount: Decimal,
    ) -> Result<(), ServerError> {
        let mut book = self.loans.write().await;
        let entry = book
            .get_mut(&ctx.tenant)
            .and_then(|b| b.get_mut(loan_id))
            .ok_or_else(|| LoanNotFound::new(&loan_id.0))?;
        if entry.frozen {
            return Err(ChargeUpdateRejected::new(&loan_id.0));
        }
        entry.service_charge = Some(amount);
        Ok(())
    }
}
