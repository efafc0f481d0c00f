use async_trait::async_trait;
use fractic_server_error::ServerError;
use rust_decimal::Decimal;

use crate::entities::{Loan, LoanId, RunContext};

#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// One page of active loans ordered by id, starting after `after`.
    async fn active_loans(
        &self,
        ctx: &RunContext,
        after: Option<&LoanId>,
        limit: usize,
    ) -> Result<Vec<Loan>, ServerError>;

    async fn find_loan(&self, ctx: &RunContext, loan_id: &LoanId)
        -> Result<Option<Loan>, ServerError>;

    /// Sets the loan's service-charge line item to `amount`, replacing any
    /// previous value.
    async fn apply_service_charge(
        &self,
        ctx: &RunContext,
        loan_id: &LoanId,
        amount: Decimal,
    ) -> Result<(), ServerError>;
}
