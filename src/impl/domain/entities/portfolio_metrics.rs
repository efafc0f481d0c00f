use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};

/// Loan portfolio figures for one quarter. Any figure may be absent for a
/// quarter whose data is still incomplete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioMetrics {
    /// Number of loans disbursed in the period.
    pub total_loans: Option<Decimal>,
    /// Total repayment collected in the period.
    pub total_repayment: Option<Decimal>,
    pub average_outstanding_balance: Option<Decimal>,
    pub average_repayment_term_months: Option<Decimal>,
    /// Total principal disbursed in the period.
    pub total_disbursed_amount: Option<Decimal>,
}
