use std::fmt;

use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoanId(pub String);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LoanId {
    fn from(s: &str) -> Self {
        LoanId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loan {
    pub id: LoanId,
    pub outstanding_balance: Decimal,
    pub active: bool,
}
