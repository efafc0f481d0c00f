use std::str::FromStr as _;

use async_trait::async_trait;
use fractic_server_error::ServerError;

use crate::{
    data::models::accounting_amount_model::AccountingAmountModel,
    entities::{Loan, LoanId},
    errors::{InvalidCsv, InvalidCsvContent, ReadError},
};

/// Loan book export with a header row and columns
/// `loan_id,outstanding_balance,active`.
#[async_trait]
pub(crate) trait LoansCsvDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<Loan>, ServerError>;

    async fn from_file<P>(&self, path: P) -> Result<Vec<Loan>, ServerError>
    where
        P: AsRef<std::path::Path> + Send;
}

pub(crate) struct LoansCsvDatasourceImpl;

impl LoansCsvDatasourceImpl {
    pub(crate) fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LoansCsvDatasource for LoansCsvDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<Loan>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .map(|r| {
                r.map_err(|e| InvalidCsv::with_debug(&e)).and_then(|r| {
                    let raw_id = r.get(0).unwrap_or("").trim();
                    let raw_outstanding = r.get(1).unwrap_or("0");
                    let raw_active = r.get(2).unwrap_or("true").trim();

                    if raw_id.is_empty() {
                        return Err(InvalidCsvContent::new("loan without id"));
                    }
                    let outstanding = AccountingAmountModel::from_str(raw_outstanding)?;
                    let active = match raw_active.to_ascii_lowercase().as_str() {
                        "" | "true" | "yes" | "1" => true,
                        "false" | "no" | "0" => false,
                        _ => {
                            return Err(InvalidCsvContent::new(&format!(
                                "invalid active flag '{raw_active}' for loan '{raw_id}'"
                            )))
                        }
                    };

                    Ok(Loan {
                        id: LoanId(raw_id.to_string()),
                        outstanding_balance: outstanding.into(),
                        active,
                    })
                })
            })
            .collect()
    }

    async fn from_file<P>(&self, path: P) -> Result<Vec<Loan>, ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        self.from_string(
            &tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ReadError::with_debug(&e))?,
        )
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_loans() {
        let csv = "loan_id,outstanding_balance,active\nL-1,\"12,500.00\",true\nL-2,0,no\nL-3,300,\n";
        let loans = LoansCsvDatasourceImpl::new().from_string(csv).unwrap();
        assert_eq!(loans.len(), 3);
        assert_eq!(loans[0].outstanding_balance, dec!(12500));
        assert!(loans[0].active);
        assert!(!loans[1].active);
        assert!(loans[2].active);
    }

    #[test]
    fn rejects_unknown_active_flag() {
        let csv = "loan_id,outstanding_balance,active\nL-1,10,maybe\n";
        assert!(LoansCsvDatasourceImpl::new().from_string(csv).is_err());
    }
}
