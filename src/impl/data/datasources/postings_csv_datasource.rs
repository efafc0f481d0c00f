use std::str::FromStr as _;

use async_trait::async_trait;
use fractic_server_error::ServerError;

use crate::{
    data::models::{
        accounting_amount_model::AccountingAmountModel, iso_date_model::ISODateModel,
        iso_timestamp_model::ISOTimestampModel,
    },
    entities::LedgerPosting,
    errors::{InvalidCsv, InvalidCsvContent, ReadError},
};

/// Ledger export with a header row and columns
/// `account_tag,amount,posting_date,recorded_at`.
#[async_trait]
pub(crate) trait PostingsCsvDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<LedgerPosting>, ServerError>;

    async fn from_file<P>(&self, path: P) -> Result<Vec<LedgerPosting>, ServerError>
    where
        P: AsRef<std::path::Path> + Send;
}

pub(crate) struct PostingsCsvDatasourceImpl;

impl PostingsCsvDatasourceImpl {
    pub(crate) fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PostingsCsvDatasource for PostingsCsvDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<LedgerPosting>, ServerError> {
        csv::Reader::from_reader(s.as_bytes())
            .records()
            .map(|r| {
                r.map_err(|e| InvalidCsv::with_debug(&e)).and_then(|r| {
                    // Extract from CSV record.
                    let raw_tag = r.get(0).unwrap_or("").trim();
                    let raw_amount = r.get(1).unwrap_or("0");
                    let raw_posting_date = r.get(2).unwrap_or("");
                    let raw_recorded_at = match r.get(3) {
                        Some(s) if !s.trim().is_empty() => s,
                        _ => raw_posting_date,
                    };

                    // Parse.
                    if raw_tag.is_empty() {
                        return Err(InvalidCsvContent::new("posting without account tag"));
                    }
                    let amount = AccountingAmountModel::from_str(raw_amount)?;
                    let posting_date = ISODateModel::from_str(raw_posting_date)?;
                    let recorded_at = ISOTimestampModel::from_str(raw_recorded_at)?;

                    // Build.
                    Ok(LedgerPosting {
                        account_tag: raw_tag.to_string(),
                        amount: amount.into(),
                        posting_date: posting_date.into(),
                        recorded_at: recorded_at.into(),
                    })
                })
            })
            .collect()
    }

    async fn from_file<P>(&self, path: P) -> Result<Vec<LedgerPosting>, ServerError>
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
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_postings() {
        let csv = "account_tag,amount,posting_date,recorded_at\n\
                   MOBILIZATION,\"1,000.00\",2024-01-15,2024-01-16T09:30:00\n\
                   OVERHEADS,(50),2024-02-01,\n";
        let postings = PostingsCsvDatasourceImpl::new().from_string(csv).unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].account_tag, "MOBILIZATION");
        assert_eq!(postings[0].amount, dec!(1000));
        assert_eq!(
            postings[0].recorded_at,
            NaiveDate::from_ymd_opt(2024, 1, 16)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
        // Recorded-at defaults to the start of the posting date.
        assert_eq!(postings[1].amount, dec!(-50));
        assert_eq!(
            postings[1].recorded_at,
            NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn rejects_bad_rows() {
        let datasource = PostingsCsvDatasourceImpl::new();
        let header = "account_tag,amount,posting_date,recorded_at\n";
        assert!(datasource
            .from_string(&format!("{header}SERVICING,abc,2024-01-01,\n"))
            .is_err());
        assert!(datasource
            .from_string(&format!("{header}SERVICING,10,2024-13-01,\n"))
            .is_err());
        assert!(datasource
            .from_string(&format!("{header},10,2024-01-01,\n"))
            .is_err());
    }
}
