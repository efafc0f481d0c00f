use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use fractic_server_error::ServerError;
use ron::from_str;

use crate::{
    data::models::{
        iso_timestamp_model::ISOTimestampModel, portfolio_metrics_model::PortfolioMetricsEntryModel,
    },
    entities::{PortfolioMetrics, QuarterSelector},
    errors::{InvalidRon, ReadError},
};

/// A quarter's portfolio figures as known from `recorded_at` on (from the
/// start when absent).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PortfolioMetricsRevision {
    pub selector: QuarterSelector,
    pub recorded_at: Option<NaiveDateTime>,
    pub metrics: PortfolioMetrics,
}

#[async_trait]
pub(crate) trait PortfolioMetricsRonDatasource: Send + Sync {
    fn from_string(&self, s: &str) -> Result<Vec<PortfolioMetricsRevision>, ServerError>;

    async fn from_file<P>(&self, path: P) -> Result<Vec<PortfolioMetricsRevision>, ServerError>
    where
        P: AsRef<std::path::Path> + Send;
}

pub(crate) struct PortfolioMetricsRonDatasourceImpl;

impl PortfolioMetricsRonDatasourceImpl {
    pub(crate) fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PortfolioMetricsRonDatasource for PortfolioMetricsRonDatasourceImpl {
    fn from_string(&self, s: &str) -> Result<Vec<PortfolioMetricsRevision>, ServerError> {
        let entries: Vec<PortfolioMetricsEntryModel> =
            from_str(s).map_err(|e| InvalidRon::with_debug("PortfolioMetrics", &e))?;
        entries
            .into_iter()
            .map(|e| {
                let recorded_at = e
                    .recorded_at
                    .as_deref()
                    .map(ISOTimestampModel::from_str)
                    .transpose()?
                    .map(NaiveDateTime::from);
                Ok(PortfolioMetricsRevision {
                    selector: QuarterSelector {
                        quarter: e.quarter,
                        year: e.year,
                    },
                    recorded_at,
                    metrics: e.metrics,
                })
            })
            .collect()
    }

    async fn from_file<P>(&self, path: P) -> Result<Vec<PortfolioMetricsRevision>, ServerError>
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
    use crate::entities::Quarter;

    #[test]
    fn parses_partial_metrics() {
        let ron = r#"[
            (quarter: Q1, year: 2024, metrics: (total_loans: Some(50), average_outstanding_balance: Some("20000.50"))),
            (quarter: Q2, year: 2024, metrics: ()),
        ]"#;
        let entries = PortfolioMetricsRonDatasourceImpl::new().from_string(ron).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].selector.quarter, Quarter::Q1);
        assert_eq!(entries[0].recorded_at, None);
        assert_eq!(entries[0].metrics.total_loans, Some(dec!(50)));
        assert_eq!(entries[0].metrics.average_outstanding_balance, Some(dec!(20000.50)));
        assert_eq!(entries[0].metrics.total_repayment, None);
        assert_eq!(entries[1].metrics, PortfolioMetrics::default());
    }

    #[test]
    fn parses_recorded_at() {
        let ron = r#"[
            (quarter: Q1, year: 2024, recorded_at: Some("2024-03-02T10:00:00"), metrics: (total_loans: Some(52))),
        ]"#;
        let entries = PortfolioMetricsRonDatasourceImpl::new().from_string(ron).unwrap();
        assert_eq!(
            entries[0].recorded_at,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
        );
        assert!(PortfolioMetricsRonDatasourceImpl::new()
            .from_string(r#"[(quarter: Q1, year: 2024, recorded_at: Some("soon"), metrics: ())]"#)
            .is_err());
    }

    #[test]
    fn rejects_invalid_ron() {
        assert!(PortfolioMetricsRonDatasourceImpl::new()
            .from_string("[(quarter: Q9)]")
            .is_err());
    }
}
