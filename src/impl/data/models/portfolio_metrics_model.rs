use crate::entities::{PortfolioMetrics, Quarter};

/// One revision of a quarter's portfolio figures in the metrics feed.
/// `recorded_at` is optional; a revision without it is known from the start.
///
/// ```text
/// [
///     (quarter: Q1, year: 2024, metrics: (total_loans: Some(50), total_repayment: Some("12000"))),
///     (quarter: Q1, year: 2024, recorded_at: Some("2024-03-02T00:00:00"), metrics: (total_loans: Some(52))),
/// ]
/// ```
#[derive(Debug, serde_derive::Deserialize)]
pub(crate) struct PortfolioMetricsEntryModel {
    pub quarter: Quarter,
    pub year: i32,
    #[serde(default)]
    pub recorded_at: Option<String>,
    pub metrics: PortfolioMetrics,
}
