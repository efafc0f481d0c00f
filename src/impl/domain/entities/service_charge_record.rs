use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde_derive::{Deserialize, Serialize};

use super::{quarter::Quarter, report_row::ReportRow};

/// Persisted headline figure. At most one exists per (tenant, quarter,
/// year, row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceChargeRecord {
    pub quarter: Quarter,
    pub year: i32,
    pub row: ReportRow,
    pub amount: Decimal,
    pub computed_at: NaiveDateTime,
}
