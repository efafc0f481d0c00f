use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// A tagged general-ledger expense posting, as supplied by the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPosting {
    pub account_tag: String,
    pub amount: Decimal,
    pub posting_date: NaiveDate,
    /// When the posting was recorded. Postings recorded after a run's as-of
    /// timestamp are invisible to that run.
    pub recorded_at: NaiveDateTime,
}
