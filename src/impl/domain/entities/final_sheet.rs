use std::collections::BTreeMap;

use fractic_server_error::{CriticalError, ServerError};
use iso_currency::Currency;
use rust_decimal::Decimal;
use serde_derive::Serialize;

use crate::errors::ReportRowNotFound;

use super::{
    portfolio_metrics::PortfolioMetrics,
    quarter::QuarterRange,
    report_row::{ActivityColumn, ReportRow},
};

/// Row to column values of one allocation run. Every row exists from
/// construction on; rows start out empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalSheetData {
    rows: BTreeMap<ReportRow, Vec<Decimal>>,
}

impl FinalSheetData {
    pub fn init() -> Self {
        Self {
            rows: ReportRow::ALL.iter().map(|r| (*r, Vec::new())).collect(),
        }
    }

    pub fn set_column(&mut self, row: ReportRow, values: Vec<Decimal>) {
        self.rows.insert(row, values);
    }

    pub fn row(&self, row: ReportRow) -> &[Decimal] {
        self.rows.get(&row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_value(&self, row: ReportRow, index: usize) -> Result<Decimal, ServerError> {
        let values = self.row(row);
        values
            .get(index)
            .copied()
            .ok_or_else(|| ReportRowNotFound::new(row.label(), index, values.len()))
    }

    /// Activity rows (1-5) by column.
    pub fn activity_value(
        &self,
        row: ReportRow,
        column: ActivityColumn,
    ) -> Result<Decimal, ServerError> {
        self.get_value(row, column.index())
    }

    /// Particulars rows (6-18) hold a single value.
    pub fn particular(&self, row: ReportRow) -> Result<Decimal, ServerError> {
        self.get_value(row, 0)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&ReportRow, &Vec<Decimal>)> {
        self.rows.iter()
    }

    pub fn to_json(&self) -> Result<String, ServerError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CriticalError::with_debug("failed to serialize final sheet", &e))
    }
}

/// Text and HTML renditions of a final sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub text: String,
    pub html: String,
}

/// A computed final sheet for one quarter, with a render cache.
#[derive(Debug, Clone)]
pub struct FinalSheet {
    pub(crate) range: QuarterRange,
    pub(crate) currency: Currency,
    pub(crate) repeat_brought_forward_row: bool,
    pub(crate) metrics: PortfolioMetrics,
    pub(crate) data: FinalSheetData,
    pub(crate) rendered: Option<RenderedReport>,
}

impl FinalSheet {
    pub(crate) fn new(
        range: QuarterRange,
        currency: Currency,
        repeat_brought_forward_row: bool,
        metrics: PortfolioMetrics,
        data: FinalSheetData,
    ) -> Self {
        Self {
            range,
            currency,
            repeat_brought_forward_row,
            metrics,
            data,
            rendered: None,
        }
    }

    pub fn range(&self) -> &QuarterRange {
        &self.range
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Portfolio figures the sheet was computed from.
    pub fn metrics(&self) -> &PortfolioMetrics {
        &self.metrics
    }

    pub fn data(&self) -> &FinalSheetData {
        &self.data
    }

    /// Replaces a row's values. An already rendered report is kept until
    /// the next forced render.
    pub fn set_column(&mut self, row: ReportRow, values: Vec<Decimal>) {
        self.data.set_column(row, values);
    }

    pub fn get_value(&self, row: ReportRow, index: usize) -> Result<Decimal, ServerError> {
        self.data.get_value(row, index)
    }
}
