use fractic_server_error::ServerError;
use rust_decimal::Decimal;

use crate::entities::{FinalSheet, Loan, ReportRow};

use super::utils::{round_half_up, scaled_ratio};

/// Derives one loan's service charge from a computed final sheet.
///
/// The charge is the per-loan servicing cost weighted by the loan's
/// outstanding balance relative to the portfolio average. Without a usable
/// average the flat per-loan cost applies.
pub struct PerLoanChargeCalculator<'a> {
    sheet: &'a FinalSheet,
    working_precision: u32,
}

impl<'a> PerLoanChargeCalculator<'a> {
    pub fn new(sheet: &'a FinalSheet, working_precision: u32) -> Self {
        Self {
            sheet,
            working_precision,
        }
    }

    pub fn charge_for(&self, loan: &Loan) -> Result<Decimal, ServerError> {
        let per_loan = self
            .sheet
            .data()
            .particular(ReportRow::LoanServicingPerLoan)?;
        let charge = match self.sheet.metrics.average_outstanding_balance {
            Some(average) if !average.is_zero() => scaled_ratio(
                Some(per_loan),
                Some(average),
                Some(loan.outstanding_balance),
                self.working_precision,
                ReportRow::LoanServicingPerLoan.label(),
            )?,
            _ => per_loan,
        };
        let presentation_precision = self.sheet.currency.exponent().unwrap_or(0) as u32;
        Ok(round_half_up(charge, presentation_precision))
    }
}
