use fractic_server_error::ServerError;
use rust_decimal::Decimal;
use tracing::debug;

use crate::entities::{
    CostCategory, FinalSheetData, PortfolioMetrics, ReportRow, ServiceChargeConfig,
};

use super::{
    journal_aggregator::CategoryTotals,
    utils::{checked_sub, checked_sum, scaled_ratio},
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Two-stage cost redistribution plus the derived charge-rate figures.
///
/// Activity rows are written as `[Mobilisation, Loan Servicing, Investment,
/// Overheads, Total]`; every other row holds one value. Values keep the
/// working precision; rounding to currency precision happens when records
/// are persisted or the sheet is rendered.
pub struct AllocationEngine {
    precision: u32,
}

struct Stage1 {
    mobilization: Decimal,
    servicing: Decimal,
    investment: Decimal,
}

impl AllocationEngine {
    pub fn new(config: &ServiceChargeConfig) -> Self {
        Self {
            precision: config.working_precision,
        }
    }

    pub fn allocate(
        &self,
        totals: &CategoryTotals,
        metrics: &PortfolioMetrics,
    ) -> Result<FinalSheetData, ServerError> {
        let mut sheet = FinalSheetData::init();

        let operating_costs = CostCategory::OPERATING.map(|c| totals.get(c));
        let [mobilization, servicing, investment] = operating_costs;
        let overheads = totals.get(CostCategory::Overheads);
        let provisions = totals.get(CostCategory::Provisions);
        let brought_forward = totals.get(CostCategory::BfServicing);

        let operating = checked_sum(operating_costs, ReportRow::Subtotal.label())?;
        sheet.set_column(
            ReportRow::Subtotal,
            vec![mobilization, servicing, investment, overheads, operating],
        );

        // Allocation-I: overheads follow each operating category's share of
        // the operating subtotal. Investment takes the remainder so the split
        // is exact.
        let context = ReportRow::AllocationOverheads.label();
        let [share_m, share_s, share_i] = if operating.is_zero() {
            [Decimal::ZERO; 3]
        } else {
            self.split(overheads, operating_costs, operating, context)?
        };
        let allocated = checked_sum([share_m, share_s, share_i], context)?;
        sheet.set_column(
            ReportRow::AllocationOverheads,
            vec![share_m, share_s, share_i, overheads, allocated],
        );

        let context = ReportRow::SubtotalAllocation.label();
        let stage1 = Stage1 {
            mobilization: checked_sum([mobilization, share_m], context)?,
            servicing: checked_sum([servicing, share_s], context)?,
            investment: checked_sum([investment, share_i], context)?,
        };
        // Non-zero only when there was no operating cost to allocate against.
        let unallocated = checked_sub(overheads, allocated, context)?;
        let stage1_total = checked_sum([operating, overheads], context)?;
        sheet.set_column(
            ReportRow::SubtotalAllocation,
            vec![
                stage1.mobilization,
                stage1.servicing,
                stage1.investment,
                unallocated,
                stage1_total,
            ],
        );

        // Allocation-II: mobilization is split between servicing and
        // investment by the outstanding balance / disbursement mix.
        let context = ReportRow::AllocationMobilization.label();
        let outstanding = metrics.average_outstanding_balance.unwrap_or(Decimal::ZERO);
        let disbursed = metrics.total_disbursed_amount.unwrap_or(Decimal::ZERO);
        let mix = checked_sum([outstanding, disbursed], context)?;
        let to_servicing = if mix.is_zero() {
            Decimal::ZERO
        } else {
            self.ratio(stage1.mobilization, Some(mix), Some(outstanding), context)?
        };
        let to_investment = checked_sub(stage1.mobilization, to_servicing, context)?;
        sheet.set_column(
            ReportRow::AllocationMobilization,
            vec![
                stage1.mobilization,
                to_servicing,
                to_investment,
                Decimal::ZERO,
                stage1.mobilization,
            ],
        );

        let context = ReportRow::TotalSegregationCost.label();
        let segregated_servicing = checked_sum([stage1.servicing, to_servicing, provisions], context)?;
        let segregated_investment = checked_sum([stage1.investment, to_investment], context)?;
        let segregated_total = checked_sum(
            [segregated_servicing, segregated_investment, unallocated],
            context,
        )?;
        sheet.set_column(
            ReportRow::TotalSegregationCost,
            vec![
                Decimal::ZERO,
                segregated_servicing,
                segregated_investment,
                unallocated,
                segregated_total,
            ],
        );

        // Derived figures.
        let total_mobilization = checked_sum(
            [segregated_servicing, brought_forward],
            ReportRow::TotalMobilization.label(),
        )?;
        let term = metrics.average_repayment_term_months;
        let mobilization_percent = self.ratio(
            total_mobilization,
            metrics.average_outstanding_balance,
            Some(HUNDRED),
            ReportRow::MobilizationPercent.label(),
        )?;
        let per_annum = self.ratio(
            total_mobilization,
            term,
            Some(MONTHS_PER_YEAR),
            ReportRow::LoanServicingPa.label(),
        )?;
        let per_loan = self.ratio(
            per_annum,
            metrics.total_loans,
            None,
            ReportRow::LoanServicingPerLoan.label(),
        )?;
        let per_100 = self.ratio(
            per_annum,
            metrics.total_repayment,
            Some(HUNDRED),
            ReportRow::RepaymentPer100.label(),
        )?;
        let annualized_i = self.ratio(
            per_annum,
            metrics.average_outstanding_balance,
            Some(HUNDRED),
            ReportRow::AnnualizedCostI.label(),
        )?;
        let annualized_ii = self.ratio(
            per_annum,
            metrics.total_disbursed_amount,
            Some(HUNDRED),
            ReportRow::AnnualizedCostII.label(),
        )?;
        let annualized_iii = self.ratio(
            per_annum,
            Some(segregated_total),
            Some(HUNDRED),
            ReportRow::AnnualizedCostIII.label(),
        )?;
        let annualized_total = checked_sum(
            [annualized_i, annualized_ii, annualized_iii],
            ReportRow::AnnualizedCostTotal.label(),
        )?;

        let particulars = [
            (ReportRow::LsCostOnAccountBf, brought_forward),
            (ReportRow::TotalMobilization, total_mobilization),
            (ReportRow::AvgRepayment, term.unwrap_or(Decimal::ZERO)),
            (ReportRow::MobilizationPercent, mobilization_percent),
            (ReportRow::LoanServicingPa, per_annum),
            (
                ReportRow::TotalLoans,
                metrics.total_loans.unwrap_or(Decimal::ZERO),
            ),
            (
                ReportRow::TotalRepayment,
                metrics.total_repayment.unwrap_or(Decimal::ZERO),
            ),
            (ReportRow::LoanServicingPerLoan, per_loan),
            (ReportRow::RepaymentPer100, per_100),
            (ReportRow::AnnualizedCostI, annualized_i),
            (ReportRow::AnnualizedCostII, annualized_ii),
            (ReportRow::AnnualizedCostIII, annualized_iii),
            (ReportRow::AnnualizedCostTotal, annualized_total),
        ];
        for (row, value) in particulars {
            sheet.set_column(row, vec![value]);
        }

        debug!(
            operating = %operating,
            overheads = %overheads,
            per_loan = %per_loan,
            "allocation complete"
        );
        Ok(sheet)
    }

    /// Splits `amount` in proportion to each weight's share of `total`. The
    /// last part takes the remainder so the parts add up to `amount`.
    fn split<const N: usize>(
        &self,
        amount: Decimal,
        weights: [Decimal; N],
        total: Decimal,
        context: &str,
    ) -> Result<[Decimal; N], ServerError> {
        let mut parts = [Decimal::ZERO; N];
        let mut allocated = Decimal::ZERO;
        for (part, weight) in parts.iter_mut().zip(weights).take(N.saturating_sub(1)) {
            *part = self.ratio(weight, Some(total), Some(amount), context)?;
            allocated = checked_sum([allocated, *part], context)?;
        }
        if let Some(last) = parts.last_mut() {
            *last = checked_sub(amount, allocated, context)?;
        }
        Ok(parts)
    }

    fn ratio(
        &self,
        numerator: Decimal,
        divisor: Option<Decimal>,
        multiplier: Option<Decimal>,
        context: &str,
    ) -> Result<Decimal, ServerError> {
        scaled_ratio(Some(numerator), divisor, multiplier, self.precision, context)
    }
}
