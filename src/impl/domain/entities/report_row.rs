use std::fmt;

use serde_derive::{Deserialize, Serialize};

/// One of the 18 rows of the final sheet.
///
/// Rows 1-5 are per-activity rows with the columns listed in
/// [`ActivityColumn`]. Rows 6-18 are single-value particulars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportRow {
    Subtotal,
    AllocationOverheads,
    SubtotalAllocation,
    AllocationMobilization,
    TotalSegregationCost,
    LsCostOnAccountBf,
    TotalMobilization,
    AvgRepayment,
    MobilizationPercent,
    LoanServicingPa,
    TotalLoans,
    TotalRepayment,
    LoanServicingPerLoan,
    RepaymentPer100,
    AnnualizedCostI,
    AnnualizedCostII,
    AnnualizedCostIII,
    AnnualizedCostTotal,
}

/// How a particulars value is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowUnit {
    Amount,
    Percent,
    Count,
    Months,
}

/// Column positions of the activity rows (1-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityColumn {
    Mobilisation = 0,
    LoanServicing = 1,
    Investment = 2,
    Overheads = 3,
    Total = 4,
}

impl ActivityColumn {
    pub const ALL: [ActivityColumn; 5] = [
        ActivityColumn::Mobilisation,
        ActivityColumn::LoanServicing,
        ActivityColumn::Investment,
        ActivityColumn::Overheads,
        ActivityColumn::Total,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn header(self) -> &'static str {
        match self {
            ActivityColumn::Mobilisation => "Mobilisation",
            ActivityColumn::LoanServicing => "Loan Servicing",
            ActivityColumn::Investment => "Investment",
            ActivityColumn::Overheads => "Overheads",
            ActivityColumn::Total => "Total",
        }
    }
}

impl ReportRow {
    /// All rows, in ordinal order.
    pub const ALL: [ReportRow; 18] = [
        ReportRow::Subtotal,
        ReportRow::AllocationOverheads,
        ReportRow::SubtotalAllocation,
        ReportRow::AllocationMobilization,
        ReportRow::TotalSegregationCost,
        ReportRow::LsCostOnAccountBf,
        ReportRow::TotalMobilization,
        ReportRow::AvgRepayment,
        ReportRow::MobilizationPercent,
        ReportRow::LoanServicingPa,
        ReportRow::TotalLoans,
        ReportRow::TotalRepayment,
        ReportRow::LoanServicingPerLoan,
        ReportRow::RepaymentPer100,
        ReportRow::AnnualizedCostI,
        ReportRow::AnnualizedCostII,
        ReportRow::AnnualizedCostIII,
        ReportRow::AnnualizedCostTotal,
    ];

    /// Rows persisted as service charge records each quarter.
    pub const HEADLINE: [ReportRow; 3] = [
        ReportRow::LoanServicingPerLoan,
        ReportRow::AnnualizedCostI,
        ReportRow::RepaymentPer100,
    ];

    /// Stable 1-based position of the row in the sheet.
    pub fn ordinal(&self) -> u8 {
        match self {
            ReportRow::Subtotal => 1,
            ReportRow::AllocationOverheads => 2,
            ReportRow::SubtotalAllocation => 3,
            ReportRow::AllocationMobilization => 4,
            ReportRow::TotalSegregationCost => 5,
            ReportRow::LsCostOnAccountBf => 6,
            ReportRow::TotalMobilization => 7,
            ReportRow::AvgRepayment => 8,
            ReportRow::MobilizationPercent => 9,
            ReportRow::LoanServicingPa => 10,
            ReportRow::TotalLoans => 11,
            ReportRow::TotalRepayment => 12,
            ReportRow::LoanServicingPerLoan => 13,
            ReportRow::RepaymentPer100 => 14,
            ReportRow::AnnualizedCostI => 15,
            ReportRow::AnnualizedCostII => 16,
            ReportRow::AnnualizedCostIII => 17,
            ReportRow::AnnualizedCostTotal => 18,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<ReportRow> {
        ReportRow::ALL.iter().copied().find(|r| r.ordinal() == ordinal)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportRow::Subtotal => "Sub Total",
            ReportRow::AllocationOverheads => "Allocation-I (Overheads)",
            ReportRow::SubtotalAllocation => "Sub Total after Allocation-I",
            ReportRow::AllocationMobilization => "Allocation-II (Mobilisation)",
            ReportRow::TotalSegregationCost => "Total Segregation Cost",
            ReportRow::LsCostOnAccountBf => "LS Cost on Account of B/F",
            ReportRow::TotalMobilization => "Total Loan Servicing Cost",
            ReportRow::AvgRepayment => "Average Repayment Term",
            ReportRow::MobilizationPercent => "Loan Servicing Cost % of Outstanding",
            ReportRow::LoanServicingPa => "Loan Servicing Cost p.a.",
            ReportRow::TotalLoans => "Total Loans",
            ReportRow::TotalRepayment => "Total Repayment",
            ReportRow::LoanServicingPerLoan => "Loan Servicing Cost per Loan",
            ReportRow::RepaymentPer100 => "Repayment Cost per 100",
            ReportRow::AnnualizedCostI => "Annualized Cost I (on Outstanding)",
            ReportRow::AnnualizedCostII => "Annualized Cost II (on Disbursement)",
            ReportRow::AnnualizedCostIII => "Annualized Cost III (on Total Cost)",
            ReportRow::AnnualizedCostTotal => "Annualized Cost Total",
        }
    }

    /// Rows 1-5 hold one value per [`ActivityColumn`].
    pub fn is_activity_row(&self) -> bool {
        self.ordinal() <= 5
    }

    pub fn unit(&self) -> RowUnit {
        match self {
            ReportRow::AvgRepayment => RowUnit::Months,
            ReportRow::TotalLoans => RowUnit::Count,
            ReportRow::MobilizationPercent
            | ReportRow::AnnualizedCostI
            | ReportRow::AnnualizedCostII
            | ReportRow::AnnualizedCostIII
            | ReportRow::AnnualizedCostTotal => RowUnit::Percent,
            _ => RowUnit::Amount,
        }
    }
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.ordinal(), self.label())
    }
}
