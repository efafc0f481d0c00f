use iso_currency::Currency;
use rust_decimal::Decimal;

use crate::entities::{
    ActivityColumn, FinalSheet, FinalSheetData, RenderedReport, ReportRow, RowUnit,
};

use super::utils::{decimal_places, format_amount, format_number};

impl FinalSheet {
    /// Renders the sheet as text and HTML. The first rendition is cached;
    /// later calls return it unchanged unless `force_recreate` is set, which
    /// rebuilds it from the current values.
    pub fn render(&mut self, force_recreate: bool) -> &RenderedReport {
        let rendered = match self.rendered.take() {
            Some(rendered) if !force_recreate => rendered,
            _ => FinalSheetPrinter::new().print(self),
        };
        self.rendered.insert(rendered)
    }
}

/// Table 2 rows in print order. The brought-forward row is printed a second
/// time after the first block when `repeat_brought_forward_row` is set.
fn particulars_layout(repeat_brought_forward_row: bool) -> Vec<ReportRow> {
    let particulars: Vec<ReportRow> = ReportRow::ALL
        .iter()
        .copied()
        .filter(|r| !r.is_activity_row())
        .collect();
    let mut layout = Vec::with_capacity(particulars.len() + 1);
    for row in particulars {
        layout.push(row);
        if row == ReportRow::TotalRepayment && repeat_brought_forward_row {
            layout.push(ReportRow::LsCostOnAccountBf);
        }
    }
    layout
}

pub(crate) struct FinalSheetPrinter;

impl FinalSheetPrinter {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn print(&self, sheet: &FinalSheet) -> RenderedReport {
        RenderedReport {
            text: self.print_text(sheet),
            html: self.print_html(sheet),
        }
    }

    fn print_text(&self, sheet: &FinalSheet) -> String {
        let mut output = String::new();
        output.push_str(&format!("Service charge final sheet: {}\n\n", sheet.range));

        output.push_str(&format!("{:32}", "Category"));
        for column in ActivityColumn::ALL {
            output.push_str(&format!(" {:>18}", column.header()));
        }
        output.push('\n');
        output.push_str(&format!("{}\n", "-".repeat(32 + 19 * ActivityColumn::ALL.len())));
        for row in ReportRow::ALL.iter().filter(|r| r.is_activity_row()) {
            output.push_str(&format!("{:32}", row.label()));
            for column in ActivityColumn::ALL {
                output.push_str(&format!(
                    " {:>18}",
                    self.activity_cell(&sheet.data, *row, column, sheet.currency)
                ));
            }
            output.push('\n');
        }
        output.push('\n');

        output.push_str(&format!("{:40} {:>24}\n", "Particulars", "Value"));
        output.push_str(&format!("{}\n", "-".repeat(65)));
        for row in particulars_layout(sheet.repeat_brought_forward_row) {
            output.push_str(&format!(
                "{:40} {:>24}\n",
                row.label(),
                self.particular_cell(&sheet.data, row, sheet.currency)
            ));
        }
        output
    }

    fn print_html(&self, sheet: &FinalSheet) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "<h3>Service charge final sheet: {}</h3>\n",
            escape(&sheet.range.to_string())
        ));

        output.push_str("<table class=\"service-charge-allocation\">\n<thead><tr><th>Category</th>");
        for column in ActivityColumn::ALL {
            output.push_str(&format!("<th>{}</th>", column.header()));
        }
        output.push_str("</tr></thead>\n<tbody>\n");
        for row in ReportRow::ALL.iter().filter(|r| r.is_activity_row()) {
            output.push_str(&format!("<tr><td>{}</td>", escape(row.label())));
            for column in ActivityColumn::ALL {
                output.push_str(&format!(
                    "<td class=\"amount\">{}</td>",
                    escape(&self.activity_cell(&sheet.data, *row, column, sheet.currency))
                ));
            }
            output.push_str("</tr>\n");
        }
        output.push_str("</tbody>\n</table>\n");

        output.push_str(
            "<table class=\"service-charge-particulars\">\n<thead><tr><th>Particulars</th><th>Value</th></tr></thead>\n<tbody>\n",
        );
        for row in particulars_layout(sheet.repeat_brought_forward_row) {
            output.push_str(&format!(
                "<tr><td>{}</td><td class=\"amount\">{}</td></tr>\n",
                escape(row.label()),
                escape(&self.particular_cell(&sheet.data, row, sheet.currency))
            ));
        }
        output.push_str("</tbody>\n</table>\n");
        output
    }

    fn activity_cell(
        &self,
        data: &FinalSheetData,
        row: ReportRow,
        column: ActivityColumn,
        currency: Currency,
    ) -> String {
        data.activity_value(row, column)
            .map(|v| format_number(v, decimal_places(currency)))
            .unwrap_or_else(|_| "-".to_string())
    }

    fn particular_cell(&self, data: &FinalSheetData, row: ReportRow, currency: Currency) -> String {
        match data.particular(row) {
            Ok(value) => self.format_particular(row, value, currency),
            Err(_) => "-".to_string(),
        }
    }

    fn format_particular(&self, row: ReportRow, value: Decimal, currency: Currency) -> String {
        match row.unit() {
            RowUnit::Amount => format_amount(value, currency),
            RowUnit::Percent => format!("{} %", format_number(value, 2)),
            RowUnit::Count => format_number(value, 0),
            RowUnit::Months => format!("{} months", format_number(value, 1)),
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        domain::logic::quarter_resolver::QuarterResolver,
        entities::{PortfolioMetrics, Quarter},
    };

    fn sheet(repeat: bool) -> FinalSheet {
        let mut data = FinalSheetData::init();
        data.set_column(
            ReportRow::Subtotal,
            vec![dec!(1000), dec!(2000), dec!(500), dec!(700), dec!(3500)],
        );
        data.set_column(ReportRow::LsCostOnAccountBf, vec![dec!(300)]);
        data.set_column(ReportRow::TotalLoans, vec![dec!(50)]);
        data.set_column(ReportRow::AnnualizedCostI, vec![dec!(9.4)]);
        FinalSheet::new(
            QuarterResolver::quarter_range(Quarter::Q1, 2024).unwrap(),
            Currency::USD,
            repeat,
            PortfolioMetrics::default(),
            data,
        )
    }

    #[test]
    fn layout_repeats_brought_forward_row_after_first_block() {
        let layout = particulars_layout(true);
        assert_eq!(layout.len(), 14);
        assert_eq!(layout[0], ReportRow::LsCostOnAccountBf);
        assert_eq!(layout[6], ReportRow::TotalRepayment);
        assert_eq!(layout[7], ReportRow::LsCostOnAccountBf);
        assert_eq!(layout[8], ReportRow::LoanServicingPerLoan);
        assert_eq!(layout.last(), Some(&ReportRow::AnnualizedCostTotal));
        assert_eq!(particulars_layout(false).len(), 13);
    }

    #[test]
    fn text_contains_both_tables() {
        let mut sheet = sheet(true);
        let text = sheet.render(false).text.clone();
        assert!(text.contains("Q1-2024 (2024-01-01 to 2024-03-31)"));
        assert!(text.contains("Loan Servicing"));
        assert!(text.contains("3,500.00"));
        assert!(text.contains("9.40 %"));
        assert_eq!(text.matches(ReportRow::LsCostOnAccountBf.label()).count(), 2);
        // Rows not computed yet print as a dash.
        assert!(text.contains(&format!("{:40} {:>24}", ReportRow::AnnualizedCostII.label(), "-")));
    }

    #[test]
    fn html_has_two_tables() {
        let mut sheet = sheet(false);
        let html = sheet.render(false).html.clone();
        assert_eq!(html.matches("<table").count(), 2);
        assert!(html.contains("<th>Mobilisation</th>"));
        assert!(html.contains("<td class=\"amount\">50</td>"));
        assert_eq!(html.matches(ReportRow::LsCostOnAccountBf.label()).count(), 1);
    }

    #[test]
    fn render_is_cached_until_forced() {
        let mut sheet = sheet(true);
        let first = sheet.render(false).clone();
        sheet.set_column(ReportRow::TotalLoans, vec![dec!(75)]);
        assert_eq!(sheet.render(false), &first);
        let rebuilt = sheet.render(true).clone();
        assert_ne!(rebuilt, first);
        assert!(rebuilt.html.contains("<td class=\"amount\">75</td>"));
    }
}
