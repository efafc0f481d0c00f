use std::str::FromStr;

use fractic_server_error::ServerError;
use rust_decimal::Decimal;

use crate::errors::InvalidAccountingAmount;

/// Amount as written in ledger exports: thousands separators allowed,
/// negatives either signed or in parentheses.
#[derive(Debug)]
pub(crate) struct AccountingAmountModel(pub Decimal);
impl FromStr for AccountingAmountModel {
    type Err = ServerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.replace(",", "");
        let is_negative = raw.trim().starts_with("(") && raw.trim().ends_with(")");
        let numeric_part = raw.trim().trim_matches(|c| c == '(' || c == ')').trim();
        let amount = Decimal::from_str(numeric_part)
            .map_err(|_| InvalidAccountingAmount::new(numeric_part))?;
        Ok(AccountingAmountModel(if is_negative {
            -amount
        } else {
            amount
        }))
    }
}

impl From<AccountingAmountModel> for Decimal {
    fn from(model: AccountingAmountModel) -> Self {
        model.0
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_accounting_notation() {
        let parse = |s: &str| -> Decimal { AccountingAmountModel::from_str(s).unwrap().into() };
        assert_eq!(parse("1,234.50"), dec!(1234.50));
        assert_eq!(parse("(700)"), dec!(-700));
        assert_eq!(parse(" -12.5 "), dec!(-12.5));
        assert!(AccountingAmountModel::from_str("12abc").is_err());
        assert!(AccountingAmountModel::from_str("").is_err());
    }
}
