use std::collections::BTreeMap;

use fractic_server_error::ServerError;
use iso_currency::Currency;

use crate::errors::{InvalidCalculationParameter, InvalidIsoCurrencyCode};

use super::cost_category::CostCategory;

pub const DEFAULT_WORKING_PRECISION: u32 = 8;
pub const DEFAULT_DISPATCH_BATCH_SIZE: usize = 500;

/// Validated settings for a service charge computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceChargeConfig {
    pub(crate) currency: Currency,
    pub(crate) working_precision: u32,
    pub(crate) dispatch_batch_size: usize,
    pub(crate) repeat_brought_forward_row: bool,
    pub(crate) account_tags: BTreeMap<String, CostCategory>,
}

impl ServiceChargeConfig {
    pub fn new(currency_code: &str) -> Result<Self, ServerError> {
        Ok(Self {
            currency: Currency::from_code(currency_code)
                .ok_or_else(|| InvalidIsoCurrencyCode::new(currency_code))?,
            working_precision: DEFAULT_WORKING_PRECISION,
            dispatch_batch_size: DEFAULT_DISPATCH_BATCH_SIZE,
            repeat_brought_forward_row: true,
            account_tags: BTreeMap::new(),
        })
    }

    pub fn with_working_precision(mut self, working_precision: u32) -> Result<Self, ServerError> {
        // Decimal supports at most 28 fractional digits.
        if working_precision > 28 {
            return Err(InvalidCalculationParameter::new(
                "working_precision must be between 0 and 28",
            ));
        }
        self.working_precision = working_precision;
        Ok(self)
    }

    pub fn with_dispatch_batch_size(mut self, batch_size: usize) -> Result<Self, ServerError> {
        if batch_size == 0 {
            return Err(InvalidCalculationParameter::new(
                "dispatch_batch_size must be greater than zero",
            ));
        }
        self.dispatch_batch_size = batch_size;
        Ok(self)
    }

    pub fn with_repeat_brought_forward_row(mut self, repeat: bool) -> Self {
        self.repeat_brought_forward_row = repeat;
        self
    }

    pub fn with_account_tag(mut self, tag: impl Into<String>, category: CostCategory) -> Self {
        self.account_tags.insert(tag.into(), category);
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn working_precision(&self) -> u32 {
        self.working_precision
    }

    pub fn dispatch_batch_size(&self) -> usize {
        self.dispatch_batch_size
    }

    /// Decimal places used when persisting and presenting amounts.
    pub fn presentation_precision(&self) -> u32 {
        self.currency.exponent().unwrap_or(0) as u32
    }
}
