use std::collections::HashMap;

use fractic_server_error::ServerError;

use crate::{
    entities::{CostCategory, ServiceChargeConfig},
    errors::InvalidCalculationParameter,
};

/// Lookup table from raw ledger-account tag to cost category.
///
/// Built once per configuration and passed by reference. Canonical tags
/// (`MOBILIZATION`, `SERVICING`, ...) are always known; configured tags are
/// layered on top. Matching ignores surrounding whitespace and ASCII case.
#[derive(Debug, Clone)]
pub struct CostCategoryTagger {
    table: HashMap<String, CostCategory>,
}

impl CostCategoryTagger {
    pub fn new(config: &ServiceChargeConfig) -> Self {
        let mut table: HashMap<String, CostCategory> = CostCategory::ALL
            .iter()
            .map(|c| (c.canonical_tag().to_string(), *c))
            .collect();
        for (tag, category) in &config.account_tags {
            table.insert(normalize(tag), *category);
        }
        Self { table }
    }

    pub fn tag(&self, account_tag: &str) -> Result<CostCategory, ServerError> {
        self.table.get(&normalize(account_tag)).copied().ok_or_else(|| {
            InvalidCalculationParameter::new(&format!(
                "unrecognized ledger account tag '{account_tag}'"
            ))
        })
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().to_ascii_uppercase()
}
