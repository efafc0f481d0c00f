use std::collections::BTreeMap;

use fractic_server_error::ServerError;
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    entities::{CostCategory, LedgerPosting, QuarterRange},
    errors::GenericCalculationFailure,
};

use super::cost_category_tagger::CostCategoryTagger;

/// Per-category totals for one quarter. Every category is present; those
/// without postings hold zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotals(BTreeMap<CostCategory, Decimal>);

impl CategoryTotals {
    pub fn zero() -> Self {
        Self(CostCategory::ALL.iter().map(|c| (*c, Decimal::ZERO)).collect())
    }

    pub fn get(&self, category: CostCategory) -> Decimal {
        self.0.get(&category).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn with(mut self, category: CostCategory, amount: Decimal) -> Self {
        self.0.insert(category, amount);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CostCategory, &Decimal)> {
        self.0.iter()
    }
}

/// Sums tagged postings inside a quarter into per-category totals, at full
/// precision.
pub struct JournalAggregator<'a> {
    tagger: &'a CostCategoryTagger,
}

impl<'a> JournalAggregator<'a> {
    pub fn new(tagger: &'a CostCategoryTagger) -> Self {
        Self { tagger }
    }

    pub fn aggregate<'p, I>(
        &self,
        range: &QuarterRange,
        postings: I,
    ) -> Result<CategoryTotals, ServerError>
    where
        I: IntoIterator<Item = &'p LedgerPosting>,
    {
        let mut totals = CategoryTotals::zero();
        let mut counted = 0usize;
        for posting in postings {
            if !range.contains(posting.posting_date) {
                continue;
            }
            let category = self.tagger.tag(&posting.account_tag)?;
            let entry = totals.0.entry(category).or_insert(Decimal::ZERO);
            *entry = entry.checked_add(posting.amount).ok_or_else(|| {
                GenericCalculationFailure::new(category.canonical_tag(), "category total overflow")
            })?;
            counted += 1;
        }
        debug!(quarter = %range, postings = counted, "aggregated ledger postings");
        Ok(totals)
    }
}
