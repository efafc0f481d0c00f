use std::fmt;

use serde_derive::{Deserialize, Serialize};

/// Classification of a general-ledger expense for the service charge
/// allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CostCategory {
    Mobilization,
    Servicing,
    Investment,
    Overheads,
    Provisions,
    BfServicing,
}

impl CostCategory {
    pub const ALL: [CostCategory; 6] = [
        CostCategory::Mobilization,
        CostCategory::Servicing,
        CostCategory::Investment,
        CostCategory::Overheads,
        CostCategory::Provisions,
        CostCategory::BfServicing,
    ];

    /// The three operating categories that receive allocated overheads.
    pub const OPERATING: [CostCategory; 3] = [
        CostCategory::Mobilization,
        CostCategory::Servicing,
        CostCategory::Investment,
    ];

    /// Canonical ledger tag, always recognized by the tagger.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            CostCategory::Mobilization => "MOBILIZATION",
            CostCategory::Servicing => "SERVICING",
            CostCategory::Investment => "INVESTMENT",
            CostCategory::Overheads => "OVERHEADS",
            CostCategory::Provisions => "PROVISIONS",
            CostCategory::BfServicing => "BF_SERVICING",
        }
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_tag())
    }
}
