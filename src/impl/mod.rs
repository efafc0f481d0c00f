// Crate-internal.
// ---

pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod loans_csv_datasource;
        pub(crate) mod portfolio_metrics_ron_datasource;
        pub(crate) mod postings_csv_datasource;
    }
    pub(crate) mod models {
        pub(crate) mod accounting_amount_model;
        pub(crate) mod config_model;
        pub(crate) mod iso_date_model;
        pub(crate) mod iso_timestamp_model;
        pub(crate) mod portfolio_metrics_model;
        pub(crate) mod quarter_selector_model;
    }
    pub(crate) mod repositories {
        pub(crate) mod ledger_repository_impl;
        pub(crate) mod loan_repository_impl;
        pub(crate) mod service_charge_repository_impl;
    }
}

pub(crate) mod domain {
    pub(crate) mod entities {
        pub(crate) mod config;
        pub(crate) mod cost_category;
        pub(crate) mod final_sheet;
        pub(crate) mod job;
        pub(crate) mod ledger_posting;
        pub(crate) mod loan;
        pub(crate) mod portfolio_metrics;
        pub(crate) mod quarter;
        pub(crate) mod report_row;
        pub(crate) mod run_context;
        pub(crate) mod service_charge_record;
    }
    pub(crate) mod logic {
        pub(crate) mod allocation_engine;
        pub(crate) mod cost_category_tagger;
        pub(crate) mod journal_aggregator;
        pub(crate) mod per_loan_charge_calculator;
        pub(crate) mod quarter_resolver;
        pub(crate) mod utils;
    }
    pub(crate) mod repositories {
        pub(crate) mod ledger_repository;
        pub(crate) mod loan_repository;
        pub(crate) mod service_charge_repository;
    }
    pub(crate) mod usecases {
        pub(crate) mod compute_final_sheet_usecase;
        pub(crate) mod loan_charge_usecase;
        pub(crate) mod scheduled_recompute_usecase;
    }
}

pub(crate) mod presentation {
    pub(crate) mod final_sheet_printer;
    pub(crate) mod utils;
}

// Public exports.
// ---

#[doc(hidden)]
#[allow(unused_imports)]
pub mod exports {
    // This mod represents how clients see the library, and can differ from the
    // internal structure.
    //
    // The contents of this mod are re-exported in the root of the crate.

    pub mod entities {
        pub use crate::domain::entities::config::*;
        pub use crate::domain::entities::cost_category::*;
        pub use crate::domain::entities::final_sheet::*;
        pub use crate::domain::entities::job::*;
        pub use crate::domain::entities::ledger_posting::*;
        pub use crate::domain::entities::loan::*;
        pub use crate::domain::entities::portfolio_metrics::*;
        pub use crate::domain::entities::quarter::*;
        pub use crate::domain::entities::report_row::*;
        pub use crate::domain::entities::run_context::*;
        pub use crate::domain::entities::service_charge_record::*;
    }

    pub mod logic {
        pub use crate::domain::logic::allocation_engine::AllocationEngine;
        pub use crate::domain::logic::cost_category_tagger::CostCategoryTagger;
        pub use crate::domain::logic::journal_aggregator::{CategoryTotals, JournalAggregator};
        pub use crate::domain::logic::per_loan_charge_calculator::PerLoanChargeCalculator;
        pub use crate::domain::logic::quarter_resolver::QuarterResolver;
        pub use crate::domain::logic::utils::{round_half_up, scaled_ratio};
    }

    pub mod repositories {
        pub use crate::data::repositories::ledger_repository_impl::LedgerRepositoryImpl;
        pub use crate::data::repositories::loan_repository_impl::LoanRepositoryImpl;
        pub use crate::data::repositories::service_charge_repository_impl::ServiceChargeRepositoryImpl;
        pub use crate::domain::repositories::ledger_repository::LedgerRepository;
        pub use crate::domain::repositories::loan_repository::LoanRepository;
        pub use crate::domain::repositories::service_charge_repository::ServiceChargeRepository;
    }
}
