use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a run needs to know about where and when it executes.
///
/// `today` selects the current quarter; `as_of` is the snapshot timestamp
/// every read of the run is taken against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub tenant: TenantId,
    pub today: NaiveDate,
    pub as_of: NaiveDateTime,
}

impl RunContext {
    pub fn new(tenant: impl Into<String>, as_of: NaiveDateTime) -> Self {
        Self {
            tenant: TenantId(tenant.into()),
            today: as_of.date(),
            as_of,
        }
    }

    /// Same tenant and day, with a new snapshot timestamp.
    pub fn at(&self, as_of: NaiveDateTime) -> Self {
        Self {
            tenant: self.tenant.clone(),
            today: self.today,
            as_of,
        }
    }
}
