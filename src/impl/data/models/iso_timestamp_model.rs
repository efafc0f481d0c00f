use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use fractic_server_error::ServerError;

use crate::errors::InvalidIsoTimestamp;

/// `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`, or a bare date (start of
/// day).
#[derive(Debug)]
pub(crate) struct ISOTimestampModel(NaiveDateTime);
impl FromStr for ISOTimestampModel {
    type Err = ServerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .map(ISOTimestampModel)
            .ok_or_else(|| InvalidIsoTimestamp::new(s))
    }
}

impl From<ISOTimestampModel> for NaiveDateTime {
    fn from(model: ISOTimestampModel) -> Self {
        model.0
    }
}
