use std::collections::BTreeMap;

use fractic_server_error::ServerError;
use ron::from_str;

use crate::{
    entities::{
        CostCategory, ServiceChargeConfig, DEFAULT_DISPATCH_BATCH_SIZE, DEFAULT_WORKING_PRECISION,
    },
    errors::{InvalidRon, ReadError},
};

/// RON representation of [`ServiceChargeConfig`]:
///
/// ```text
/// (
///     currency: "USD",
///     dispatch_batch_size: 200,
///     account_tags: { "EXP:RENT": Overheads, "EXP:FIELD-STAFF": Servicing },
/// )
/// ```
#[derive(Debug, serde_derive::Deserialize)]
pub(crate) struct ServiceChargeConfigModel {
    currency: String,
    #[serde(default = "default_working_precision")]
    working_precision: u32,
    #[serde(default = "default_dispatch_batch_size")]
    dispatch_batch_size: usize,
    #[serde(default = "default_repeat_brought_forward_row")]
    repeat_brought_forward_row: bool,
    #[serde(default)]
    account_tags: BTreeMap<String, CostCategory>,
}

fn default_working_precision() -> u32 {
    DEFAULT_WORKING_PRECISION
}

fn default_dispatch_batch_size() -> usize {
    DEFAULT_DISPATCH_BATCH_SIZE
}

fn default_repeat_brought_forward_row() -> bool {
    true
}

impl TryFrom<ServiceChargeConfigModel> for ServiceChargeConfig {
    type Error = ServerError;

    fn try_from(model: ServiceChargeConfigModel) -> Result<Self, Self::Error> {
        let config = ServiceChargeConfig::new(&model.currency)?
            .with_working_precision(model.working_precision)?
            .with_dispatch_batch_size(model.dispatch_batch_size)?
            .with_repeat_brought_forward_row(model.repeat_brought_forward_row);
        Ok(model
            .account_tags
            .into_iter()
            .fold(config, |config, (tag, category)| {
                config.with_account_tag(tag, category)
            }))
    }
}

impl ServiceChargeConfig {
    pub fn from_ron_str(s: &str) -> Result<Self, ServerError> {
        let model: ServiceChargeConfigModel =
            from_str(s).map_err(|e| InvalidRon::with_debug("ServiceChargeConfig", &e))?;
        model.try_into()
    }

    pub async fn from_ron_file<P>(path: P) -> Result<Self, ServerError>
    where
        P: AsRef<std::path::Path>,
    {
        Self::from_ron_str(
            &tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ReadError::with_debug(&e))?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_with_defaults() {
        let config = ServiceChargeConfig::from_ron_str(
            r#"(currency: "USD", account_tags: { "exp:rent": Overheads })"#,
        )
        .unwrap();
        assert_eq!(config.working_precision(), DEFAULT_WORKING_PRECISION);
        assert_eq!(config.dispatch_batch_size(), DEFAULT_DISPATCH_BATCH_SIZE);
        assert!(config.repeat_brought_forward_row);
        assert_eq!(config.account_tags.get("exp:rent"), Some(&CostCategory::Overheads));
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(ServiceChargeConfig::from_ron_str(r#"(currency: "USD", dispatch_batch_size: 0)"#)
            .is_err());
        assert!(ServiceChargeConfig::from_ron_str(r#"(currency: "???")"#).is_err());
        assert!(ServiceChargeConfig::from_ron_str(
            r#"(currency: "USD", account_tags: { "X": Travel })"#
        )
        .is_err());
        assert!(ServiceChargeConfig::from_ron_str("not ron").is_err());
    }
}
