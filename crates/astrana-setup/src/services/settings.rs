use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::services::ApiEnvelope;

const LOOKUP_PATH: &str = "settings/lookup";
const SETTINGS_PATH: &str = "settings";

/// One selectable choice: language, country, database provider, gender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupOption {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub trx_code: Option<String>,
    #[serde(default)]
    pub icon_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub trx_code: Option<String>,
    #[serde(default)]
    pub options: Vec<LookupOption>,
}

impl LookupData {
    pub fn contains(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    pub fn label_for(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl Setting {
    /// Live value, then default value, then `fallback`.
    pub fn resolve(&self, fallback: Option<&str>) -> Option<String> {
        self.value
            .clone()
            .or_else(|| self.default_value.clone())
            .or_else(|| fallback.map(str::to_string))
    }
}

pub struct SettingsService<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> SettingsService<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    pub async fn lookup(&self, name: &str) -> Result<LookupData, ApiError> {
        let envelope: ApiEnvelope<LookupData> =
            self.gateway.get(LOOKUP_PATH, Some(name), &[]).await?;
        envelope.into_data("lookup")
    }

    pub async fn setting(&self, name: &str) -> Result<Setting, ApiError> {
        let envelope: ApiEnvelope<Setting> =
            self.gateway.get(SETTINGS_PATH, Some(name), &[]).await?;
        envelope.into_data("setting")
    }

    /// Resolve a setting to its live value, its default, or `fallback`, in
    /// that order. `None` only when all three are absent.
    pub async fn find_value(
        &self,
        name: &str,
        fallback: Option<&str>,
    ) -> Result<Option<String>, ApiError> {
        Ok(self.setting(name).await?.resolve(fallback))
    }
}
