pub mod auth;
pub mod i18n;
pub mod legal;
pub mod settings;
pub mod setup;
pub mod system;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::strings::Translations;

pub use auth::AuthService;
pub use i18n::{InternationalizationService, Language};
pub use legal::LegalService;
pub use settings::{LookupData, LookupOption, Setting, SettingsService};
pub use setup::{
    DatabaseSettings, DatabaseTestRequest, InstanceUser, SetupRequest, SetupService, SetupStatus,
    SubmitResponse, WebServerSettings, WizardEntry,
};
pub use system::{Country, SystemService};

// ── Response envelope ────────────────────────────────────────────────────────

/// `{message, data, failures}` wrapper every Astrana endpoint responds with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub failures: Vec<Failure>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap `data`, naming `resource` in the error when it is absent.
    pub fn into_data(self, resource: &'static str) -> Result<T, ApiError> {
        self.data.ok_or(ApiError::NoPayload { resource })
    }
}

/// One field-level failure reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub message: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Wizard backend seam ──────────────────────────────────────────────────────

/// Everything the wizard controller needs from the remote API.
#[async_trait]
pub trait SetupApi: Send + Sync {
    async fn setup_status(&self) -> Result<SetupStatus, ApiError>;
    async fn license(&self, language_code: &str) -> Result<String, ApiError>;
    async fn translations(&self, language_code: &str) -> Result<Translations, ApiError>;
    async fn languages(&self) -> Result<Vec<Language>, ApiError>;
    async fn countries(&self) -> Result<Vec<Country>, ApiError>;
    async fn lookup(&self, name: &str) -> Result<LookupData, ApiError>;
    async fn database_settings(&self) -> Result<DatabaseSettings, ApiError>;
    async fn test_database(&self, request: &DatabaseTestRequest) -> Result<bool, ApiError>;
    async fn submit(&self, request: &SetupRequest) -> Result<SubmitResponse, ApiError>;
}

/// Page size used when listing countries for the localization step.
pub const COUNTRY_PAGE_SIZE: u32 = 300;

/// Production [`SetupApi`] backed by the resource services.
pub struct RemoteSetupApi {
    gateway: ApiGateway,
}

impl RemoteSetupApi {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }
}

#[async_trait]
impl SetupApi for RemoteSetupApi {
    async fn setup_status(&self) -> Result<SetupStatus, ApiError> {
        SetupService::new(&self.gateway).status().await
    }

    async fn license(&self, language_code: &str) -> Result<String, ApiError> {
        LegalService::new(&self.gateway).license(language_code).await
    }

    async fn translations(&self, language_code: &str) -> Result<Translations, ApiError> {
        InternationalizationService::new(&self.gateway)
            .translations(language_code)
            .await
    }

    async fn languages(&self) -> Result<Vec<Language>, ApiError> {
        InternationalizationService::new(&self.gateway)
            .languages()
            .await
    }

    async fn countries(&self) -> Result<Vec<Country>, ApiError> {
        SystemService::new(&self.gateway)
            .countries(COUNTRY_PAGE_SIZE)
            .await
    }

    async fn lookup(&self, name: &str) -> Result<LookupData, ApiError> {
        SettingsService::new(&self.gateway).lookup(name).await
    }

    async fn database_settings(&self) -> Result<DatabaseSettings, ApiError> {
        SetupService::new(&self.gateway).database_settings().await
    }

    async fn test_database(&self, request: &DatabaseTestRequest) -> Result<bool, ApiError> {
        SetupService::new(&self.gateway).test_database(request).await
    }

    async fn submit(&self, request: &SetupRequest) -> Result<SubmitResponse, ApiError> {
        SetupService::new(&self.gateway).submit(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_with_data() {
        let env: ApiEnvelope<Vec<String>> =
            serde_json::from_str(r#"{"message":"ok","data":["a","b"],"failures":[]}"#).unwrap();
        assert_eq!(env.into_data("languages").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_envelope_without_data() {
        let env: ApiEnvelope<Vec<String>> = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        let err = env.into_data("languages").unwrap_err();
        assert!(matches!(err, ApiError::NoPayload { resource: "languages" }));
    }

    #[test]
    fn test_envelope_null_failures() {
        let env: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"data":null,"failures":null}"#).unwrap();
        assert!(env.failures.is_empty());
        assert!(env.data.is_none());
    }

    #[test]
    fn test_failure_camel_case() {
        let env: ApiEnvelope<serde_json::Value> = serde_json::from_str(
            r#"{"data":{},"failures":[{"itemId":"username","message":"Username already taken"}]}"#,
        )
        .unwrap();
        assert_eq!(
            env.failures,
            vec![Failure {
                item_id: "username".into(),
                message: "Username already taken".into(),
            }]
        );
    }
}
