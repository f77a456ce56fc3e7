use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::services::{ApiEnvelope, Failure};

const STATUS_PATH: &str = "system/setup/status";
const DATABASE_SETTINGS_PATH: &str = "system/setup/database/settings";
const DATABASE_TEST_PATH: &str = "system/setup/database/test";
const SETUP_PATH: &str = "system/setup";

/// Where the caller is sent when the installation is already set up.
pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStatus {
    New,
    InProgress,
    Other(String),
}

impl SetupStatus {
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "new" => Self::New,
            "inprogress" => Self::InProgress,
            _ => Self::Other(lower),
        }
    }

    pub fn permits_wizard(&self) -> bool {
        matches!(self, Self::New | Self::InProgress)
    }
}

impl std::fmt::Display for SetupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::InProgress => write!(f, "inprogress"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEntry {
    Enter,
    RedirectToLogin,
}

impl WizardEntry {
    pub fn for_status(status: &SetupStatus) -> Self {
        if status.permits_wizard() {
            Self::Enter
        } else {
            Self::RedirectToLogin
        }
    }
}

/// Database connection fields, shared by the server defaults, the
/// connectivity probe and the final setup request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSettings {
    #[serde(default)]
    pub database_provider: String,
    #[serde(default)]
    pub database_name: String,
    #[serde(default)]
    pub database_host: String,
    #[serde(default, deserialize_with = "port_from_any")]
    pub database_host_port: Option<u16>,
    #[serde(default)]
    pub database_username: String,
    #[serde(default)]
    pub database_password: String,
}

/// Body of `POST system/setup/database/test`.
pub type DatabaseTestRequest = DatabaseSettings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebServerSettings {
    pub host: String,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceUser {
    pub username: String,
    pub password: String,
    pub email_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// Body of `POST system/setup`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    pub language_code: String,
    pub country_code: String,
    pub time_zone: String,
    pub terms_accepted: bool,
    pub database: DatabaseSettings,
    pub web_server: WebServerSettings,
    pub instance_user: InstanceUser,
}

/// Outcome of one submission attempt. An empty failure list means success.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitResponse {
    pub data: Option<serde_json::Value>,
    pub failures: Vec<Failure>,
}

impl SubmitResponse {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct SetupService<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> SetupService<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    pub async fn status(&self) -> Result<SetupStatus, ApiError> {
        let envelope: ApiEnvelope<String> = self.gateway.get_all(STATUS_PATH).await?;
        let status = SetupStatus::parse(&envelope.into_data("setup status")?);
        debug!(%status, "setup status");
        Ok(status)
    }

    pub async fn database_settings(&self) -> Result<DatabaseSettings, ApiError> {
        let envelope: ApiEnvelope<DatabaseSettings> =
            self.gateway.get_all(DATABASE_SETTINGS_PATH).await?;
        envelope.into_data("database settings")
    }

    pub async fn test_database(&self, request: &DatabaseTestRequest) -> Result<bool, ApiError> {
        let envelope: ApiEnvelope<bool> = self.gateway.post(DATABASE_TEST_PATH, request).await?;
        envelope.into_data("database test")
    }

    /// Submit the full setup request. Server-side validation failures come
    /// back as a [`SubmitResponse`] with a non-empty failure list, whether
    /// the server reported them with a success or an error status.
    pub async fn submit(&self, request: &SetupRequest) -> Result<SubmitResponse, ApiError> {
        match self
            .gateway
            .post::<_, ApiEnvelope<serde_json::Value>>(SETUP_PATH, request)
            .await
        {
            Ok(envelope) => Ok(SubmitResponse {
                data: envelope.data,
                failures: envelope.failures,
            }),
            Err(ApiError::Server {
                status, failures, ..
            }) if !failures.is_empty() => {
                info!(status, count = failures.len(), "setup rejected with failures");
                Ok(SubmitResponse {
                    data: None,
                    failures,
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}

fn port_from_any<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<PortValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(PortValue::Number(n)) => u16::try_from(n).ok(),
        Some(PortValue::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_status_parse() {
        assert_eq!(SetupStatus::parse("New"), SetupStatus::New);
        assert_eq!(SetupStatus::parse(" INPROGRESS "), SetupStatus::InProgress);
        assert_eq!(
            SetupStatus::parse("Completed"),
            SetupStatus::Other("completed".into())
        );
    }

    #[test]
    fn test_wizard_entry() {
        assert_eq!(WizardEntry::for_status(&SetupStatus::New), WizardEntry::Enter);
        assert_eq!(
            WizardEntry::for_status(&SetupStatus::InProgress),
            WizardEntry::Enter
        );
        assert_eq!(
            WizardEntry::for_status(&SetupStatus::parse("completed")),
            WizardEntry::RedirectToLogin
        );
    }

    #[test]
    fn test_database_settings_port_forms() {
        let numeric: DatabaseSettings = serde_json::from_str(
            r#"{"databaseProvider":"postgres","databaseHost":"db","databaseHostPort":5432}"#,
        )
        .unwrap();
        assert_eq!(numeric.database_host_port, Some(5432));

        let text: DatabaseSettings =
            serde_json::from_str(r#"{"databaseHostPort":"3306"}"#).unwrap();
        assert_eq!(text.database_host_port, Some(3306));

        let missing: DatabaseSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.database_host_port, None);
    }

    #[test]
    fn test_database_test_request_shape() {
        let req = DatabaseTestRequest {
            database_provider: "postgres".into(),
            database_name: "astrana".into(),
            database_host: "localhost".into(),
            database_host_port: Some(5432),
            database_username: "astrana".into(),
            database_password: "secret".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        for key in [
            "databaseProvider",
            "databaseName",
            "databaseHost",
            "databaseHostPort",
            "databaseUsername",
            "databasePassword",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_instance_user_skips_empty_optionals() {
        let user = InstanceUser {
            username: "operator".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("genderCode"));
        assert!(json.contains("\"emailAddress\""));
    }
}
