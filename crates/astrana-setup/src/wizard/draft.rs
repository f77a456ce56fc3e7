use std::fmt;

use crate::services::{DatabaseSettings, InstanceUser, SetupRequest, WebServerSettings};

/// Every input on every wizard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    LanguageCode,
    RegionCode,
    TimeZone,
    TermsAccepted,
    DatabaseProvider,
    DatabaseHost,
    DatabasePort,
    DatabaseUsername,
    DatabasePassword,
    DatabaseName,
    WebServerHost,
    WebServerPort,
    EmailAddress,
    PhoneCountryCode,
    PhoneNumber,
    Username,
    Password,
    ConfirmPassword,
    FirstName,
    LastName,
    GenderCode,
    DateOfBirth,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Self::LanguageCode => "languageCode",
            Self::RegionCode => "regionCode",
            Self::TimeZone => "timeZone",
            Self::TermsAccepted => "termsAccepted",
            Self::DatabaseProvider => "databaseProvider",
            Self::DatabaseHost => "databaseHost",
            Self::DatabasePort => "databaseHostPort",
            Self::DatabaseUsername => "databaseUsername",
            Self::DatabasePassword => "databasePassword",
            Self::DatabaseName => "databaseName",
            Self::WebServerHost => "webServerHost",
            Self::WebServerPort => "webServerPort",
            Self::EmailAddress => "emailAddress",
            Self::PhoneCountryCode => "phoneCountryCode",
            Self::PhoneNumber => "phoneNumber",
            Self::Username => "username",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::GenderCode => "genderCode",
            Self::DateOfBirth => "dateOfBirth",
        }
    }

    pub fn is_database(self) -> bool {
        matches!(
            self,
            Self::DatabaseProvider
                | Self::DatabaseHost
                | Self::DatabasePort
                | Self::DatabaseUsername
                | Self::DatabasePassword
                | Self::DatabaseName
        )
    }

    pub fn is_secret(self) -> bool {
        matches!(
            self,
            Self::DatabasePassword | Self::Password | Self::ConfirmPassword
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mutable draft of the whole installation, one per wizard session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SetupConfiguration {
    pub language_code: String,
    pub region_code: String,
    pub time_zone: String,
    pub terms_accepted: bool,
    pub database_provider: String,
    pub database_host: String,
    pub database_port: String,
    pub database_username: String,
    pub database_password: String,
    pub database_name: String,
    pub web_server_host: String,
    pub web_server_port: String,
    pub email_address: String,
    pub phone_country_code: String,
    pub phone_number: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub gender_code: String,
    pub date_of_birth: String,
}

impl SetupConfiguration {
    pub fn with_locale(language_code: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            language_code: language_code.into(),
            time_zone: time_zone.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, field: Field) -> String {
        if field == Field::TermsAccepted {
            return self.terms_accepted.to_string();
        }
        self.text(field).map(str::to_string).unwrap_or_default()
    }

    /// Apply one input change.
    pub fn set(&mut self, field: Field, value: &str) {
        if field == Field::TermsAccepted {
            self.terms_accepted = matches!(
                value.trim().to_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            );
            return;
        }
        if let Some(slot) = self.text_mut(field) {
            *slot = value.to_string();
        }
    }

    fn text(&self, field: Field) -> Option<&str> {
        Some(match field {
            Field::LanguageCode => self.language_code.as_str(),
            Field::RegionCode => self.region_code.as_str(),
            Field::TimeZone => self.time_zone.as_str(),
            Field::TermsAccepted => return None,
            Field::DatabaseProvider => self.database_provider.as_str(),
            Field::DatabaseHost => self.database_host.as_str(),
            Field::DatabasePort => self.database_port.as_str(),
            Field::DatabaseUsername => self.database_username.as_str(),
            Field::DatabasePassword => self.database_password.as_str(),
            Field::DatabaseName => self.database_name.as_str(),
            Field::WebServerHost => self.web_server_host.as_str(),
            Field::WebServerPort => self.web_server_port.as_str(),
            Field::EmailAddress => self.email_address.as_str(),
            Field::PhoneCountryCode => self.phone_country_code.as_str(),
            Field::PhoneNumber => self.phone_number.as_str(),
            Field::Username => self.username.as_str(),
            Field::Password => self.password.as_str(),
            Field::ConfirmPassword => self.confirm_password.as_str(),
            Field::FirstName => self.first_name.as_str(),
            Field::LastName => self.last_name.as_str(),
            Field::GenderCode => self.gender_code.as_str(),
            Field::DateOfBirth => self.date_of_birth.as_str(),
        })
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        Some(match field {
            Field::LanguageCode => &mut self.language_code,
            Field::RegionCode => &mut self.region_code,
            Field::TimeZone => &mut self.time_zone,
            Field::TermsAccepted => return None,
            Field::DatabaseProvider => &mut self.database_provider,
            Field::DatabaseHost => &mut self.database_host,
            Field::DatabasePort => &mut self.database_port,
            Field::DatabaseUsername => &mut self.database_username,
            Field::DatabasePassword => &mut self.database_password,
            Field::DatabaseName => &mut self.database_name,
            Field::WebServerHost => &mut self.web_server_host,
            Field::WebServerPort => &mut self.web_server_port,
            Field::EmailAddress => &mut self.email_address,
            Field::PhoneCountryCode => &mut self.phone_country_code,
            Field::PhoneNumber => &mut self.phone_number,
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
            Field::ConfirmPassword => &mut self.confirm_password,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::GenderCode => &mut self.gender_code,
            Field::DateOfBirth => &mut self.date_of_birth,
        })
    }

    /// Fill empty database fields from the server's defaults.
    pub fn apply_database_defaults(&mut self, defaults: &DatabaseSettings) {
        fill(&mut self.database_provider, &defaults.database_provider);
        fill(&mut self.database_host, &defaults.database_host);
        fill(&mut self.database_username, &defaults.database_username);
        fill(&mut self.database_password, &defaults.database_password);
        fill(&mut self.database_name, &defaults.database_name);
        if self.database_port.is_empty() {
            if let Some(port) = defaults.database_host_port {
                self.database_port = port.to_string();
            }
        }
    }

    pub fn database_settings(&self) -> DatabaseSettings {
        DatabaseSettings {
            database_provider: self.database_provider.clone(),
            database_name: self.database_name.clone(),
            database_host: self.database_host.clone(),
            database_host_port: self.database_port.trim().parse().ok(),
            database_username: self.database_username.clone(),
            database_password: self.database_password.clone(),
        }
    }
}

impl fmt::Debug for SetupConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupConfiguration")
            .field("language_code", &self.language_code)
            .field("region_code", &self.region_code)
            .field("time_zone", &self.time_zone)
            .field("terms_accepted", &self.terms_accepted)
            .field("database_provider", &self.database_provider)
            .field("database_host", &self.database_host)
            .field("database_port", &self.database_port)
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("email_address", &self.email_address)
            .finish_non_exhaustive()
    }
}

fn fill(slot: &mut String, value: &str) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.to_string();
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl From<&SetupConfiguration> for SetupRequest {
    fn from(config: &SetupConfiguration) -> Self {
        Self {
            language_code: config.language_code.clone(),
            country_code: config.region_code.clone(),
            time_zone: config.time_zone.clone(),
            terms_accepted: config.terms_accepted,
            database: config.database_settings(),
            web_server: WebServerSettings {
                host: config.web_server_host.clone(),
                port: config.web_server_port.trim().parse().ok(),
            },
            instance_user: InstanceUser {
                username: config.username.clone(),
                password: config.password.clone(),
                email_address: config.email_address.clone(),
                phone_country_code: non_empty(&config.phone_country_code),
                phone_number: non_empty(&config.phone_number),
                first_name: config.first_name.clone(),
                last_name: config.last_name.clone(),
                gender_code: non_empty(&config.gender_code),
                date_of_birth: non_empty(&config.date_of_birth),
            },
        }
    }
}
