use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::services::{ApiEnvelope, LookupOption};
use crate::strings::Translations;

const LANGUAGES_PATH: &str = "internationalization/languages";
const TRANSLATIONS_PATH: &str = "internationalization/translations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub two_letter_code: String,
    #[serde(default)]
    pub three_letter_code: String,
    #[serde(default)]
    pub english_name: String,
    /// Name of the language in the language itself.
    #[serde(default)]
    pub name: String,
    /// `ltr` or `rtl`.
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "ltr".into()
}

impl Language {
    pub fn is_rtl(&self) -> bool {
        self.direction.eq_ignore_ascii_case("rtl")
    }

    pub fn as_option(&self) -> LookupOption {
        let label = if self.name.is_empty() || self.name == self.english_name {
            self.english_name.clone()
        } else {
            format!("{} ({})", self.name, self.english_name)
        };
        LookupOption {
            label,
            value: self.two_letter_code.clone(),
            trx_code: None,
            icon_address: None,
        }
    }
}

pub struct InternationalizationService<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> InternationalizationService<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    pub async fn languages(&self) -> Result<Vec<Language>, ApiError> {
        let envelope: ApiEnvelope<Vec<Language>> = self.gateway.get_all(LANGUAGES_PATH).await?;
        envelope.into_data("languages")
    }

    pub async fn translations(&self, language_code: &str) -> Result<Translations, ApiError> {
        let envelope: ApiEnvelope<HashMap<String, String>> = self
            .gateway
            .get(TRANSLATIONS_PATH, None, &[("languageCode", language_code)])
            .await?;
        Ok(Translations::new(language_code, envelope.into_data("translations")?))
    }
}
