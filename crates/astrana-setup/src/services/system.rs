use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::services::{ApiEnvelope, LookupOption};

const COUNTRIES_PATH: &str = "system/countries";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub two_letter_code: String,
    #[serde(default)]
    pub three_letter_code: String,
    #[serde(default)]
    pub phone_code: Option<String>,
    #[serde(default)]
    pub flag_icon_address: Option<String>,
}

impl Country {
    pub fn as_option(&self) -> LookupOption {
        LookupOption {
            label: self.name.clone(),
            value: self.two_letter_code.clone(),
            trx_code: None,
            icon_address: self.flag_icon_address.clone(),
        }
    }
}

pub struct SystemService<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> SystemService<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    pub async fn countries(&self, page_size: u32) -> Result<Vec<Country>, ApiError> {
        let page_size = page_size.to_string();
        let envelope: ApiEnvelope<Vec<Country>> = self
            .gateway
            .get(COUNTRIES_PATH, None, &[("pageSize", page_size.as_str())])
            .await?;
        envelope.into_data("countries")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_as_option() {
        let country: Country = serde_json::from_str(
            r#"{"name":"Sweden","twoLetterCode":"SE","threeLetterCode":"SWE","phoneCode":"46"}"#,
        )
        .unwrap();
        let option = country.as_option();
        assert_eq!(option.label, "Sweden");
        assert_eq!(option.value, "SE");
        assert_eq!(country.phone_code.as_deref(), Some("46"));
    }
}
