use tracing::warn;

use crate::services::{Country, Language, LookupData, LookupOption, SetupApi};

pub const DATABASE_PROVIDER_LOOKUP: &str = "databaseprovider";
pub const GENDER_LOOKUP: &str = "gender";

/// Choice lists fetched once per wizard session.
#[derive(Debug, Clone, Default)]
pub struct WizardLookups {
    pub languages: Vec<Language>,
    pub countries: Vec<Country>,
    pub database_providers: LookupData,
    pub genders: LookupData,
}

impl WizardLookups {
    /// Fetch every list. A list that fails to load stays empty; the failure
    /// is logged and the others are still fetched.
    pub async fn load(api: &dyn SetupApi) -> Self {
        let mut lookups = Self::default();

        match api.languages().await {
            Ok(languages) => lookups.languages = languages,
            Err(e) => warn!("failed to load languages: {e}"),
        }
        match api.countries().await {
            Ok(countries) => lookups.countries = countries,
            Err(e) => warn!("failed to load countries: {e}"),
        }
        match api.lookup(DATABASE_PROVIDER_LOOKUP).await {
            Ok(data) => lookups.database_providers = data,
            Err(e) => warn!("failed to load database providers: {e}"),
        }
        match api.lookup(GENDER_LOOKUP).await {
            Ok(data) => lookups.genders = data,
            Err(e) => warn!("failed to load genders: {e}"),
        }

        lookups
    }

    pub fn language_options(&self) -> Vec<LookupOption> {
        self.languages.iter().map(Language::as_option).collect()
    }

    pub fn country_options(&self) -> Vec<LookupOption> {
        self.countries.iter().map(Country::as_option).collect()
    }

    /// Dialling code of the country with the given two-letter code.
    pub fn phone_code_for(&self, country_code: &str) -> Option<&str> {
        self.countries
            .iter()
            .find(|c| c.two_letter_code.eq_ignore_ascii_case(country_code))
            .and_then(|c| c.phone_code.as_deref())
    }
}
