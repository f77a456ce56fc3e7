use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::services::ApiEnvelope;

const LICENSE_PATH: &str = "legal/license";

pub struct LegalService<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> LegalService<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// License body for `language_code`, as markdown.
    pub async fn license(&self, language_code: &str) -> Result<String, ApiError> {
        let envelope: ApiEnvelope<String> = self
            .gateway
            .get(
                LICENSE_PATH,
                None,
                &[("languageCode", language_code), ("format", "markdown")],
            )
            .await?;
        envelope.into_data("license")
    }
}
