use crate::error::ApiError;
use crate::gateway::ApiGateway;

pub struct AuthService<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> AuthService<'a> {
    pub fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// Authenticate and store the bearer token in the gateway's session.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<String, ApiError> {
        self.gateway
            .authenticate(username, password, remember_me)
            .await
    }

    pub fn logout(&self) {
        self.gateway.session().logout();
    }
}
