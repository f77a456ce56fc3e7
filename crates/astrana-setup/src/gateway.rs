use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::services::ApiEnvelope;
use crate::session::Session;

const AUTHENTICATE_PATH: &str = "user/authenticate";

/// Credential the gateway falls back to when the access token is rejected.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
    remember_me: bool,
}

#[derive(Deserialize)]
struct AuthenticateResult {
    token: String,
}

/// HTTP client for the Astrana API.
///
/// Attaches the session's bearer token to every call. A 401 on a GET triggers
/// one re-authentication with the fallback credential followed by a single
/// retry; every other failure is surfaced to the caller as-is.
pub struct ApiGateway {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
    fallback: Option<Credentials>,
}

impl ApiGateway {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Session,
        fallback: Option<Credentials>,
    ) -> Result<Self, ApiError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            session,
            fallback,
        })
    }

    pub fn from_config(
        config: &astrana_config::ClientConfig,
        session: Session,
    ) -> Result<Self, ApiError> {
        let fallback = config.has_fallback_credential().then(|| Credentials {
            username: config.auth.fallback_username.clone(),
            password: config.auth.fallback_password.clone(),
        });
        Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
            session,
            fallback,
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Public verbs ────────────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        id: Option<&str>,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, id)?;
        match self.get_once(&url, params).await {
            Err(ApiError::AuthRejected) => {
                warn!(path, "access token rejected, re-authenticating");
                if let Err(e) = self.reauthenticate().await {
                    warn!(path, "re-authentication failed: {e}");
                    self.session.logout();
                    return Err(ApiError::AuthRejected);
                }
                match self.get_once(&url, params).await {
                    Err(ApiError::AuthRejected) => {
                        warn!(path, "retry rejected after re-authentication");
                        self.session.logout();
                        Err(ApiError::AuthRejected)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    pub async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get(path, None, &[]).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, None)?;
        let request = self.request(Method::POST, url).json(body);
        decode(self.send(request, path).await?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, None)?;
        let request = self.request(Method::PUT, url).json(body);
        decode(self.send(request, path).await?).await
    }

    pub async fn post_form_data<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let url = self.url(path, None)?;
        let request = self.request(Method::POST, url).multipart(form);
        decode(self.send(request, path).await?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path, None)?;
        let request = self.request(Method::DELETE, url);
        decode(self.send(request, path).await?).await
    }

    /// `POST user/authenticate`; stores the returned token in the session.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<String, ApiError> {
        let body = AuthenticateRequest {
            username,
            password,
            remember_me,
        };
        let envelope: ApiEnvelope<AuthenticateResult> = self.post(AUTHENTICATE_PATH, &body).await?;
        let token = envelope.into_data("access token")?.token;
        self.session.set_access_token(&token);
        info!(username, "authenticated");
        Ok(token)
    }

    // ── Internals ───────────────────────────────────────────────────────────

    async fn reauthenticate(&self) -> Result<(), ApiError> {
        let Some(creds) = &self.fallback else {
            return Err(ApiError::AuthRejected);
        };
        self.authenticate(&creds.username, &creds.password, true)
            .await
            .map(|_| ())
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut request = self.request(Method::GET, url.clone());
        if !params.is_empty() {
            request = request.query(params);
        }
        decode(self.send(request, url.path()).await?).await
    }

    fn url(&self, path: &str, id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(format!("{path}: cannot append id")))?
                .pop_if_empty()
                .push(id);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response, ApiError> {
        let resp = request.send().await.map_err(|e| {
            error!(path, "network error: {e}");
            ApiError::Network(e)
        })?;

        let status = resp.status().as_u16();
        debug!(path, status, "response received");
        if status == 401 {
            return Err(ApiError::AuthRejected);
        }
        if status >= 400 {
            let text = resp.text().await.unwrap_or_default();
            let (message, failures) = match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&text) {
                Ok(envelope) => (envelope.message.unwrap_or_else(|| text.clone()), envelope.failures),
                Err(_) => (text, Vec::new()),
            };
            warn!(path, status, "server error: {message}");
            return Err(ApiError::Server {
                status,
                message,
                failures,
            });
        }
        Ok(resp)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let text = resp.text().await?;
    let body = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}
