//! Gateway and resource service tests against a wiremock Astrana API.
//!
//! ```
//! cargo test --manifest-path crates/astrana-setup/Cargo.toml
//! ```

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use astrana_setup::error::ApiError;
use astrana_setup::gateway::{ApiGateway, Credentials};
use astrana_setup::services::{
    ApiEnvelope, AuthService, DatabaseSettings, RemoteSetupApi, SettingsService, SetupApi,
    SetupRequest, SetupStatus, WizardEntry,
};
use astrana_setup::session::Session;

fn gateway(server: &MockServer, session: Session, fallback: bool) -> ApiGateway {
    let fallback = fallback.then(|| Credentials {
        username: "installer".into(),
        password: "installer-secret".into(),
    });
    ApiGateway::new(
        &format!("{}/api", server.uri()),
        Duration::from_secs(5),
        session,
        fallback,
    )
    .unwrap()
}

fn envelope(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "message": null, "data": data, "failures": [] }))
}

async fn mount_authenticate(server: &MockServer, token: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/user/authenticate"))
        .and(body_partial_json(json!({ "username": "installer", "rememberMe": true })))
        .respond_with(envelope(json!({ "token": token })))
        .expect(calls)
        .mount(server)
        .await;
}

// ── Gateway ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/setup/status"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(envelope(json!("New")))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::in_memory();
    session.set_access_token("token-1");
    let api = RemoteSetupApi::new(gateway(&server, session, false));
    assert_eq!(api.setup_status().await.unwrap(), SetupStatus::New);
}

#[tokio::test]
async fn test_get_reauthenticates_once_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/internationalization/languages"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/internationalization/languages"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(envelope(json!([
            { "twoLetterCode": "en", "threeLetterCode": "eng", "englishName": "English", "name": "English" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    mount_authenticate(&server, "fresh", 1).await;

    let session = Session::in_memory();
    session.set_access_token("stale");
    let api = RemoteSetupApi::new(gateway(&server, session.clone(), true));

    let languages = api.languages().await.unwrap();
    assert_eq!(languages.len(), 1);
    assert_eq!(languages[0].two_letter_code, "en");
    assert_eq!(session.access_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_retry_rejected_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/setup/status"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_authenticate(&server, "fresh", 1).await;

    let session = Session::in_memory();
    session.set_access_token("stale");
    let api = RemoteSetupApi::new(gateway(&server, session.clone(), true));

    assert!(matches!(
        api.setup_status().await,
        Err(ApiError::AuthRejected)
    ));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_get_without_fallback_credential_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/setup/status"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::in_memory();
    session.set_access_token("stale");
    let api = RemoteSetupApi::new(gateway(&server, session.clone(), false));

    assert!(matches!(
        api.setup_status().await,
        Err(ApiError::AuthRejected)
    ));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_post_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/system/setup/database/test"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    mount_authenticate(&server, "fresh", 0).await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), true));
    let result = api.test_database(&DatabaseSettings::default()).await;
    assert!(matches!(result, Err(ApiError::AuthRejected)));
}

#[tokio::test]
async fn test_missing_data_is_no_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/setup/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    match api.setup_status().await {
        Err(ApiError::NoPayload { resource }) => assert_eq!(resource, "setup status"),
        other => panic!("expected NoPayload, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/setup/database/settings"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "database unreachable",
            "data": null,
            "failures": null
        })))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    match api.database_settings().await {
        Err(ApiError::Server {
            status,
            message,
            failures,
        }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unreachable");
            assert!(failures.is_empty());
        }
        other => panic!("expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_gateway_authenticate_stores_token() {
    let server = MockServer::start().await;
    mount_authenticate(&server, "issued", 1).await;

    let session = Session::in_memory();
    let gw = gateway(&server, session.clone(), false);
    let token = gw
        .authenticate("installer", "installer-secret", true)
        .await
        .unwrap();
    assert_eq!(token, "issued");
    assert_eq!(session.access_token().as_deref(), Some("issued"));
}

#[tokio::test]
async fn test_put_and_delete_decode_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/settings/theme"))
        .and(body_partial_json(json!({ "value": "dark" })))
        .respond_with(envelope(json!(true)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/settings/theme"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let gw = gateway(&server, Session::in_memory(), false);
    let put: ApiEnvelope<bool> = gw
        .put("settings/theme", &json!({ "value": "dark" }))
        .await
        .unwrap();
    assert!(put.into_data("setting").unwrap());

    let deleted: Option<ApiEnvelope<bool>> = gw.delete("settings/theme").await.unwrap();
    assert!(deleted.is_none());
}

// ── Services ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_already_set_up_redirects_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/setup/status"))
        .respond_with(envelope(json!("Complete")))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    let status = api.setup_status().await.unwrap();
    assert_eq!(status, SetupStatus::Other("complete".into()));
    assert_eq!(WizardEntry::for_status(&status), WizardEntry::RedirectToLogin);
}

#[tokio::test]
async fn test_license_requests_markdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/legal/license"))
        .and(query_param("languageCode", "fr"))
        .and(query_param("format", "markdown"))
        .respond_with(envelope(json!("# Licence")))
        .expect(1)
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    assert_eq!(api.license("fr").await.unwrap(), "# Licence");
}

#[tokio::test]
async fn test_countries_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/countries"))
        .and(query_param("pageSize", "300"))
        .respond_with(envelope(json!([
            { "name": "Sweden", "twoLetterCode": "SE", "threeLetterCode": "SWE", "phoneCode": "46" },
            { "name": "Japan", "twoLetterCode": "JP", "threeLetterCode": "JPN" }
        ])))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    let countries = api.countries().await.unwrap();
    assert_eq!(countries.len(), 2);
    assert_eq!(countries[1].phone_code, None);
}

#[tokio::test]
async fn test_lookup_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/settings/lookup/gender"))
        .respond_with(envelope(json!({
            "label": "Gender",
            "options": [
                { "label": "Female", "value": "f" },
                { "label": "Male", "value": "m" }
            ]
        })))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    let lookup = api.lookup("gender").await.unwrap();
    assert_eq!(lookup.options.len(), 2);
    assert_eq!(lookup.label_for("m"), Some("Male"));
}

#[tokio::test]
async fn test_translations_loaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/internationalization/translations"))
        .and(query_param("languageCode", "fr"))
        .respond_with(envelope(json!({ "SETUP_NEXT": "Suivant" })))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    let translations = api.translations("fr").await.unwrap();
    assert_eq!(translations.language_code(), "fr");
    assert_eq!(translations.t("SETUP_NEXT"), "Suivant");
    assert_eq!(translations.t("SETUP_BACK"), "Back");
}

#[tokio::test]
async fn test_database_defaults_accept_string_port() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/setup/database/settings"))
        .respond_with(envelope(json!({
            "databaseProvider": "postgres",
            "databaseHost": "localhost",
            "databaseHostPort": "5432",
            "databaseName": "astrana"
        })))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    let settings = api.database_settings().await.unwrap();
    assert_eq!(settings.database_host_port, Some(5432));
    assert_eq!(settings.database_username, "");
}

#[tokio::test]
async fn test_database_probe_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/system/setup/database/test"))
        .and(body_partial_json(json!({ "databaseHost": "db.internal", "databaseHostPort": 5432 })))
        .respond_with(envelope(json!(true)))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    let request = DatabaseSettings {
        database_host: "db.internal".into(),
        database_host_port: Some(5432),
        ..Default::default()
    };
    assert!(api.test_database(&request).await.unwrap());
}

#[tokio::test]
async fn test_submit_failures_on_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/system/setup"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Validation failed",
            "data": null,
            "failures": [
                { "itemId": "username", "message": "Username already taken" },
                { "itemId": "emailAddress", "message": "Invalid email" }
            ]
        })))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    let response = api.submit(&SetupRequest::default()).await.unwrap();
    assert!(!response.is_success());
    assert_eq!(response.failures.len(), 2);
    assert_eq!(response.failures[0].item_id, "username");
}

#[tokio::test]
async fn test_submit_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/system/setup"))
        .and(body_partial_json(json!({ "termsAccepted": true, "countryCode": "SE" })))
        .respond_with(envelope(json!({ "instanceId": 1 })))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    let request = SetupRequest {
        terms_accepted: true,
        country_code: "SE".into(),
        ..Default::default()
    };
    let response = api.submit(&request).await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.data, Some(json!({ "instanceId": 1 })));
}

#[tokio::test]
async fn test_submit_server_error_without_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/system/setup"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let api = RemoteSetupApi::new(gateway(&server, Session::in_memory(), false));
    match api.submit(&SetupRequest::default()).await {
        Err(ApiError::Server { status, message, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_setting_falls_back_to_default_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/settings/instanceName"))
        .respond_with(envelope(json!({ "value": null, "defaultValue": "Astrana" })))
        .mount(&server)
        .await;

    let gw = gateway(&server, Session::in_memory(), false);
    let value = SettingsService::new(&gw)
        .find_value("instanceName", Some("fallback"))
        .await
        .unwrap();
    assert_eq!(value.as_deref(), Some("Astrana"));
}

#[tokio::test]
async fn test_post_form_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/system/upload"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(envelope(json!("stored")))
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::in_memory();
    session.set_access_token("token-1");
    let gw = gateway(&server, session, false);
    let form = reqwest::multipart::Form::new().text("name", "logo.svg");
    let envelope: ApiEnvelope<String> = gw.post_form_data("system/upload", form).await.unwrap();
    assert_eq!(envelope.into_data("upload").unwrap(), "stored");
}

#[tokio::test]
async fn test_logout_clears_token() {
    let server = MockServer::start().await;
    let session = Session::in_memory();
    session.set_access_token("token-1");
    let gw = gateway(&server, session.clone(), false);
    AuthService::new(&gw).logout();
    assert!(!session.is_authenticated());
}
