use std::collections::HashMap;

/// Translation table for one language, as served by the API.
///
/// Lookups never fail: a missing key resolves to the caller's fallback and,
/// failing that, to the key itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translations {
    language_code: String,
    entries: HashMap<String, String>,
}

impl Translations {
    pub fn new(language_code: impl Into<String>, entries: HashMap<String, String>) -> Self {
        Self {
            language_code: language_code.into(),
            entries,
        }
    }

    pub fn empty(language_code: impl Into<String>) -> Self {
        Self::new(language_code, HashMap::new())
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn text(&self, key: &str, fallback: Option<&str>) -> String {
        self.entries
            .get(key)
            .map(String::as_str)
            .or(fallback)
            .unwrap_or(key)
            .to_string()
    }

    /// `text` with the built-in English string as fallback.
    pub fn t(&self, key: &str) -> String {
        self.text(key, builtin(key))
    }
}

// ── Translation keys used by the terminal wizard ─────────────────────────────

pub const WIZARD_TITLE: &str = "SETUP_WIZARD_TITLE";
pub const STEP_LANGUAGE: &str = "SETUP_STEP_LANGUAGE";
pub const STEP_WELCOME: &str = "SETUP_STEP_WELCOME";
pub const STEP_TERMS: &str = "SETUP_STEP_TERMS";
pub const STEP_LOCALIZATION: &str = "SETUP_STEP_LOCALIZATION";
pub const STEP_DATABASE: &str = "SETUP_STEP_DATABASE";
pub const STEP_WEBSERVER: &str = "SETUP_STEP_WEBSERVER";
pub const STEP_CREDENTIALS: &str = "SETUP_STEP_CREDENTIALS";
pub const STEP_USERINFO: &str = "SETUP_STEP_USERINFO";
pub const STEP_SUMMARY: &str = "SETUP_STEP_SUMMARY";
pub const WELCOME_BODY: &str = "SETUP_WELCOME_BODY";
pub const ACCEPT_TERMS: &str = "SETUP_ACCEPT_TERMS";
pub const NEXT: &str = "SETUP_NEXT";
pub const BACK: &str = "SETUP_BACK";
pub const TEST_CONNECTION: &str = "SETUP_TEST_CONNECTION";
pub const TEST_WORKING: &str = "SETUP_TEST_WORKING";
pub const TEST_SUCCESS: &str = "SETUP_TEST_SUCCESS";
pub const TEST_FAILURE: &str = "SETUP_TEST_FAILURE";
pub const INSTALL: &str = "SETUP_INSTALL";
pub const INSTALLING: &str = "SETUP_INSTALLING";
pub const INSTALL_COMPLETE: &str = "SETUP_INSTALL_COMPLETE";
pub const INSTALL_FAILED: &str = "SETUP_INSTALL_FAILED";
pub const ALREADY_SET_UP: &str = "SETUP_ALREADY_SET_UP";
pub const GENERIC_ERROR: &str = "SETUP_GENERIC_ERROR";

/// English text for the keys above.
pub fn builtin(key: &str) -> Option<&'static str> {
    Some(match key {
        WIZARD_TITLE => "Astrana Setup Wizard",
        STEP_LANGUAGE => "Language",
        STEP_WELCOME => "Welcome",
        STEP_TERMS => "License Agreement",
        STEP_LOCALIZATION => "Localization",
        STEP_DATABASE => "Database",
        STEP_WEBSERVER => "Web Server",
        STEP_CREDENTIALS => "Administrator Credentials",
        STEP_USERINFO => "Personal Information",
        STEP_SUMMARY => "Summary",
        WELCOME_BODY => "This wizard will configure your Astrana instance.",
        ACCEPT_TERMS => "I accept the license agreement",
        NEXT => "Next",
        BACK => "Back",
        TEST_CONNECTION => "Test connection",
        TEST_WORKING => "Testing database connection...",
        TEST_SUCCESS => "Database connection succeeded.",
        TEST_FAILURE => "Database connection failed.",
        INSTALL => "Install",
        INSTALLING => "Installing...",
        INSTALL_COMPLETE => "Setup complete! You can now sign in.",
        INSTALL_FAILED => "Setup failed. Please correct the following:",
        ALREADY_SET_UP => "This instance is already set up. Continue at",
        GENERIC_ERROR => "Something went wrong. Check the log for details.",
        _ => return None,
    })
}
