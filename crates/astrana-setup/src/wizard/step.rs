use std::fmt;
use std::str::FromStr;

use crate::strings;

/// Wizard pages, in the only order they can be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Language,
    Welcome,
    Terms,
    Localization,
    Database,
    Webserver,
    Credentials,
    UserInfo,
    Summary,
}

impl WizardStep {
    pub const ALL: [WizardStep; 9] = [
        Self::Language,
        Self::Welcome,
        Self::Terms,
        Self::Localization,
        Self::Database,
        Self::Webserver,
        Self::Credentials,
        Self::UserInfo,
        Self::Summary,
    ];

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Progress shown when the step is reached without an explicit value.
    pub fn default_percentage(self) -> u8 {
        match self {
            Self::Language => 0,
            Self::Welcome => 10,
            Self::Terms => 20,
            Self::Localization => 30,
            Self::Database => 45,
            Self::Webserver => 60,
            Self::Credentials => 70,
            Self::UserInfo => 85,
            Self::Summary => 100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::Welcome => "welcome",
            Self::Terms => "terms",
            Self::Localization => "localization",
            Self::Database => "database",
            Self::Webserver => "webserver",
            Self::Credentials => "credentials",
            Self::UserInfo => "userinfo",
            Self::Summary => "summary",
        }
    }

    pub fn title_key(self) -> &'static str {
        match self {
            Self::Language => strings::STEP_LANGUAGE,
            Self::Welcome => strings::STEP_WELCOME,
            Self::Terms => strings::STEP_TERMS,
            Self::Localization => strings::STEP_LOCALIZATION,
            Self::Database => strings::STEP_DATABASE,
            Self::Webserver => strings::STEP_WEBSERVER,
            Self::Credentials => strings::STEP_CREDENTIALS,
            Self::UserInfo => strings::STEP_USERINFO,
            Self::Summary => strings::STEP_SUMMARY,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown wizard step: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Gathering,
    Installing,
    Complete,
}

/// Connectivity probe sub-state of the database step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseTestStatus {
    Idle,
    Working,
    Complete { success: bool },
}

impl DatabaseTestStatus {
    pub fn succeeded(self) -> bool {
        matches!(self, Self::Complete { success: true })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardProgress {
    pub step: WizardStep,
    pub percentage: u8,
    pub install_status: InstallStatus,
}

impl Default for WizardProgress {
    fn default() -> Self {
        Self {
            step: WizardStep::Language,
            percentage: 0,
            install_status: InstallStatus::Gathering,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Forward {
        to: WizardStep,
        percentage: Option<u8>,
    },
    Back,
}
