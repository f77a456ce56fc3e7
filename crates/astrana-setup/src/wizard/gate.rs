use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{ValidationError, ValidationErrors, ValidationKind};
use crate::wizard::{Field, SetupConfiguration, WizardStep};

pub const USERNAME_MIN_LEN: usize = 6;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Email,
    Digits,
    Port,
    Phone,
    Date,
}

impl Pattern {
    fn matches(self, value: &str) -> bool {
        match self {
            Self::Email => email_re().is_match(value),
            Self::Digits => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
            Self::Port => value.parse::<u16>().map(|p| p > 0).unwrap_or(false),
            Self::Phone => phone_re().is_match(value),
            Self::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        }
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9][0-9 ()\-]{3,19}$").unwrap())
}

/// Constraint on one input, evaluated only when the step is submitted.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub required: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub pattern: Option<Pattern>,
}

impl FieldRule {
    const fn required(field: Field) -> Self {
        Self {
            field,
            required: true,
            min_len: None,
            max_len: None,
            pattern: None,
        }
    }

    const fn optional(field: Field) -> Self {
        Self {
            field,
            required: false,
            min_len: None,
            max_len: None,
            pattern: None,
        }
    }

    const fn min(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    const fn max(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    const fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    fn check(&self, config: &SetupConfiguration) -> Option<ValidationKind> {
        if self.field == Field::TermsAccepted {
            return (self.required && !config.terms_accepted).then_some(ValidationKind::Required);
        }

        let raw = config.get(self.field);
        let value = raw.trim();
        if value.is_empty() {
            return self.required.then_some(ValidationKind::Required);
        }

        let len = value.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                return Some(ValidationKind::TooShort { min });
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                return Some(ValidationKind::TooLong { max });
            }
        }
        match self.pattern {
            Some(p) if !p.matches(value) => Some(ValidationKind::Pattern),
            _ => None,
        }
    }
}

const LANGUAGE: &[FieldRule] = &[FieldRule::required(Field::LanguageCode)];

const TERMS: &[FieldRule] = &[FieldRule::required(Field::TermsAccepted)];

const LOCALIZATION: &[FieldRule] = &[
    FieldRule::required(Field::RegionCode),
    FieldRule::required(Field::TimeZone),
];

const DATABASE: &[FieldRule] = &[
    FieldRule::required(Field::DatabaseProvider),
    FieldRule::required(Field::DatabaseHost).max(255),
    FieldRule::required(Field::DatabasePort).pattern(Pattern::Port),
    FieldRule::required(Field::DatabaseUsername),
    FieldRule::optional(Field::DatabasePassword),
    FieldRule::required(Field::DatabaseName).max(128),
];

const WEBSERVER: &[FieldRule] = &[
    FieldRule::required(Field::WebServerHost).max(255),
    FieldRule::required(Field::WebServerPort).pattern(Pattern::Port),
];

const CREDENTIALS: &[FieldRule] = &[
    FieldRule::required(Field::EmailAddress)
        .max(254)
        .pattern(Pattern::Email),
    FieldRule::required(Field::Username).min(USERNAME_MIN_LEN),
    FieldRule::required(Field::Password).min(PASSWORD_MIN_LEN),
    FieldRule::required(Field::ConfirmPassword).min(PASSWORD_MIN_LEN),
];

const USERINFO: &[FieldRule] = &[
    FieldRule::required(Field::FirstName).max(100),
    FieldRule::required(Field::LastName).max(100),
    FieldRule::optional(Field::PhoneCountryCode)
        .max(4)
        .pattern(Pattern::Digits),
    FieldRule::optional(Field::PhoneNumber).pattern(Pattern::Phone),
    FieldRule::optional(Field::GenderCode),
    FieldRule::optional(Field::DateOfBirth).pattern(Pattern::Date),
];

pub fn rules_for(step: WizardStep) -> &'static [FieldRule] {
    match step {
        WizardStep::Language => LANGUAGE,
        WizardStep::Welcome => &[],
        WizardStep::Terms => TERMS,
        WizardStep::Localization => LOCALIZATION,
        WizardStep::Database => DATABASE,
        WizardStep::Webserver => WEBSERVER,
        WizardStep::Credentials => CREDENTIALS,
        WizardStep::UserInfo => USERINFO,
        WizardStep::Summary => &[],
    }
}

/// Submit-time validation of one wizard page.
pub struct StepGate;

impl StepGate {
    pub fn validate(step: WizardStep, config: &SetupConfiguration) -> Result<(), ValidationErrors> {
        let mut errors: Vec<ValidationError> = rules_for(step)
            .iter()
            .filter_map(|rule| {
                rule.check(config).map(|kind| ValidationError {
                    field: rule.field,
                    kind,
                })
            })
            .collect();

        if step == WizardStep::Credentials
            && !errors.iter().any(|e| e.field == Field::ConfirmPassword)
            && config.password != config.confirm_password
        {
            errors.push(ValidationError {
                field: Field::ConfirmPassword,
                kind: ValidationKind::Mismatch {
                    other: Field::Password,
                },
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}
