use std::time::Duration;

use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::WizardError;
use crate::services::{LookupOption, SetupApi, SubmitResponse};
use crate::session::mask_secret;
use crate::strings;
use crate::wizard::{
    DatabaseTestStatus, Field, SetupConfiguration, WizardController, WizardStep,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Next,
    Back,
    TestConnection,
    Install,
}

/// Terminal front end over [`WizardController`].
pub struct SetupWizard<'a> {
    api: &'a dyn SetupApi,
    controller: WizardController,
}

impl<'a> SetupWizard<'a> {
    pub fn new(api: &'a dyn SetupApi, draft: SetupConfiguration) -> Self {
        Self {
            api,
            controller: WizardController::new(draft),
        }
    }

    pub async fn run(mut self) -> Result<SubmitResponse, WizardError> {
        let spinner = spinner("Loading...");
        self.controller.load_lookups(self.api).await;
        self.controller.load_database_defaults(self.api).await;
        let language = self.controller.config().language_code.clone();
        self.controller.select_language(self.api, &language).await;
        spinner.finish_and_clear();

        println!("\n{}", "=".repeat(44));
        println!("    {}", self.t(strings::WIZARD_TITLE));
        println!("{}\n", "=".repeat(44));

        loop {
            self.draw_progress();
            let step = self.controller.step();
            match step {
                WizardStep::Language => self.language_step().await?,
                WizardStep::Welcome => println!("  {}\n", self.t(strings::WELCOME_BODY)),
                WizardStep::Terms => self.terms_step()?,
                WizardStep::Localization => self.localization_step()?,
                WizardStep::Database => self.database_step()?,
                WizardStep::Webserver => self.webserver_step()?,
                WizardStep::Credentials => self.credentials_step()?,
                WizardStep::UserInfo => self.userinfo_step()?,
                WizardStep::Summary => self.print_summary(),
            }

            match self.choose_action()? {
                Action::Next => match self.controller.advance() {
                    Ok(_) => {}
                    Err(WizardError::Validation(errors)) => {
                        for error in errors.iter() {
                            println!("  ! {error}");
                        }
                        println!();
                    }
                    Err(WizardError::NotAllowed(reason)) => println!("  ! {reason}\n"),
                    Err(e) => return Err(e),
                },
                Action::Back => self.controller.back().map(|_| ())?,
                Action::TestConnection => self.test_connection().await?,
                Action::Install => {
                    if let Some(response) = self.install().await? {
                        return Ok(response);
                    }
                }
            }
        }
    }

    fn t(&self, key: &str) -> String {
        self.controller.translations().t(key)
    }

    fn draw_progress(&self) {
        let step = self.controller.step();
        let bar = ProgressBar::new(100)
            .with_style(bar_style())
            .with_message(self.t(step.title_key()));
        bar.set_position(u64::from(self.controller.percentage()));
        bar.abandon();
    }

    fn choose_action(&self) -> Result<Action, WizardError> {
        let step = self.controller.step();
        let mut actions = Vec::new();
        match step {
            WizardStep::Summary => actions.push(Action::Install),
            WizardStep::Database => {
                actions.push(Action::TestConnection);
                if self.controller.can_advance() {
                    actions.push(Action::Next);
                }
            }
            _ => actions.push(Action::Next),
        }
        if step != WizardStep::Language {
            actions.push(Action::Back);
        }

        let labels: Vec<String> = actions
            .iter()
            .map(|a| match a {
                Action::Next => self.t(strings::NEXT),
                Action::Back => self.t(strings::BACK),
                Action::TestConnection => self.t(strings::TEST_CONNECTION),
                Action::Install => self.t(strings::INSTALL),
            })
            .collect();
        let selection = Select::new()
            .items(&labels)
            .default(0)
            .interact()
            .map_err(|_| WizardError::UserCancelled)?;
        Ok(actions[selection])
    }

    // ── Field prompts ───────────────────────────────────────────────────────

    fn label(&self, field: Field) -> String {
        self.controller
            .translations()
            .text(field.key(), Some(field_label(field)))
    }

    fn input(&mut self, field: Field) -> Result<(), WizardError> {
        let current = self.controller.config().get(field);
        let value: String = Input::new()
            .with_prompt(self.label(field))
            .default(current.clone())
            .show_default(!current.is_empty())
            .allow_empty(true)
            .interact_text()
            .map_err(|_| WizardError::UserCancelled)?;
        self.controller.set_field(field, value.trim());
        Ok(())
    }

    /// Empty input keeps a previously entered secret.
    fn secret(&mut self, field: Field) -> Result<(), WizardError> {
        let current = self.controller.config().get(field);
        let prompt = if current.is_empty() {
            self.label(field)
        } else {
            format!("{} [{}]", self.label(field), mask_secret(&current))
        };
        let value = Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|_| WizardError::UserCancelled)?;
        if !value.is_empty() || current.is_empty() {
            self.controller.set_field(field, &value);
        }
        Ok(())
    }

    fn select(
        &mut self,
        field: Field,
        options: &[LookupOption],
        optional: bool,
    ) -> Result<(), WizardError> {
        if options.is_empty() {
            return self.input(field);
        }
        let current = self.controller.config().get(field);
        let mut labels: Vec<&str> = Vec::with_capacity(options.len() + 1);
        if optional {
            labels.push("-");
        }
        labels.extend(options.iter().map(|o| o.label.as_str()));

        let offset = usize::from(optional);
        let default = options
            .iter()
            .position(|o| o.value.eq_ignore_ascii_case(&current))
            .map(|i| i + offset)
            .unwrap_or(0);
        let selection = Select::new()
            .with_prompt(self.label(field))
            .items(&labels)
            .default(default)
            .max_length(15)
            .interact()
            .map_err(|_| WizardError::UserCancelled)?;

        let value = match selection.checked_sub(offset) {
            Some(i) => options[i].value.clone(),
            None => String::new(),
        };
        self.controller.set_field(field, &value);
        Ok(())
    }

    // ── Steps ───────────────────────────────────────────────────────────────

    async fn language_step(&mut self) -> Result<(), WizardError> {
        let previous = self.controller.config().language_code.clone();
        let options = self.controller.lookups().language_options();
        self.select(Field::LanguageCode, &options, false)?;

        let selected = self.controller.config().language_code.clone();
        if selected != previous || self.controller.license_text().is_none() {
            self.controller.select_language(self.api, &selected).await;
        }
        Ok(())
    }

    fn terms_step(&mut self) -> Result<(), WizardError> {
        match self.controller.license_text() {
            Some(text) => println!("{text}\n"),
            None => println!("  {}\n", self.t(strings::GENERIC_ERROR)),
        }
        let accepted = Confirm::new()
            .with_prompt(self.t(strings::ACCEPT_TERMS))
            .default(self.controller.config().terms_accepted)
            .interact()
            .map_err(|_| WizardError::UserCancelled)?;
        self.controller
            .set_field(Field::TermsAccepted, &accepted.to_string());
        Ok(())
    }

    fn localization_step(&mut self) -> Result<(), WizardError> {
        let countries = self.controller.lookups().country_options();
        self.select(Field::RegionCode, &countries, false)?;
        self.input(Field::TimeZone)?;

        if self.controller.config().phone_country_code.is_empty() {
            let region = self.controller.config().region_code.clone();
            if let Some(code) = self.controller.lookups().phone_code_for(&region) {
                let code = code.trim_start_matches('+').to_string();
                self.controller.set_field(Field::PhoneCountryCode, &code);
            }
        }
        Ok(())
    }

    fn database_step(&mut self) -> Result<(), WizardError> {
        let providers = self.controller.lookups().database_providers.options.clone();
        self.select(Field::DatabaseProvider, &providers, false)?;
        self.input(Field::DatabaseHost)?;
        self.input(Field::DatabasePort)?;
        self.input(Field::DatabaseUsername)?;
        self.secret(Field::DatabasePassword)?;
        self.input(Field::DatabaseName)?;

        match self.controller.database_test_status() {
            DatabaseTestStatus::Complete { success: true } => {
                println!("  {}\n", self.t(strings::TEST_SUCCESS))
            }
            DatabaseTestStatus::Complete { success: false } => {
                println!("  {}\n", self.t(strings::TEST_FAILURE))
            }
            _ => {}
        }
        Ok(())
    }

    fn webserver_step(&mut self) -> Result<(), WizardError> {
        self.input(Field::WebServerHost)?;
        self.input(Field::WebServerPort)
    }

    fn credentials_step(&mut self) -> Result<(), WizardError> {
        self.input(Field::EmailAddress)?;
        self.input(Field::Username)?;
        self.secret(Field::Password)?;
        self.secret(Field::ConfirmPassword)
    }

    fn userinfo_step(&mut self) -> Result<(), WizardError> {
        self.input(Field::FirstName)?;
        self.input(Field::LastName)?;
        self.input(Field::PhoneCountryCode)?;
        self.input(Field::PhoneNumber)?;
        let genders = self.controller.lookups().genders.options.clone();
        self.select(Field::GenderCode, &genders, true)?;
        self.input(Field::DateOfBirth)
    }

    fn print_summary(&self) {
        let config = self.controller.config();
        let rows = [
            Field::LanguageCode,
            Field::RegionCode,
            Field::TimeZone,
            Field::DatabaseProvider,
            Field::DatabaseHost,
            Field::DatabasePort,
            Field::DatabaseUsername,
            Field::DatabasePassword,
            Field::DatabaseName,
            Field::WebServerHost,
            Field::WebServerPort,
            Field::EmailAddress,
            Field::Username,
            Field::Password,
            Field::FirstName,
            Field::LastName,
            Field::PhoneCountryCode,
            Field::PhoneNumber,
            Field::GenderCode,
            Field::DateOfBirth,
        ];
        for field in rows {
            let value = config.get(field);
            let shown = if field.is_secret() && !value.is_empty() {
                "********".to_string()
            } else {
                value
            };
            println!("  {:<24} {shown}", self.label(field));
        }
        println!();
    }

    // ── Remote actions ──────────────────────────────────────────────────────

    async fn test_connection(&mut self) -> Result<(), WizardError> {
        let spinner = spinner(&self.t(strings::TEST_WORKING));
        let status = self.controller.test_database(self.api).await;
        spinner.finish_and_clear();
        match status? {
            DatabaseTestStatus::Complete { success: true } => {
                println!("  {}\n", self.t(strings::TEST_SUCCESS))
            }
            DatabaseTestStatus::Complete { success: false } => {
                println!("  {}\n", self.t(strings::TEST_FAILURE))
            }
            _ => {}
        }
        Ok(())
    }

    /// `Ok(None)` means the server rejected the request and the user may
    /// correct the draft and retry.
    async fn install(&mut self) -> Result<Option<SubmitResponse>, WizardError> {
        let spinner = spinner(&self.t(strings::INSTALLING));
        let result = self.controller.submit(self.api).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n  {}\n", self.t(strings::INSTALL_COMPLETE));
                Ok(Some(response))
            }
            Err(WizardError::ServerValidation(failures)) => {
                println!("\n  {}", self.t(strings::INSTALL_FAILED));
                for failure in &failures {
                    if failure.item_id.is_empty() {
                        println!("    - {}", failure.message);
                    } else {
                        println!("    - {}: {}", failure.item_id, failure.message);
                    }
                }
                println!();
                Ok(None)
            }
            Err(WizardError::Api(e)) => {
                println!("\n  {}\n  {e}\n", self.t(strings::GENERIC_ERROR));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner().with_message(message.to_string());
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// English prompt label, used when the translation table has no entry.
fn field_label(field: Field) -> &'static str {
    match field {
        Field::LanguageCode => "Language",
        Field::RegionCode => "Country / region",
        Field::TimeZone => "Time zone",
        Field::TermsAccepted => "License accepted",
        Field::DatabaseProvider => "Database provider",
        Field::DatabaseHost => "Database host",
        Field::DatabasePort => "Database port",
        Field::DatabaseUsername => "Database user",
        Field::DatabasePassword => "Database password",
        Field::DatabaseName => "Database name",
        Field::WebServerHost => "Web server host",
        Field::WebServerPort => "Web server port",
        Field::EmailAddress => "Email address",
        Field::PhoneCountryCode => "Phone country code",
        Field::PhoneNumber => "Phone number",
        Field::Username => "Username",
        Field::Password => "Password",
        Field::ConfirmPassword => "Confirm password",
        Field::FirstName => "First name",
        Field::LastName => "Last name",
        Field::GenderCode => "Gender",
        Field::DateOfBirth => "Date of birth (YYYY-MM-DD)",
    }
}
