use tracing::{debug, info, warn};

use crate::error::{ApiError, ValidationErrors, WizardError};
use crate::services::{DatabaseSettings, Failure, SetupApi, SetupRequest, SubmitResponse};
use crate::strings::Translations;
use crate::wizard::{
    DatabaseTestStatus, Field, InstallStatus, SetupConfiguration, StepGate, Transition,
    WizardLookups, WizardProgress, WizardStep,
};

/// Snapshot of one connectivity probe in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseProbe {
    generation: u64,
    pub request: DatabaseSettings,
}

/// State of one guided-setup session.
///
/// Step and percentage change only through one private `apply` transition. The
/// draft is mutated only through [`WizardController::set_field`] and the
/// lookup-driven defaults; navigation never clears it.
#[derive(Debug)]
pub struct WizardController {
    progress: WizardProgress,
    history: Vec<(WizardStep, u8)>,
    config: SetupConfiguration,
    database_test: DatabaseTestStatus,
    probe_generation: u64,
    validation: Option<ValidationErrors>,
    failures: Vec<Failure>,
    license_text: Option<String>,
    translations: Translations,
    lookups: WizardLookups,
}

impl WizardController {
    pub fn new(config: SetupConfiguration) -> Self {
        let translations = Translations::empty(config.language_code.clone());
        Self {
            progress: WizardProgress::default(),
            history: Vec::new(),
            config,
            database_test: DatabaseTestStatus::Idle,
            probe_generation: 0,
            validation: None,
            failures: Vec::new(),
            license_text: None,
            translations,
            lookups: WizardLookups::default(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn progress(&self) -> WizardProgress {
        self.progress
    }

    pub fn step(&self) -> WizardStep {
        self.progress.step
    }

    pub fn percentage(&self) -> u8 {
        self.progress.percentage
    }

    pub fn install_status(&self) -> InstallStatus {
        self.progress.install_status
    }

    pub fn config(&self) -> &SetupConfiguration {
        &self.config
    }

    pub fn database_test_status(&self) -> DatabaseTestStatus {
        self.database_test
    }

    /// Errors from the last rejected submit of the active step, if any.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        self.validation.as_ref()
    }

    /// Failures reported by the last submission attempt.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn license_text(&self) -> Option<&str> {
        self.license_text.as_deref()
    }

    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    pub fn lookups(&self) -> &WizardLookups {
        &self.lookups
    }

    // ── Draft ───────────────────────────────────────────────────────────────

    /// Apply one input change. Editing a database field invalidates any
    /// connectivity result obtained for the previous values.
    pub fn set_field(&mut self, field: Field, value: &str) {
        if field.is_database()
            && self.config.get(field) != value
            && self.database_test != DatabaseTestStatus::Idle
        {
            debug!(field = %field, "database field changed, resetting connection test");
            self.reset_database_test();
        }
        self.config.set(field, value);
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    /// The only place step and percentage are mutated. Callers go through
    /// `go_to_step`, `advance` and `back`, which enforce the step gate.
    fn apply(&mut self, transition: Transition) -> Result<WizardProgress, WizardError> {
        let from = self.progress.step;
        match transition {
            Transition::Forward { to, percentage } => {
                if from.next() != Some(to) {
                    return Err(WizardError::InvalidTransition { from, to });
                }
                let target = percentage.unwrap_or(to.default_percentage()).min(100);
                self.history.push((from, self.progress.percentage));
                self.progress.step = to;
                self.progress.percentage = target.max(self.progress.percentage);
            }
            Transition::Back => {
                let Some((to, percentage)) = self.history.pop() else {
                    return Err(WizardError::NotAllowed(format!(
                        "no step before {from}"
                    )));
                };
                self.progress.step = to;
                self.progress.percentage = percentage;
            }
        }

        if from == WizardStep::Database && self.database_test == DatabaseTestStatus::Working {
            self.reset_database_test();
        }
        self.validation = None;
        info!(
            from = %from,
            to = %self.progress.step,
            percentage = self.progress.percentage,
            "wizard step changed"
        );
        Ok(self.progress)
    }

    /// Whether the forward control of the active step is enabled.
    pub fn can_advance(&self) -> bool {
        self.progress.install_status == InstallStatus::Gathering
            && self.progress.step.next().is_some()
            && (self.progress.step != WizardStep::Database || self.database_test.succeeded())
    }

    /// Submit the active step's form and move to `next` when it validates.
    pub fn go_to_step(
        &mut self,
        next: WizardStep,
        percentage: Option<u8>,
    ) -> Result<WizardProgress, WizardError> {
        let from = self.progress.step;
        match self.progress.install_status {
            InstallStatus::Gathering => {}
            InstallStatus::Installing => {
                return Err(WizardError::NotAllowed("installation in progress".into()))
            }
            InstallStatus::Complete => {
                return Err(WizardError::NotAllowed("installation is complete".into()))
            }
        }
        if from.next() != Some(next) {
            return Err(WizardError::InvalidTransition { from, to: next });
        }

        if let Err(errors) = StepGate::validate(from, &self.config) {
            debug!(step = %from, "step validation failed: {errors}");
            self.validation = Some(errors.clone());
            return Err(WizardError::Validation(errors));
        }
        if from == WizardStep::Database && !self.database_test.succeeded() {
            return Err(WizardError::NotAllowed(
                "database connection has not been verified".into(),
            ));
        }

        self.apply(Transition::Forward {
            to: next,
            percentage,
        })
    }

    /// `go_to_step` towards the following step with its default percentage.
    pub fn advance(&mut self) -> Result<WizardProgress, WizardError> {
        let from = self.progress.step;
        let next = from
            .next()
            .ok_or_else(|| WizardError::NotAllowed(format!("{from} is the last step")))?;
        self.go_to_step(next, None)
    }

    /// Back navigation is never gated by validation, but is closed once an
    /// installation has started.
    pub fn back(&mut self) -> Result<WizardProgress, WizardError> {
        match self.progress.install_status {
            InstallStatus::Gathering => {}
            InstallStatus::Installing => {
                return Err(WizardError::NotAllowed("installation in progress".into()))
            }
            InstallStatus::Complete => {
                return Err(WizardError::NotAllowed("installation is complete".into()))
            }
        }
        self.apply(Transition::Back)
    }

    // ── Side effects ────────────────────────────────────────────────────────

    pub async fn load_lookups(&mut self, api: &dyn SetupApi) {
        self.lookups = WizardLookups::load(api).await;
    }

    /// Fill empty database fields from the server defaults; failures are logged.
    pub async fn load_database_defaults(&mut self, api: &dyn SetupApi) {
        match api.database_settings().await {
            Ok(defaults) => self.apply_database_defaults(&defaults),
            Err(e) => warn!("failed to load database defaults: {e}"),
        }
    }

    /// Fill empty database fields. Any field that changes invalidates a
    /// connectivity result, as with [`WizardController::set_field`].
    pub fn apply_database_defaults(&mut self, defaults: &DatabaseSettings) {
        let before = self.config.database_settings();
        self.config.apply_database_defaults(defaults);
        if self.config.database_settings() != before
            && self.database_test != DatabaseTestStatus::Idle
        {
            debug!("database defaults changed the draft, resetting connection test");
            self.reset_database_test();
        }
    }

    /// Select a language and refresh the license text and translations for it.
    ///
    /// The selection stands even when either fetch fails; the previously
    /// loaded text stays in place.
    pub async fn select_language(&mut self, api: &dyn SetupApi, language_code: &str) {
        self.config.set(Field::LanguageCode, language_code);
        info!(language = language_code, "language selected");

        match api.license(language_code).await {
            Ok(text) => self.license_text = Some(text),
            Err(e) => warn!(language = language_code, "failed to load license text: {e}"),
        }
        match api.translations(language_code).await {
            Ok(translations) => self.translations = translations,
            Err(e) => warn!(language = language_code, "failed to load translations: {e}"),
        }
    }

    /// Enter `Working` and snapshot the database fields to probe.
    pub fn begin_database_test(&mut self) -> Result<DatabaseProbe, WizardError> {
        if self.progress.step != WizardStep::Database {
            return Err(WizardError::NotAllowed(format!(
                "database test is not available on {}",
                self.progress.step
            )));
        }
        if self.database_test == DatabaseTestStatus::Working {
            return Err(WizardError::NotAllowed(
                "database test already running".into(),
            ));
        }
        self.probe_generation += 1;
        self.database_test = DatabaseTestStatus::Working;
        Ok(DatabaseProbe {
            generation: self.probe_generation,
            request: self.config.database_settings(),
        })
    }

    /// Apply a probe result. A result is discarded when the session has left
    /// the database step or the database fields changed since the probe began.
    pub fn finish_database_test(
        &mut self,
        probe: DatabaseProbe,
        result: Result<bool, ApiError>,
    ) -> DatabaseTestStatus {
        if probe.generation != self.probe_generation
            || self.progress.step != WizardStep::Database
            || self.config.database_settings() != probe.request
        {
            debug!(
                generation = probe.generation,
                "discarding stale database test result"
            );
            return self.database_test;
        }

        let success = match result {
            Ok(success) => success,
            Err(e) => {
                warn!("database test failed: {e}");
                false
            }
        };
        info!(success, host = %probe.request.database_host, "database test complete");
        self.database_test = DatabaseTestStatus::Complete { success };
        self.database_test
    }

    /// Run the connectivity probe against the current database fields.
    pub async fn test_database(
        &mut self,
        api: &dyn SetupApi,
    ) -> Result<DatabaseTestStatus, WizardError> {
        let probe = self.begin_database_test()?;
        let result = api.test_database(&probe.request).await;
        Ok(self.finish_database_test(probe, result))
    }

    fn reset_database_test(&mut self) {
        self.probe_generation += 1;
        self.database_test = DatabaseTestStatus::Idle;
    }

    // ── Submission ──────────────────────────────────────────────────────────

    /// Send the whole draft as one setup request.
    ///
    /// Success moves to `Complete`. A failure list or a transport error moves
    /// back to `Gathering` with the draft untouched. A failure list replaces
    /// the stored one; a transport error leaves the stored list untouched.
    pub async fn submit(&mut self, api: &dyn SetupApi) -> Result<SubmitResponse, WizardError> {
        if self.progress.step != WizardStep::Summary {
            return Err(WizardError::NotAllowed(format!(
                "cannot install from {}",
                self.progress.step
            )));
        }
        if self.progress.install_status != InstallStatus::Gathering {
            return Err(WizardError::NotAllowed("installation already started".into()));
        }

        self.progress.install_status = InstallStatus::Installing;
        info!("submitting setup request");
        let request = SetupRequest::from(&self.config);

        match api.submit(&request).await {
            Ok(response) if response.is_success() => {
                self.failures.clear();
                self.progress.install_status = InstallStatus::Complete;
                info!("setup complete");
                Ok(response)
            }
            Ok(response) => {
                warn!(count = response.failures.len(), "setup rejected");
                self.failures = response.failures.clone();
                self.progress.install_status = InstallStatus::Gathering;
                Err(WizardError::ServerValidation(response.failures))
            }
            Err(e) => {
                warn!("setup request failed: {e}");
                self.progress.install_status = InstallStatus::Gathering;
                Err(WizardError::Api(e))
            }
        }
    }
}
