//! Guided-setup state: steps, the draft, per-step validation, lookups and
//! the controller tying them together.

pub mod controller;
pub mod draft;
pub mod gate;
pub mod lookups;
pub mod step;

pub use controller::{DatabaseProbe, WizardController};
pub use draft::{Field, SetupConfiguration};
pub use gate::{FieldRule, Pattern, StepGate};
pub use lookups::WizardLookups;
pub use step::{DatabaseTestStatus, InstallStatus, Transition, WizardProgress, WizardStep};
