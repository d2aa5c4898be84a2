//! Content-intake wizard module.
//!
//! A strictly ordered, single-admin dialogue that collects the fields of a
//! new catalog entry one step at a time, validates each field before
//! advancing, and creates the entry atomically on completion.

mod intake;
mod session;
mod steps;

pub use intake::{IntakeWizard, RejectReason, StepOutcome, WizardError, WizardInput};
pub use session::{EntryDraft, SessionStore, WizardSession};
pub use steps::WizardStep;
