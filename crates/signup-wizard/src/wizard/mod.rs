//! Multi-step registration wizard: the draft, per-step validation, the step
//! machine and the async session that drives lookups and submission.

pub mod debounce;
pub mod domain;
pub mod machine;
pub mod session;
pub mod validation;

#[cfg(test)]
mod tests;

use crate::clients::SubmissionError;

pub use debounce::{Debouncer, RequestGate, Ticket};
pub use domain::{
    DraftChange, DraftRecord, Field, Gender, Profession, ProfilePhoto, SubscriptionPlan,
    UnknownOption, WizardStep,
};
pub use machine::{RegistrationWizard, SubmissionState, Transition};
pub use session::{EventOutcome, LocationOptions, SessionEvent, WizardSession};
pub use validation::{
    validate_step, ErrorSet, PasswordStrength, UsernameAvailability, ValidationContext,
};

/// Requests the wizard refuses. Validation problems are not errors; they land
/// in the active step's [`ErrorSet`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("already at the final step")]
    AtFinalStep,
    #[error("{field} cannot be edited on the {} step", .step.label())]
    FieldNotOnStep { field: Field, step: WizardStep },
    #[error("the wizard is locked while a submission is pending or complete")]
    Locked,
    #[error("submission is only possible from the summary step, not {}", .0.label())]
    NotAtReview(WizardStep),
    #[error("the {} step has unresolved errors", .0.label())]
    Incomplete(WizardStep),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
