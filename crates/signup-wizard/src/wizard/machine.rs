use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{DraftChange, DraftRecord, Field, WizardStep};
use super::validation::rules::{photo_violations, USERNAME_TAKEN};
use super::validation::{
    validate_step, ErrorSet, PasswordStrength, UsernameAvailability, ValidationContext,
};
use super::WizardError;
use crate::clients::{SubmissionError, SubmissionPayload, SubmissionReceipt};

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Transition {
    Moved { from: WizardStep, to: WizardStep },
    /// Validation left errors on the active step.
    Blocked,
    /// Already at the first step.
    Stayed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Completed(SubmissionReceipt),
    Failed(String),
}

/// The step machine. Owns the draft and the error set of the active step.
#[derive(Debug, Clone, Default)]
pub struct RegistrationWizard {
    step: WizardStep,
    draft: DraftRecord,
    errors: ErrorSet,
    availability: UsernameAvailability,
    submission: SubmissionState,
}

impl RegistrationWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &DraftRecord {
        &self.draft
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    pub fn availability(&self) -> UsernameAvailability {
        self.availability
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn is_locked(&self) -> bool {
        matches!(
            self.submission,
            SubmissionState::InFlight | SubmissionState::Completed(_)
        )
    }

    pub fn password_strength(&self) -> PasswordStrength {
        PasswordStrength::of(self.draft.new_password.as_deref().unwrap_or_default())
    }

    /// Merge a batch of edits into the draft. Every change must target a field
    /// owned by the active step; otherwise nothing is applied.
    pub fn update_draft<I>(&mut self, changes: I) -> Result<(), WizardError>
    where
        I: IntoIterator<Item = DraftChange>,
    {
        self.ensure_unlocked()?;
        let changes: Vec<DraftChange> = changes.into_iter().collect();
        if let Some(change) = changes.iter().find(|c| c.field().step() != self.step) {
            return Err(WizardError::FieldNotOnStep {
                field: change.field(),
                step: self.step,
            });
        }

        for change in changes {
            let field = change.field();
            self.errors.clear_field(field);

            if let DraftChange::ProfilePhoto(Some(photo)) = &change {
                let violations = photo_violations(Some(photo), true);
                if !violations.is_empty() {
                    debug!(file_name = %photo.file_name, "rejected profile photo");
                    self.errors.record(Field::ProfilePhoto, violations);
                    continue;
                }
            }

            let changed = self.draft.apply(change);
            if !changed {
                continue;
            }
            match field {
                Field::Username => self.availability = UsernameAvailability::Unknown,
                Field::Profession => self.errors.clear_field(Field::CompanyName),
                Field::Country => {
                    self.errors.clear_field(Field::State);
                    self.errors.clear_field(Field::City);
                }
                Field::State => self.errors.clear_field(Field::City),
                _ => {}
            }
        }
        Ok(())
    }

    /// Advance using today's local date for the age rule.
    pub fn advance(&mut self) -> Result<Transition, WizardError> {
        self.advance_as_of(Local::now().date_naive())
    }

    pub fn advance_as_of(&mut self, today: NaiveDate) -> Result<Transition, WizardError> {
        self.ensure_unlocked()?;
        let from = self.step;
        let to = from.next().ok_or(WizardError::AtFinalStep)?;

        let errors = validate_step(from, &self.draft, &self.context(today));
        if !errors.is_empty() {
            debug!(step = ?from, errors = errors.len(), "advance blocked");
            self.errors = errors;
            return Ok(Transition::Blocked);
        }

        if from == WizardStep::Identity {
            self.draft.fill_professional_defaults();
        }
        self.errors.clear();
        self.step = to;
        debug!(?from, ?to, "wizard advanced");
        Ok(Transition::Moved { from, to })
    }

    /// Step back without validating. Errors of the step being left are dropped.
    pub fn retreat(&mut self) -> Result<Transition, WizardError> {
        self.ensure_unlocked()?;
        self.errors.clear();
        match self.step.previous() {
            Some(to) => {
                let from = std::mem::replace(&mut self.step, to);
                debug!(?from, ?to, "wizard retreated");
                Ok(Transition::Moved { from, to })
            }
            None => Ok(Transition::Stayed),
        }
    }

    /// Apply an availability answer for `username`. Ignored once the user has
    /// left the identity step or typed something else.
    pub fn record_availability(
        &mut self,
        username: &str,
        availability: UsernameAvailability,
    ) -> bool {
        if self.step != WizardStep::Identity || self.draft.username != username {
            return false;
        }

        self.availability = availability;
        match availability {
            UsernameAvailability::Taken => {
                self.errors.clear_field(Field::Username);
                self.errors
                    .record(Field::Username, vec![USERNAME_TAKEN.to_string()]);
            }
            UsernameAvailability::Available
                if self.errors.get(Field::Username) == Some(USERNAME_TAKEN) =>
            {
                self.errors.clear_field(Field::Username);
            }
            _ => {}
        }
        true
    }

    /// Re-check every step and lock navigation. If a step no longer passes, the
    /// wizard returns to it with its errors shown.
    pub fn begin_submission(&mut self, today: NaiveDate) -> Result<SubmissionPayload, WizardError> {
        self.ensure_unlocked()?;
        if self.step != WizardStep::Review {
            return Err(WizardError::NotAtReview(self.step));
        }

        let ctx = self.context(today);
        for step in WizardStep::ordered() {
            let errors = validate_step(step, &self.draft, &ctx);
            if !errors.is_empty() {
                warn!(?step, errors = errors.len(), "submission blocked by stale step");
                self.step = step;
                self.errors = errors;
                return Err(WizardError::Incomplete(step));
            }
        }

        self.submission = SubmissionState::InFlight;
        info!(username = %self.draft.username, "submission started");
        Ok(SubmissionPayload::from_draft(&self.draft))
    }

    /// Settle the in-flight submission. Success discards the draft; failure
    /// keeps it and unlocks navigation.
    pub fn finish_submission(
        &mut self,
        outcome: Result<SubmissionReceipt, SubmissionError>,
    ) -> &SubmissionState {
        if self.submission != SubmissionState::InFlight {
            warn!("submission result arrived with nothing in flight");
            return &self.submission;
        }

        self.submission = match outcome {
            Ok(receipt) => {
                info!(user_id = %receipt.id, "submission completed");
                self.draft = DraftRecord::default();
                self.errors.clear();
                self.availability = UsernameAvailability::Unknown;
                SubmissionState::Completed(receipt)
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                if err == SubmissionError::UsernameTaken {
                    self.availability = UsernameAvailability::Taken;
                }
                SubmissionState::Failed(err.to_string())
            }
        };
        &self.submission
    }

    /// Drop location choices that depend on `field` once fresh options arrive.
    /// Only the preferences step may lose its own selections this way.
    pub(crate) fn clear_location_below(&mut self, field: Field) {
        if self.step == WizardStep::Preferences && !self.is_locked() {
            self.draft.clear_below(field);
        }
    }

    fn context(&self, today: NaiveDate) -> ValidationContext {
        ValidationContext::new(today, self.availability)
    }

    fn ensure_unlocked(&self) -> Result<(), WizardError> {
        if self.is_locked() {
            Err(WizardError::Locked)
        } else {
            Ok(())
        }
    }
}
