mod password;
pub mod rules;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{DraftRecord, Field, WizardStep};

pub use password::{strength_score, PasswordStrength, SPECIAL_CHARACTERS};

/// Field-scoped messages for the active step. Empty means the step may be left.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorSet(BTreeMap<Field, String>);

impl ErrorSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// Keeps the first violation reported for a field.
    pub fn record(&mut self, field: Field, violations: Vec<String>) {
        if self.0.contains_key(&field) {
            return;
        }
        if let Some(first) = violations.into_iter().next() {
            self.0.insert(field, first);
        }
    }

    pub(crate) fn clear_field(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

/// Outcome of the asynchronous "is this username free" query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsernameAvailability {
    #[default]
    Unknown,
    Checking,
    Available,
    Taken,
}

/// Inputs to validation that do not live on the draft.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub today: NaiveDate,
    pub availability: UsernameAvailability,
}

impl ValidationContext {
    pub fn new(today: NaiveDate, availability: UsernameAvailability) -> Self {
        Self {
            today,
            availability,
        }
    }
}

/// Runs every rule owned by `step`. The review step owns no rules.
pub fn validate_step(step: WizardStep, draft: &DraftRecord, ctx: &ValidationContext) -> ErrorSet {
    let mut errors = ErrorSet::default();
    match step {
        WizardStep::Identity => {
            errors.record(
                Field::ProfilePhoto,
                rules::photo_violations(
                    draft.profile_photo.as_ref(),
                    draft.profile_photo_preview.is_some(),
                ),
            );
            errors.record(Field::Username, rules::username_violations(&draft.username));
            errors.record(
                Field::Username,
                rules::availability_violations(ctx.availability),
            );
            errors.record(
                Field::CurrentPassword,
                rules::current_password_violations(
                    draft.current_password.as_deref(),
                    draft.new_password.as_deref(),
                ),
            );
            errors.record(
                Field::NewPassword,
                rules::new_password_violations(draft.new_password.as_deref()),
            );
            errors.record(Field::Gender, rules::gender_violations(draft.gender));
            errors.record(
                Field::CustomGender,
                rules::custom_gender_violations(draft.gender, &draft.custom_gender),
            );
            errors.record(Field::Dob, rules::dob_violations(draft.dob, ctx.today));
        }
        WizardStep::Professional => {
            errors.record(
                Field::Profession,
                rules::profession_violations(draft.profession),
            );
            errors.record(
                Field::CompanyName,
                rules::company_name_violations(draft.profession, draft.company_name.as_deref()),
            );
            errors.record(
                Field::Address1,
                rules::address_violations(draft.address1.as_deref()),
            );
        }
        WizardStep::Preferences => {
            errors.record(Field::Country, rules::country_violations(&draft.country));
            errors.record(Field::State, rules::state_violations(&draft.state));
            errors.record(Field::City, rules::city_violations(&draft.city));
            errors.record(
                Field::Subscription,
                rules::subscription_violations(draft.subscription),
            );
        }
        WizardStep::Review => {}
    }
    errors
}
