use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::wizard::domain::{
    DraftRecord, Field, Gender, Profession, ProfilePhoto, SubscriptionPlan, UnknownOption,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Everything a finished draft sends to the registration service. Empty text
/// fields are omitted and the inline preview never leaves the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub username: String,
    pub profile_photo: Option<ProfilePhoto>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub gender: Option<Gender>,
    pub custom_gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub profession: Option<Profession>,
    pub company_name: Option<String>,
    pub address1: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub subscription: Option<SubscriptionPlan>,
    pub newsletter: bool,
}

impl SubmissionPayload {
    pub fn from_draft(draft: &DraftRecord) -> Self {
        Self {
            username: draft.username.clone(),
            profile_photo: draft.profile_photo.clone(),
            current_password: present(draft.current_password.as_deref()),
            new_password: present(draft.new_password.as_deref()),
            gender: draft.gender,
            custom_gender: present(Some(&draft.custom_gender)),
            dob: draft.dob,
            profession: draft.profession,
            company_name: present(draft.company_name.as_deref()),
            address1: present(draft.address1.as_deref()),
            country: present(Some(&draft.country)),
            state: present(Some(&draft.state)),
            city: present(Some(&draft.city)),
            subscription: draft.subscription,
            newsletter: draft.newsletter,
        }
    }

    /// Text parts of the multipart form, keyed by wire field name.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![(Field::Username.name(), self.username.clone())];
        let mut push = |field: Field, value: Option<String>| {
            if let Some(value) = value {
                fields.push((field.name(), value));
            }
        };

        push(Field::CurrentPassword, self.current_password.clone());
        push(Field::NewPassword, self.new_password.clone());
        push(Field::Gender, self.gender.map(|g| g.label().to_string()));
        push(Field::CustomGender, self.custom_gender.clone());
        push(
            Field::Dob,
            self.dob.map(|date| date.format(DATE_FORMAT).to_string()),
        );
        push(
            Field::Profession,
            self.profession.map(|p| p.label().to_string()),
        );
        push(Field::CompanyName, self.company_name.clone());
        push(Field::Address1, self.address1.clone());
        push(Field::Country, self.country.clone());
        push(Field::State, self.state.clone());
        push(Field::City, self.city.clone());
        push(
            Field::Subscription,
            self.subscription.map(|s| s.label().to_string()),
        );
        push(Field::Newsletter, Some(self.newsletter.to_string()));
        fields
    }

    /// Rebuild a payload from decoded form parts. Unknown part names are
    /// ignored; option fields must name a known option.
    pub fn from_form(
        mut fields: BTreeMap<String, String>,
        profile_photo: Option<ProfilePhoto>,
    ) -> Result<Self, UnknownOption> {
        let mut take = |field: Field| {
            fields
                .remove(field.name())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let username = take(Field::Username).unwrap_or_default();
        let current_password = take(Field::CurrentPassword);
        let new_password = take(Field::NewPassword);
        let gender = take(Field::Gender).map(|v| v.parse()).transpose()?;
        let custom_gender = take(Field::CustomGender);
        let dob = take(Field::Dob)
            .map(|value| {
                NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| UnknownOption {
                    field: Field::Dob,
                    value,
                })
            })
            .transpose()?;
        let profession = take(Field::Profession).map(|v| v.parse()).transpose()?;
        let company_name = take(Field::CompanyName);
        let address1 = take(Field::Address1);
        let country = take(Field::Country);
        let state = take(Field::State);
        let city = take(Field::City);
        let subscription = take(Field::Subscription)
            .map(|v| v.parse())
            .transpose()?;
        let newsletter = take(Field::Newsletter)
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "true" | "on" | "1"))
            .unwrap_or(false);

        Ok(Self {
            username,
            profile_photo,
            current_password,
            new_password,
            gender,
            custom_gender,
            dob,
            profession,
            company_name,
            address1,
            country,
            state,
            city,
            subscription,
            newsletter,
        })
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Identifier pair the service hands back for a stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id: String,
    pub username: String,
}

/// Persists a finished draft.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(&self, payload: SubmissionPayload)
        -> Result<SubmissionReceipt, SubmissionError>;
}

/// A single user-visible reason the submission did not go through. The draft
/// stays intact so the user can fix it and retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Username already taken")]
    UsernameTaken,
    #[error("{0}")]
    Rejected(String),
    #[error("could not reach the registration service: {0}")]
    Transport(String),
}
