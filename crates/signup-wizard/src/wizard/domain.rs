use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One screen of the wizard. Each step owns a fixed subset of draft fields.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Identity,
    Professional,
    Preferences,
    Review,
}

impl WizardStep {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Identity,
            Self::Professional,
            Self::Preferences,
            Self::Review,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::Professional => "Professional Details",
            Self::Preferences => "Preferences",
            Self::Review => "Summary",
        }
    }

    /// 1-based position shown to the user ("Step 2 of 4").
    pub const fn number(self) -> u8 {
        match self {
            Self::Identity => 1,
            Self::Professional => 2,
            Self::Preferences => 3,
            Self::Review => 4,
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Identity => Some(Self::Professional),
            Self::Professional => Some(Self::Preferences),
            Self::Preferences => Some(Self::Review),
            Self::Review => None,
        }
    }

    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Identity => None,
            Self::Professional => Some(Self::Identity),
            Self::Preferences => Some(Self::Professional),
            Self::Review => Some(Self::Preferences),
        }
    }

    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::Identity => &[
                Field::ProfilePhoto,
                Field::Username,
                Field::CurrentPassword,
                Field::NewPassword,
                Field::Gender,
                Field::CustomGender,
                Field::Dob,
            ],
            Self::Professional => &[Field::Profession, Field::CompanyName, Field::Address1],
            Self::Preferences => &[
                Field::Country,
                Field::State,
                Field::City,
                Field::Subscription,
                Field::Newsletter,
            ],
            Self::Review => &[],
        }
    }
}

/// Draft field identifiers. Serialized names match the form field names used
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    ProfilePhoto,
    Username,
    CurrentPassword,
    NewPassword,
    Gender,
    CustomGender,
    Dob,
    Profession,
    CompanyName,
    Address1,
    Country,
    State,
    City,
    Subscription,
    Newsletter,
}

impl Field {
    pub const fn name(self) -> &'static str {
        match self {
            Self::ProfilePhoto => "profilePhoto",
            Self::Username => "username",
            Self::CurrentPassword => "currentPassword",
            Self::NewPassword => "newPassword",
            Self::Gender => "gender",
            Self::CustomGender => "customGender",
            Self::Dob => "dob",
            Self::Profession => "profession",
            Self::CompanyName => "companyName",
            Self::Address1 => "address1",
            Self::Country => "country",
            Self::State => "state",
            Self::City => "city",
            Self::Subscription => "subscription",
            Self::Newsletter => "newsletter",
        }
    }

    pub fn step(self) -> WizardStep {
        WizardStep::ordered()
            .into_iter()
            .find(|step| step.fields().contains(&self))
            .unwrap_or(WizardStep::Review)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when free text does not name one of the fixed options of a field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {field}")]
pub struct UnknownOption {
    pub field: Field,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(UnknownOption {
                field: Field::Gender,
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profession {
    Student,
    Developer,
    Entrepreneur,
}

impl Profession {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Developer => "Developer",
            Self::Entrepreneur => "Entrepreneur",
        }
    }
}

impl FromStr for Profession {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "developer" => Ok(Self::Developer),
            "entrepreneur" => Ok(Self::Entrepreneur),
            _ => Err(UnknownOption {
                field: Field::Profession,
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionPlan {
    Basic,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    pub const fn ordered() -> [Self; 3] {
        [Self::Basic, Self::Pro, Self::Enterprise]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Pro => "Pro",
            Self::Enterprise => "Enterprise",
        }
    }
}

impl FromStr for SubscriptionPlan {
    type Err = UnknownOption;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(UnknownOption {
                field: Field::Subscription,
                value: value.to_string(),
            }),
        }
    }
}

/// Uploaded profile image as picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ProfilePhoto {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ProfilePhoto {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Inline `data:` URI used for on-screen previews.
    pub fn preview_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

impl fmt::Debug for ProfilePhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilePhoto")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// The in-progress aggregate the wizard builds up screen by screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRecord {
    pub profile_photo: Option<ProfilePhoto>,
    pub profile_photo_preview: Option<String>,
    pub username: String,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub gender: Option<Gender>,
    pub custom_gender: String,
    pub dob: Option<NaiveDate>,
    pub profession: Option<Profession>,
    pub company_name: Option<String>,
    pub address1: Option<String>,
    pub country: String,
    pub state: String,
    pub city: String,
    pub subscription: Option<SubscriptionPlan>,
    pub newsletter: bool,
}

impl Default for DraftRecord {
    fn default() -> Self {
        Self {
            profile_photo: None,
            profile_photo_preview: None,
            username: String::new(),
            current_password: None,
            new_password: None,
            gender: None,
            custom_gender: String::new(),
            dob: None,
            profession: None,
            company_name: None,
            address1: None,
            country: String::new(),
            state: String::new(),
            city: String::new(),
            subscription: None,
            newsletter: true,
        }
    }
}

impl DraftRecord {
    /// Apply a single change, cascading resets down the location chain and
    /// away from the Entrepreneur-only company field. Returns whether the
    /// stored value actually changed.
    pub(crate) fn apply(&mut self, change: DraftChange) -> bool {
        match change {
            DraftChange::ProfilePhoto(photo) => {
                let preview = photo.as_ref().map(ProfilePhoto::preview_data_uri);
                let changed = self.profile_photo != photo;
                self.profile_photo = photo;
                self.profile_photo_preview = preview;
                changed
            }
            DraftChange::Username(value) => replace(&mut self.username, value),
            DraftChange::CurrentPassword(value) => {
                replace(&mut self.current_password, non_empty(value))
            }
            DraftChange::NewPassword(value) => replace(&mut self.new_password, non_empty(value)),
            DraftChange::Gender(value) => replace(&mut self.gender, value),
            DraftChange::CustomGender(value) => replace(&mut self.custom_gender, value),
            DraftChange::Dob(value) => replace(&mut self.dob, value),
            DraftChange::Profession(value) => {
                let changed = replace(&mut self.profession, value);
                if changed && value != Some(Profession::Entrepreneur) {
                    self.company_name = Some(String::new());
                }
                changed
            }
            DraftChange::CompanyName(value) => replace(&mut self.company_name, Some(value)),
            DraftChange::Address1(value) => replace(&mut self.address1, Some(value)),
            DraftChange::Country(value) => {
                let changed = replace(&mut self.country, value);
                if changed {
                    self.clear_below(Field::Country);
                }
                changed
            }
            DraftChange::State(value) => {
                let changed = replace(&mut self.state, value);
                if changed {
                    self.clear_below(Field::State);
                }
                changed
            }
            DraftChange::City(value) => replace(&mut self.city, value),
            DraftChange::Subscription(value) => replace(&mut self.subscription, value),
            DraftChange::Newsletter(value) => replace(&mut self.newsletter, value),
        }
    }

    /// Empty every location field that depends on `field`.
    pub(crate) fn clear_below(&mut self, field: Field) {
        match field {
            Field::Country => {
                self.state.clear();
                self.city.clear();
            }
            Field::State => self.city.clear(),
            _ => {}
        }
    }

    /// Default-fill policy applied when the identity step is completed, so the
    /// professional step never starts from unset values.
    pub(crate) fn fill_professional_defaults(&mut self) {
        if self.profession.is_none() {
            self.profession = Some(Profession::Student);
        }
        if self.company_name.is_none() {
            self.company_name = Some(String::new());
        }
        if self.address1.is_none() {
            self.address1 = Some(String::new());
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

/// A single field edit requested by the active step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftChange {
    ProfilePhoto(Option<ProfilePhoto>),
    Username(String),
    CurrentPassword(Option<String>),
    NewPassword(Option<String>),
    Gender(Option<Gender>),
    CustomGender(String),
    Dob(Option<NaiveDate>),
    Profession(Option<Profession>),
    CompanyName(String),
    Address1(String),
    Country(String),
    State(String),
    City(String),
    Subscription(Option<SubscriptionPlan>),
    Newsletter(bool),
}

impl DraftChange {
    pub fn field(&self) -> Field {
        match self {
            Self::ProfilePhoto(_) => Field::ProfilePhoto,
            Self::Username(_) => Field::Username,
            Self::CurrentPassword(_) => Field::CurrentPassword,
            Self::NewPassword(_) => Field::NewPassword,
            Self::Gender(_) => Field::Gender,
            Self::CustomGender(_) => Field::CustomGender,
            Self::Dob(_) => Field::Dob,
            Self::Profession(_) => Field::Profession,
            Self::CompanyName(_) => Field::CompanyName,
            Self::Address1(_) => Field::Address1,
            Self::Country(_) => Field::Country,
            Self::State(_) => Field::State,
            Self::City(_) => Field::City,
            Self::Subscription(_) => Field::Subscription,
            Self::Newsletter(_) => Field::Newsletter,
        }
    }
}
