use chrono::{Datelike, NaiveDate};

use super::super::domain::{Gender, Profession, ProfilePhoto, SubscriptionPlan};
use super::password::{contains_digit, contains_special};
use super::UsernameAvailability;

pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;
pub const USERNAME_MIN_LEN: usize = 4;
pub const USERNAME_MAX_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MINIMUM_AGE_YEARS: i32 = 13;

pub const USERNAME_TAKEN: &str = "Username already taken";

/// Whether the declared content type is JPEG or PNG.
pub fn is_supported_photo_type(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .map(|parsed| {
            [mime::IMAGE_JPEG, mime::IMAGE_PNG]
                .iter()
                .any(|allowed| allowed.essence_str() == parsed.essence_str())
        })
        .unwrap_or(false)
}

pub fn photo_violations(photo: Option<&ProfilePhoto>, has_preview: bool) -> Vec<String> {
    let mut errors = Vec::new();
    match photo {
        None if !has_preview => errors.push("Profile photo is required".to_string()),
        None => {}
        Some(photo) => {
            if !is_supported_photo_type(&photo.content_type) {
                errors.push("Only JPG/PNG images allowed".to_string());
            }
            if photo.size() > MAX_PHOTO_BYTES {
                errors.push("File must be less than 2MB".to_string());
            }
        }
    }
    errors
}

/// Shape rules only; availability is a separate, asynchronous concern.
pub fn username_violations(username: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push("Username is required".to_string());
        return errors;
    }

    let length = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&length) {
        errors.push("Must be 4-20 characters".to_string());
    }
    if username.chars().any(char::is_whitespace) {
        errors.push("Cannot contain spaces".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.push("Only letters, numbers and underscores allowed".to_string());
    }
    errors
}

pub fn availability_violations(availability: UsernameAvailability) -> Vec<String> {
    match availability {
        UsernameAvailability::Taken => vec![USERNAME_TAKEN.to_string()],
        _ => Vec::new(),
    }
}

pub fn current_password_violations(current: Option<&str>, new: Option<&str>) -> Vec<String> {
    let changing = new.is_some_and(|value| !value.is_empty());
    let has_current = current.is_some_and(|value| !value.is_empty());
    if changing && !has_current {
        vec!["Current password is required to change password".to_string()]
    } else {
        Vec::new()
    }
}

pub fn new_password_violations(new: Option<&str>) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(password) = new.filter(|value| !value.is_empty()) else {
        return errors;
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("Password must be at least 8 characters".to_string());
    }
    if !contains_special(password) {
        errors.push("Must contain at least one special character".to_string());
    }
    if !contains_digit(password) {
        errors.push("Must contain at least one number".to_string());
    }
    errors
}

pub fn gender_violations(gender: Option<Gender>) -> Vec<String> {
    match gender {
        None => vec!["Gender is required".to_string()],
        Some(_) => Vec::new(),
    }
}

pub fn custom_gender_violations(gender: Option<Gender>, custom_gender: &str) -> Vec<String> {
    if gender == Some(Gender::Other) && custom_gender.trim().is_empty() {
        vec!["Please specify your gender".to_string()]
    } else {
        Vec::new()
    }
}

/// Age is the difference in calendar years; the birthday itself is not
/// consulted.
pub fn dob_violations(dob: Option<NaiveDate>, today: NaiveDate) -> Vec<String> {
    match dob {
        None => vec!["Date of birth is required".to_string()],
        Some(date) if date > today => vec!["Cannot be a future date".to_string()],
        Some(date) if today.year() - date.year() < MINIMUM_AGE_YEARS => {
            vec!["Must be at least 13 years old".to_string()]
        }
        Some(_) => Vec::new(),
    }
}

pub fn profession_violations(profession: Option<Profession>) -> Vec<String> {
    match profession {
        None => vec!["Profession is required".to_string()],
        Some(_) => Vec::new(),
    }
}

pub fn company_name_violations(
    profession: Option<Profession>,
    company_name: Option<&str>,
) -> Vec<String> {
    let missing = company_name.map_or(true, |name| name.trim().is_empty());
    if profession == Some(Profession::Entrepreneur) && missing {
        vec!["Company Name is required for Entrepreneurs".to_string()]
    } else {
        Vec::new()
    }
}

pub fn address_violations(address1: Option<&str>) -> Vec<String> {
    required(address1.unwrap_or_default(), "Address is required")
}

pub fn country_violations(country: &str) -> Vec<String> {
    required(country, "Country is required")
}

pub fn state_violations(state: &str) -> Vec<String> {
    required(state, "State is required")
}

pub fn city_violations(city: &str) -> Vec<String> {
    required(city, "City is required")
}

pub fn subscription_violations(plan: Option<SubscriptionPlan>) -> Vec<String> {
    match plan {
        None => vec!["Subscription plan is required".to_string()],
        Some(_) => Vec::new(),
    }
}

/// Standalone `local@domain.tld` shape check: one `@`, no whitespace, a dot
/// inside the domain. The wizard collects no email, so no step calls this; it
/// is offered alongside the field rules for forms that do.
pub fn email_violations(email: &str) -> Vec<String> {
    if email.is_empty() {
        return vec!["Email is required".to_string()];
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            let last = domain.len().saturating_sub(1);
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .char_indices()
                    .any(|(index, c)| c == '.' && index > 0 && index < last)
        }
        None => false,
    };

    if valid {
        Vec::new()
    } else {
        vec!["Invalid email format".to_string()]
    }
}

/// Trim and escape angle brackets so free text can be echoed into markup.
pub fn sanitize_input(input: &str) -> String {
    input.trim().replace('<', "&lt;").replace('>', "&gt;")
}

fn required(value: &str, message: &str) -> Vec<String> {
    if value.trim().is_empty() {
        vec![message.to_string()]
    } else {
        Vec::new()
    }
}
