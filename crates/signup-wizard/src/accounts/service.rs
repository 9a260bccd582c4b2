use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{UserId, UserRecord};
use super::repository::{PhotoStore, PhotoStoreError, RepositoryError, UserRepository};
use crate::clients::SubmissionPayload;
use crate::wizard::domain::Field;
use crate::wizard::validation::rules::{photo_violations, sanitize_input, username_violations};

/// Accepts finished drafts and owns the account store.
pub struct RegistrationService<R, P> {
    repository: Arc<R>,
    photos: Arc<P>,
}

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    let id = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("usr-{id:06}"))
}

impl<R, P> RegistrationService<R, P>
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    pub fn new(repository: Arc<R>, photos: Arc<P>) -> Self {
        Self { repository, photos }
    }

    /// Validate, store the photo, then the record. A conflict discovered at
    /// insert time removes the photo again so nothing partial remains.
    pub fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> Result<UserRecord, RegistrationServiceError> {
        reject_first(Field::Username, username_violations(&payload.username))?;
        if let Some(photo) = payload.profile_photo.as_ref() {
            reject_first(Field::ProfilePhoto, photo_violations(Some(photo), false))?;
        }

        if self.repository.username_exists(&payload.username)? {
            return Err(RepositoryError::Conflict.into());
        }

        let created_at = Utc::now();
        let photo_key = match payload.profile_photo.as_ref() {
            Some(photo) => Some(self.photos.put(
                &photo.file_name,
                &photo.content_type,
                &photo.bytes,
            )?),
            None => None,
        };

        let clean = |value: Option<String>| value.map(|text| sanitize_input(&text));
        let record = UserRecord {
            id: next_user_id(),
            username: payload.username,
            profile_photo: photo_key.clone(),
            gender: payload.gender,
            custom_gender: clean(payload.custom_gender),
            dob: payload.dob,
            profession: payload.profession,
            company_name: clean(payload.company_name),
            address1: clean(payload.address1),
            country: clean(payload.country),
            state: clean(payload.state),
            city: clean(payload.city),
            subscription: payload.subscription,
            newsletter: payload.newsletter,
            created_at,
        };

        match self.repository.insert(record) {
            Ok(stored) => {
                info!(user_id = %stored.id, username = %stored.username, "account registered");
                Ok(stored)
            }
            Err(err) => {
                if let Some(key) = photo_key {
                    if let Err(cleanup) = self.photos.remove(&key) {
                        warn!(%key, error = %cleanup, "failed to remove orphaned photo");
                    }
                }
                Err(err.into())
            }
        }
    }

    /// `true` when the username is free.
    pub fn check_username(&self, username: &str) -> Result<bool, RegistrationServiceError> {
        Ok(!self.repository.username_exists(username)?)
    }

    pub fn users(&self) -> Result<Vec<UserRecord>, RegistrationServiceError> {
        Ok(self.repository.all()?)
    }
}

fn reject_first(field: Field, violations: Vec<String>) -> Result<(), RegistrationServiceError> {
    match violations.into_iter().next() {
        Some(message) => Err(RegistrationServiceError::Invalid { field, message }),
        None => Ok(()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error("{field}: {message}")]
    Invalid { field: Field, message: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Photo(#[from] PhotoStoreError),
}
