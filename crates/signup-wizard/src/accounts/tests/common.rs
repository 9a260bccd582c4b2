use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::accounts::domain::UserRecord;
use crate::accounts::repository::{
    photo_key, PhotoStore, PhotoStoreError, RepositoryError, UserRepository,
};
use crate::accounts::{registration_router, LocationCatalog, RegistrationService};
use crate::clients::SubmissionPayload;
use crate::wizard::domain::{Gender, Profession, ProfilePhoto, SubscriptionPlan};

pub(super) const BOUNDARY: &str = "signup-wizard-test-boundary";

pub(super) fn png_photo(size: usize) -> ProfilePhoto {
    ProfilePhoto::new("portrait.png", "image/png", vec![0x89; size])
}

pub(super) fn payload(username: &str) -> SubmissionPayload {
    SubmissionPayload {
        username: username.to_string(),
        profile_photo: Some(png_photo(16)),
        current_password: Some("old-secret".to_string()),
        new_password: Some("abc!2345".to_string()),
        gender: Some(Gender::Male),
        custom_gender: None,
        dob: NaiveDate::from_ymd_opt(1991, 7, 9),
        profession: Some(Profession::Entrepreneur),
        company_name: Some("  <b>Acme</b> ".to_string()),
        address1: Some("42 Harbour Road".to_string()),
        country: Some("USA".to_string()),
        state: Some("Texas".to_string()),
        city: Some("Houston".to_string()),
        subscription: Some(SubscriptionPlan::Basic),
        newsletter: false,
    }
}

pub(super) type MemoryService = RegistrationService<MemoryUsers, MemoryPhotos>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryUsers>, Arc<MemoryPhotos>) {
    let users = Arc::new(MemoryUsers::default());
    let photos = Arc::new(MemoryPhotos::default());
    let service = RegistrationService::new(users.clone(), photos.clone());
    (service, users, photos)
}

pub(super) fn router_with_service<R, P>(service: RegistrationService<R, P>) -> axum::Router
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    registration_router(Arc::new(service), Arc::new(LocationCatalog::standard()))
}

#[derive(Default)]
pub(super) struct MemoryUsers {
    records: Mutex<Vec<UserRecord>>,
}

impl MemoryUsers {
    pub(super) fn records(&self) -> Vec<UserRecord> {
        self.records.lock().expect("repository mutex poisoned").clone()
    }
}

impl UserRepository for MemoryUsers {
    fn insert(&self, record: UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|stored| stored.username == record.username) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().any(|stored| stored.username == username))
    }

    fn all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        Ok(self.records())
    }
}

#[derive(Default)]
pub(super) struct MemoryPhotos {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryPhotos {
    pub(super) fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .expect("photo mutex poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl PhotoStore for MemoryPhotos {
    fn put(
        &self,
        file_name: &str,
        _content_type: &str,
        bytes: &[u8],
    ) -> Result<String, PhotoStoreError> {
        let key = photo_key(chrono::Utc::now().timestamp_millis(), file_name);
        self.blobs
            .lock()
            .expect("photo mutex poisoned")
            .insert(key.clone(), bytes.to_vec());
        Ok(key)
    }

    fn remove(&self, key: &str) -> Result<(), PhotoStoreError> {
        self.blobs
            .lock()
            .expect("photo mutex poisoned")
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| PhotoStoreError::NotFound(key.to_string()))
    }
}

/// Reports every username as free but refuses the insert, as a concurrent
/// registration winning the race would.
pub(super) struct RacingUsers;

impl UserRepository for RacingUsers {
    fn insert(&self, _record: UserRecord) -> Result<UserRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn username_exists(&self, _username: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    fn all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableUsers;

impl UserRepository for UnavailableUsers {
    fn insert(&self, _record: UserRecord) -> Result<UserRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn username_exists(&self, _username: &str) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Hand-built multipart body carrying the payload's text fields and photo.
pub(super) fn multipart_request(payload: &SubmissionPayload) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in payload.form_fields() {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(photo) = &payload.profile_photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"profilePhoto\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                photo.file_name, photo.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&photo.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/users/submit")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request builds")
}

pub(super) fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
