use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::locations::LocationCatalog;
use super::repository::{PhotoStore, RepositoryError, UserRepository};
use super::service::{RegistrationService, RegistrationServiceError};
use crate::clients::SubmissionPayload;
use crate::wizard::domain::{Field, ProfilePhoto};

/// Room for a 2 MiB photo plus the text parts and multipart framing.
pub const SUBMIT_BODY_LIMIT: usize = 4 * 1024 * 1024;

pub(crate) struct RegistrationState<R, P> {
    pub(crate) service: Arc<RegistrationService<R, P>>,
    pub(crate) catalog: Arc<LocationCatalog>,
}

impl<R, P> Clone for RegistrationState<R, P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

/// Router exposing the user and location endpoints.
pub fn registration_router<R, P>(
    service: Arc<RegistrationService<R, P>>,
    catalog: Arc<LocationCatalog>,
) -> Router
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    Router::new()
        .route("/api/users", get(users_index))
        .route("/api/users/all", get(all_users_handler::<R, P>))
        .route("/api/users/check-username", get(check_username_handler::<R, P>))
        .route("/api/users/submit", post(submit_handler::<R, P>))
        .route("/api/location/countries", get(countries_handler::<R, P>))
        .route("/api/location/states", get(states_handler::<R, P>))
        .route("/api/location/cities", get(cities_handler::<R, P>))
        .layer(DefaultBodyLimit::max(SUBMIT_BODY_LIMIT))
        .with_state(RegistrationState { service, catalog })
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "success": false,
        "error": message.into(),
    });
    (status, Json(payload)).into_response()
}

async fn users_index() -> Response {
    Json(json!({
        "message": "User API Endpoints",
        "endpoints": {
            "getAllUsers": "GET /all",
            "checkUsername": "GET /check-username?username=YOUR_USERNAME",
            "submitUser": "POST /submit (with profilePhoto in form-data)",
        },
        "status": "API is working correctly",
    }))
    .into_response()
}

pub(crate) async fn all_users_handler<R, P>(
    State(state): State<RegistrationState<R, P>>,
) -> Response
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    match state.service.users() {
        Ok(users) => Json(json!({
            "success": true,
            "count": users.len(),
            "users": users,
        }))
        .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsernameQuery {
    username: Option<String>,
}

pub(crate) async fn check_username_handler<R, P>(
    State(state): State<RegistrationState<R, P>>,
    Query(query): Query<UsernameQuery>,
) -> Response
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    let Some(username) = query.username.filter(|name| !name.is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username query parameter is required",
        );
    };

    match state.service.check_username(&username) {
        Ok(available) => Json(json!({ "success": true, "available": available })).into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

pub(crate) async fn submit_handler<R, P>(
    State(state): State<RegistrationState<R, P>>,
    multipart: Multipart,
) -> Response
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    let payload = match read_submission(multipart).await {
        Ok(payload) => payload,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match state.service.submit(payload) {
        Ok(record) => {
            let body = json!({
                "success": true,
                "user": { "id": record.id, "username": record.username },
            });
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(RegistrationServiceError::Invalid { message, .. }) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, message)
        }
        Err(RegistrationServiceError::Repository(RepositoryError::Conflict)) => {
            error_response(StatusCode::CONFLICT, "Username already taken")
        }
        Err(other) => {
            warn!(error = %other, "registration failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<SubmissionPayload, String> {
    let mut fields = BTreeMap::new();
    let mut photo = None;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|err| err.body_text())?
    {
        let Some(name) = part.name().map(str::to_string) else {
            continue;
        };

        if name == Field::ProfilePhoto.name() {
            let file_name = part.file_name().unwrap_or("upload").to_string();
            let content_type = part
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });
            let bytes = part.bytes().await.map_err(|err| err.body_text())?;
            if !bytes.is_empty() {
                photo = Some(ProfilePhoto::new(file_name, content_type, bytes.to_vec()));
            }
        } else {
            let value = part.text().await.map_err(|err| err.body_text())?;
            fields.insert(name, value);
        }
    }

    SubmissionPayload::from_form(fields, photo).map_err(|err| err.to_string())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CountryQuery {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StateQuery {
    #[serde(default)]
    state: String,
}

async fn countries_handler<R, P>(State(state): State<RegistrationState<R, P>>) -> Response
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    Json(state.catalog.countries()).into_response()
}

async fn states_handler<R, P>(
    State(state): State<RegistrationState<R, P>>,
    Query(query): Query<CountryQuery>,
) -> Response
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    Json(state.catalog.states(&query.country)).into_response()
}

async fn cities_handler<R, P>(
    State(state): State<RegistrationState<R, P>>,
    Query(query): Query<StateQuery>,
) -> Response
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    Json(state.catalog.cities(&query.state)).into_response()
}
