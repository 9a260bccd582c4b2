use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::lookup::{LookupClient, LookupError};
use super::submission::{SubmissionClient, SubmissionError, SubmissionPayload, SubmissionReceipt};

/// Talks to a running registration service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRegistrationClient {
    http: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct AvailabilityBody {
    available: bool,
}

#[derive(Debug, Deserialize)]
struct ReceiptBody {
    user: SubmissionReceipt,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl HttpRegistrationClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base)
    }

    pub fn with_client(http: Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self { http, api_base }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        let url = self.url(path);
        debug!(%url, "lookup request");
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|err| LookupError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|err| LookupError::Decode(err.to_string()))
    }
}

#[async_trait]
impl LookupClient for HttpRegistrationClient {
    async fn countries(&self) -> Result<Vec<String>, LookupError> {
        self.get_json("/api/location/countries", &[]).await
    }

    async fn states(&self, country: &str) -> Result<Vec<String>, LookupError> {
        self.get_json("/api/location/states", &[("country", country)])
            .await
    }

    async fn cities(&self, state: &str) -> Result<Vec<String>, LookupError> {
        self.get_json("/api/location/cities", &[("state", state)])
            .await
    }

    async fn username_available(&self, username: &str) -> Result<bool, LookupError> {
        let body: AvailabilityBody = self
            .get_json("/api/users/check-username", &[("username", username)])
            .await?;
        Ok(body.available)
    }
}

#[async_trait]
impl SubmissionClient for HttpRegistrationClient {
    async fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let mut form = Form::new();
        for (name, value) in payload.form_fields() {
            form = form.text(name, value);
        }
        if let Some(photo) = payload.profile_photo {
            let part = Part::bytes(photo.bytes)
                .file_name(photo.file_name)
                .mime_str(&photo.content_type)
                .map_err(|err| SubmissionError::Rejected(err.to_string()))?;
            form = form.part("profilePhoto", part);
        }

        let response = self
            .http
            .post(self.url("/api/users/submit"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: ReceiptBody = response
                .json()
                .await
                .map_err(|err| SubmissionError::Transport(err.to_string()))?;
            return Ok(body.user);
        }

        if status == StatusCode::CONFLICT {
            return Err(SubmissionError::UsernameTaken);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        let reason = body
            .error
            .unwrap_or_else(|| format!("registration failed with status {}", status.as_u16()));
        Err(SubmissionError::Rejected(reason))
    }
}
