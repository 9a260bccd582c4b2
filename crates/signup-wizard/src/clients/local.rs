use std::sync::Arc;

use async_trait::async_trait;

use super::lookup::{LookupClient, LookupError};
use super::submission::{SubmissionClient, SubmissionError, SubmissionPayload, SubmissionReceipt};
use crate::accounts::{
    LocationCatalog, PhotoStore, RegistrationService, RegistrationServiceError, RepositoryError,
    UserRepository,
};

/// Serves the wizard straight from an in-process registration service.
pub struct InProcessClient<R, P> {
    service: Arc<RegistrationService<R, P>>,
    catalog: Arc<LocationCatalog>,
}

impl<R, P> InProcessClient<R, P>
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    pub fn new(service: Arc<RegistrationService<R, P>>, catalog: Arc<LocationCatalog>) -> Self {
        Self { service, catalog }
    }
}

#[async_trait]
impl<R, P> LookupClient for InProcessClient<R, P>
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    async fn countries(&self) -> Result<Vec<String>, LookupError> {
        Ok(self.catalog.countries())
    }

    async fn states(&self, country: &str) -> Result<Vec<String>, LookupError> {
        Ok(self.catalog.states(country))
    }

    async fn cities(&self, state: &str) -> Result<Vec<String>, LookupError> {
        Ok(self.catalog.cities(state))
    }

    async fn username_available(&self, username: &str) -> Result<bool, LookupError> {
        self.service
            .check_username(username)
            .map_err(|err| LookupError::Unavailable(err.to_string()))
    }
}

#[async_trait]
impl<R, P> SubmissionClient for InProcessClient<R, P>
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    async fn submit(
        &self,
        payload: SubmissionPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        match self.service.submit(payload) {
            Ok(record) => Ok(SubmissionReceipt {
                id: record.id.0,
                username: record.username,
            }),
            Err(RegistrationServiceError::Repository(RepositoryError::Conflict)) => {
                Err(SubmissionError::UsernameTaken)
            }
            Err(RegistrationServiceError::Invalid { message, .. }) => {
                Err(SubmissionError::Rejected(message))
            }
            Err(other) => Err(SubmissionError::Transport(other.to_string())),
        }
    }
}
