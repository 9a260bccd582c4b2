//! Server side of registration: the account store, photo storage, the static
//! location catalog and the HTTP routes the wizard talks to.

pub mod domain;
pub mod locations;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{UserId, UserRecord};
pub use locations::LocationCatalog;
pub use repository::{photo_key, PhotoStore, PhotoStoreError, RepositoryError, UserRepository};
pub use router::{registration_router, SUBMIT_BODY_LIMIT};
pub use service::{RegistrationService, RegistrationServiceError};
