use super::domain::UserRecord;

/// Storage abstraction so the service can be exercised without a database.
pub trait UserRepository: Send + Sync {
    /// Stores a new account. Usernames are unique; a duplicate is a `Conflict`.
    fn insert(&self, record: UserRecord) -> Result<UserRecord, RepositoryError>;
    fn username_exists(&self, username: &str) -> Result<bool, RepositoryError>;
    fn all(&self) -> Result<Vec<UserRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("username already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Blob storage for uploaded profile photos.
pub trait PhotoStore: Send + Sync {
    /// Returns the storage key, `<millis>-<file name>`.
    fn put(&self, file_name: &str, content_type: &str, bytes: &[u8])
        -> Result<String, PhotoStoreError>;
    fn remove(&self, key: &str) -> Result<(), PhotoStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoStoreError {
    #[error("photo not found: {0}")]
    NotFound(String),
    #[error("photo storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage key for an upload received at `millis`.
pub fn photo_key(millis: i64, file_name: &str) -> String {
    format!("{millis}-{file_name}")
}
