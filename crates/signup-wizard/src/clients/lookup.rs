use async_trait::async_trait;

/// Read-only queries the wizard issues while the user is typing.
///
/// Unknown keys are not errors: a country or state the service has never heard
/// of yields an empty list.
#[async_trait]
pub trait LookupClient: Send + Sync {
    async fn countries(&self) -> Result<Vec<String>, LookupError>;
    async fn states(&self, country: &str) -> Result<Vec<String>, LookupError>;
    async fn cities(&self, state: &str) -> Result<Vec<String>, LookupError>;
    /// `true` when no stored account uses `username`.
    async fn username_available(&self, username: &str) -> Result<bool, LookupError>;
}

/// Lookup failures. Callers degrade to empty option lists or an unknown
/// availability instead of surfacing these to the user.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup transport failed: {0}")]
    Transport(String),
    #[error("lookup service answered with status {0}")]
    Status(u16),
    #[error("lookup response could not be decoded: {0}")]
    Decode(String),
    #[error("lookup backend unavailable: {0}")]
    Unavailable(String),
}
