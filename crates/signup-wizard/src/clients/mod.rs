//! Collaborators the wizard delegates I/O to, plus the HTTP and in-process
//! implementations.

mod http;
mod local;
mod lookup;
mod submission;

pub use http::HttpRegistrationClient;
pub use local::InProcessClient;
pub use lookup::{LookupClient, LookupError};
pub use submission::{SubmissionClient, SubmissionError, SubmissionPayload, SubmissionReceipt};
