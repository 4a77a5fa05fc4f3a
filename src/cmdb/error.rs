//! CMDB error types

use thiserror::Error;

/// Result type alias for CMDB operations
pub type CmdbResult<T> = Result<T, CmdbError>;

/// Errors returned by the CMDB client and its HTTP backends
#[derive(Debug, Error)]
pub enum CmdbError {
    /// The request could not be sent or no response was received
    #[error("error making request: {0}")]
    Transport(#[from] reqwest::Error),

    /// Transport failure reported by a non-reqwest backend
    #[error("error making request: {0}")]
    TransportMessage(String),

    /// A response was received but its status code was not 200
    #[error("received non-200 response: {}", status_text(.status, .reason))]
    Status {
        status: u16,
        reason: Option<String>,
        url: String,
    },

    /// A 200 response body did not parse as the expected JSON shape
    #[error("error unmarshalling response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request body could not be serialized
    #[error("error encoding request: {0}")]
    Encode(serde_json::Error),

    /// Update requested with neither a name nor a description
    #[error("please provide a new name or description to update the server")]
    EmptyUpdate,

    /// An empty sys_id was supplied
    #[error("sys_id must not be empty")]
    MissingSysId,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CmdbError {
    /// HTTP status code, for status errors only
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Requested URL, for status errors only
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Status { url, .. } => Some(url),
            _ => None,
        }
    }
}

fn status_text(status: &u16, reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}
