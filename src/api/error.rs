//! Typed failures for contribution fetches.

use reqwest::StatusCode;
use thiserror::Error;

/// Broad class of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request did not complete or the API answered with a non-success status.
    Transport,
    /// The API answered, but the body was unusable or reported an error.
    Protocol,
    /// The request was rejected before any I/O.
    Input,
}

/// Errors raised while fetching contribution data from GitHub.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed GitHub API response: {message}")]
    Decode { message: String },

    #[error("GraphQL errors: {}", .messages.join(", "))]
    GraphQL { messages: Vec<String> },

    #[error("GitHub user '{username}' not found")]
    UserNotFound { username: String },

    #[error("Invalid GitHub username: '{username}'")]
    InvalidUsername { username: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Status { .. } | FetchError::Request(_) => FetchErrorKind::Transport,
            FetchError::Decode { .. }
            | FetchError::GraphQL { .. }
            | FetchError::UserNotFound { .. } => FetchErrorKind::Protocol,
            FetchError::InvalidUsername { .. } => FetchErrorKind::Input,
        }
    }

    /// HTTP status of a transport failure, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Request(e) => e.status(),
            _ => None,
        }
    }
}
