pub mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the course assistant backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend answered, but not with a success status
    #[error("backend responded with status {0}")]
    BadStatus(StatusCode),
    /// The request could not be completed or the reply could not be read
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Transport(err.to_string())
    }
}

/// The external chat service
///
/// Implemented over HTTP by [`HttpBackend`]; tests supply their own.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one question and return the assistant's reply text
    async fn chat(&self, query: &str) -> Result<String, BackendError>;

    /// Ask the backend to forget the conversation
    async fn reset(&self) -> Result<(), BackendError>;
}
