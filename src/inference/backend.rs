use async_trait::async_trait;
use thiserror::Error;

use crate::inference::context::ContextError;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request to LLM backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM backend responded with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("LLM backend returned no content")]
    EmptyReply,

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for BackendError {
    fn from(message: &str) -> Self {
        BackendError::Other(message.to_string())
    }
}

impl From<String> for BackendError {
    fn from(message: String) -> Self {
        BackendError::Other(message)
    }
}

/// A model that answers a prompt with text that should hold a single JSON object.
///
/// Implementations do not validate the reply, that is left to the caller.
#[async_trait]
pub trait StructuredTextGenerator: Send + Sync {
    async fn generate_structured_json(&self, prompt: &str) -> Result<String, BackendError>;
}
