use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::inference::backend::{BackendError, StructuredTextGenerator};
use crate::inference::context::RequestContext;
use crate::models::structure::{StructureRequest, StructureResponse, ValidationError};

/// Upper bound of backend calls for a single request.
pub const MAX_ATTEMPTS: usize = 3;

const PROMPT_INSTRUCTIONS: &str = "\
You convert unstructured text into structured data.
Extract every relevant piece of information from the text below into a single JSON object.
Rules:
- Reply with the JSON object only, no markdown fences and no commentary.
- Use snake_case for all field names.
- Use JSON numbers, booleans, arrays and nested objects where the text implies them.
- Do not invent information that is not present in the text.";

/// Why a single backend call did not produce usable data.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("invalid JSON from LLM: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid structured output: {0}")]
    InvalidOutput(#[from] ValidationError),
}

#[derive(Error, Debug)]
pub enum StructureError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Only the final attempt's failure is kept.
    #[error("all {attempts} attempts failed: {last}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        last: AttemptError,
    },
}

#[async_trait]
pub trait Structurer: Send + Sync {
    async fn structure(
        &self,
        ctx: &RequestContext,
        request: StructureRequest,
    ) -> Result<StructureResponse, StructureError>;
}

#[derive(Clone)]
pub struct StructurerService {
    backend: Arc<dyn StructuredTextGenerator>,
}

impl StructurerService {
    pub fn new(backend: Arc<dyn StructuredTextGenerator>) -> Self {
        Self { backend }
    }

    async fn attempt(
        &self,
        ctx: &RequestContext,
        prompt: &str,
    ) -> Result<StructureResponse, AttemptError> {
        let reply = ctx
            .run(self.backend.generate_structured_json(prompt))
            .await
            .map_err(BackendError::from)??;
        debug!(reply_len = reply.len(), "LLM replied");
        parse_and_validate(&reply)
    }
}

#[async_trait]
impl Structurer for StructurerService {
    #[tracing::instrument(level = "info", skip_all, fields(raw_text_len = request.raw_text.len()))]
    async fn structure(
        &self,
        ctx: &RequestContext,
        request: StructureRequest,
    ) -> Result<StructureResponse, StructureError> {
        request.validate()?;
        let prompt = build_prompt(&request.raw_text);

        let mut attempt = 1;
        loop {
            match self.attempt(ctx, &prompt).await {
                Ok(response) => {
                    info!(attempt, "Structured text");
                    return Ok(response);
                }
                Err(err) => {
                    warn!(attempt, max_attempts = MAX_ATTEMPTS, error = %err, "Structuring attempt failed");
                    if attempt >= MAX_ATTEMPTS {
                        return Err(StructureError::RetriesExhausted {
                            attempts: MAX_ATTEMPTS,
                            last: err,
                        });
                    }
                    attempt += 1;
                }
            }
        }
    }
}

pub(crate) fn build_prompt(raw_text: &str) -> String {
    format!("{PROMPT_INSTRUCTIONS}\n\nText:\n{raw_text}")
}

/// A JSON `null` reply parses to missing data and fails validation rather than parsing.
pub(crate) fn parse_and_validate(reply: &str) -> Result<StructureResponse, AttemptError> {
    let data: Option<Map<String, Value>> = serde_json::from_str(reply)?;
    let response = StructureResponse { data };
    response.validate()?;
    Ok(response)
}
