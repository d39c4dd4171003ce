use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::types::{BrochureContent, SiteContent};
use crate::Result;

/// A single prompt sent to a language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Ask the backend for a JSON object instead of free text.
    pub json_response: bool,
}

/// A chat-style language model backend.
#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Sends one request and returns the raw text of the first choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Turns extracted site content into brochure copy.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        site: &SiteContent,
        company_name: &str,
        cancel: &CancellationToken,
    ) -> Result<BrochureContent>;
}
