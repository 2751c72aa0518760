use {
    async_trait::async_trait,
    shelfwise_common::{InlineImage, ReasoningEffort, ResponseFormat},
};

use crate::error::Result;

/// One prompt (with an optional image) for the model service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub image: Option<InlineImage>,
    pub response_format: ResponseFormat,
    pub reasoning_effort: ReasoningEffort,
}

/// A text-generating model backend.
///
/// Implementations make exactly one attempt per call and return whatever
/// text the backend produced, possibly empty.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> Result<String>;
}
