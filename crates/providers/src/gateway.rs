//! Single-attempt boundary between the assistant and the model service.
//!
//! Every transport or service failure is converted into [`Unavailable`];
//! nothing else crosses this boundary. There is no retry and no deadline.

use std::{sync::Arc, time::Instant};

use {
    shelfwise_common::{InlineImage, ReasoningEffort, ResponseFormat},
    shelfwise_config::ShelfwiseConfig,
    tracing::{debug, warn},
};

use crate::{
    error::Result,
    gemini::GeminiService,
    service::{GenerateRequest, ModelService},
};

/// Text produced by one model call. Never outlives the call that made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelResponse {
    pub text: String,
}

/// The model service could not be reached or refused the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("model service unavailable: {reason}")]
pub struct Unavailable {
    pub reason: String,
}

/// Everything one call needs besides the prompt text.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions<'a> {
    pub model: &'a str,
    pub image: Option<&'a InlineImage>,
    pub response_format: ResponseFormat,
    pub reasoning_effort: ReasoningEffort,
}

#[derive(Clone)]
pub struct ModelGateway {
    service: Arc<dyn ModelService>,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("service", &self.service.name())
            .finish()
    }
}

impl ModelGateway {
    pub fn new(service: Arc<dyn ModelService>) -> Self {
        Self { service }
    }

    /// Build the production gateway. Fails when the service key is missing.
    pub fn from_config(config: &ShelfwiseConfig) -> Result<Self> {
        let service = GeminiService::from_config(config)?;
        Ok(Self::new(Arc::new(service)))
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    /// Issue exactly one request.
    pub async fn call(
        &self,
        prompt: &str,
        options: CallOptions<'_>,
    ) -> std::result::Result<RawModelResponse, Unavailable> {
        let request = GenerateRequest {
            model: options.model.to_string(),
            prompt: prompt.to_string(),
            image: options.image.cloned(),
            response_format: options.response_format,
            reasoning_effort: options.reasoning_effort,
        };

        let started = Instant::now();
        match self.service.generate(&request).await {
            Ok(text) => {
                debug!(
                    service = self.service.name(),
                    model = options.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    response_len = text.len(),
                    "model call completed"
                );
                Ok(RawModelResponse { text })
            },
            Err(error) => {
                warn!(
                    service = self.service.name(),
                    model = options.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %error,
                    "model call failed"
                );
                Err(Unavailable {
                    reason: error.to_string(),
                })
            },
        }
    }
}
