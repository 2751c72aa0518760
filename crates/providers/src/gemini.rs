//! Client for the Gemini `generateContent` REST endpoint.

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    shelfwise_common::{InlineImage, ReasoningEffort},
    shelfwise_config::ShelfwiseConfig,
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    service::{GenerateRequest, ModelService},
};

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: &'a InlineImage,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Only a natural stop yields a complete document. `MAX_TOKENS`, `SAFETY`
/// and the rest leave the text cut short or withheld.
const FINISH_STOP: &str = "STOP";

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Thinking budget (tokens) for a reasoning-effort hint. `None` leaves the
/// model's own default in place.
#[must_use]
pub fn thinking_budget(effort: ReasoningEffort) -> Option<u32> {
    match effort {
        ReasoningEffort::Minimal => Some(0),
        ReasoningEffort::Low => Some(512),
        ReasoningEffort::Default => None,
        ReasoningEffort::High => Some(8192),
    }
}

// ── Service ──────────────────────────────────────────────────────────

pub struct GeminiService {
    client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
}

impl GeminiService {
    pub fn new(base_url: impl Into<String>, api_key: Secret<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Build from config. A missing key is a startup error.
    pub fn from_config(config: &ShelfwiseConfig) -> Result<Self> {
        let key = shelfwise_config::require_api_key(config)?;
        Ok(Self::new(config.provider.base_url.clone(), key.clone()))
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        )
    }

    fn body<'a>(request: &'a GenerateRequest) -> GenerateContentBody<'a> {
        let mut parts = vec![Part::Text {
            text: &request.prompt,
        }];
        if let Some(image) = &request.image {
            parts.push(Part::InlineData { inline_data: image });
        }
        GenerateContentBody {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: request.response_format.mime_type(),
                thinking_config: thinking_budget(request.reasoning_effort)
                    .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            },
        }
    }

    /// Text of the first candidate. A candidate that stopped for any reason
    /// other than `STOP` is an error, so a cut-off document never reaches
    /// the caller as if it were whole.
    fn extract_text(response: GenerateContentResponse) -> Result<String> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return Ok(String::new());
        };
        if let Some(reason) = candidate
            .finish_reason
            .as_deref()
            .filter(|r| *r != FINISH_STOP)
        {
            return Err(Error::message(format!(
                "generation stopped early: finishReason {reason}"
            )));
        }
        Ok(candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ModelService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let url = self.endpoint(&request.model);
        debug!(
            model = %request.model,
            has_image = request.image.is_some(),
            prompt_len = request.prompt.len(),
            "gemini generateContent"
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&Self::body(request))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)?;
        Self::extract_text(parsed)
    }
}
