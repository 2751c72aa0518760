use std::collections::BTreeMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    shelfwise_common::{ReasoningEffort, TaskKind},
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Top-level `shelfwise.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfwiseConfig {
    pub provider: ProviderConfig,
    pub shop: ShopConfig,
    /// Per-task overrides keyed by snake_case task name.
    pub tasks: BTreeMap<TaskKind, TaskOverride>,
}

impl ShelfwiseConfig {
    /// Model to use for `kind`: the task override if set, else the provider
    /// default.
    #[must_use]
    pub fn model_for(&self, kind: TaskKind) -> &str {
        self.tasks
            .get(&kind)
            .and_then(|o| o.model.as_deref())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.provider.model)
    }

    /// Reasoning effort override for `kind`, if any.
    #[must_use]
    pub fn reasoning_effort_for(&self, kind: TaskKind) -> Option<ReasoningEffort> {
        self.tasks.get(&kind).and_then(|o| o.reasoning_effort)
    }
}

/// Connection settings for the generative-language service.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Service API key. Usually supplied through the environment instead.
    #[serde(
        serialize_with = "serialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,

    /// Base URL of the `generateContent` API.
    pub base_url: String,

    /// Default model identity for every task.
    pub model: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
        }
    }
}

impl ProviderConfig {
    /// The API key, treating a blank value as absent.
    #[must_use]
    pub fn api_key(&self) -> Option<&Secret<String>> {
        self.api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
    }
}

/// Facts about the shop that flavour the narrative prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub name: String,
    /// ISO 4217 currency code used when the model talks about prices.
    pub currency: String,
    pub region: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: "our shop".into(),
            currency: "INR".into(),
            region: "India".into(),
        }
    }
}

/// Optional per-task tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_str(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
