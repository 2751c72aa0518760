//! Build → Call → Sanitize → Validate, with a fallback on any failure.

use std::fmt;

use {
    shelfwise_common::TaskKind,
    shelfwise_config::ShelfwiseConfig,
    shelfwise_providers::{CallOptions, ModelGateway, Unavailable},
    tracing::{debug, warn},
};

use crate::{
    prompt::{RequestBuilder, TaskInput},
    response_sanitizer,
    result::ParsedResult,
    validator::{self, ValidationContext, ValidationFailure},
};

/// Raw text longer than this is cut in diagnostics.
const LOG_TEXT_LIMIT: usize = 512;

/// Pipeline stage of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Building,
    Calling,
    Sanitizing,
    Validating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Calling => "calling",
            Self::Sanitizing => "sanitizing",
            Self::Validating => "validating",
        })
    }
}

/// Why an invocation ended in the fallback value.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// Nothing worth asking; the service was never called.
    Precondition(&'static str),
    Build(String),
    Unavailable(Unavailable),
    Validation(ValidationFailure),
}

impl FallbackReason {
    /// Stage the invocation was in when it gave up.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Precondition(_) => Stage::Idle,
            Self::Build(_) => Stage::Building,
            Self::Unavailable(_) => Stage::Calling,
            Self::Validation(_) => Stage::Validating,
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precondition(what) => write!(f, "precondition not met: {what}"),
            Self::Build(e) => write!(f, "request build failed: {e}"),
            Self::Unavailable(e) => write!(f, "{e}"),
            Self::Validation(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    Done,
    Fallback(FallbackReason),
}

/// The result of one invocation plus how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub result: ParsedResult,
    pub terminal: Terminal,
}

impl TaskOutcome {
    fn done(result: ParsedResult) -> Self {
        Self {
            result,
            terminal: Terminal::Done,
        }
    }

    fn fallback(kind: TaskKind, reason: FallbackReason) -> Self {
        Self {
            result: ParsedResult::fallback(kind),
            terminal: Terminal::Fallback(reason),
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.terminal, Terminal::Fallback(_))
    }
}

/// Entry point for every task. Holds no per-call state, so one dispatcher can
/// serve concurrent invocations.
#[derive(Debug, Clone)]
pub struct TaskDispatcher {
    gateway: ModelGateway,
    builder: RequestBuilder,
    config: ShelfwiseConfig,
}

impl TaskDispatcher {
    pub fn new(gateway: ModelGateway, config: ShelfwiseConfig) -> Self {
        Self {
            gateway,
            builder: RequestBuilder::new(config.shop.clone()),
            config,
        }
    }

    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    /// Run `kind` and return its result, falling back on any failure.
    pub async fn run(&self, kind: TaskKind, input: &TaskInput<'_>) -> ParsedResult {
        self.execute(kind, input).await.result
    }

    /// Like [`run`](Self::run), but also reports how the invocation ended.
    pub async fn execute(&self, kind: TaskKind, input: &TaskInput<'_>) -> TaskOutcome {
        if let Some(what) = unmet_precondition(kind, input) {
            debug!(task = %kind, what, "skipping model call");
            return TaskOutcome::fallback(kind, FallbackReason::Precondition(what));
        }

        debug!(task = %kind, stage = %Stage::Building, "dispatching");
        let request = match self.builder.build(kind, input) {
            Ok(request) => request,
            Err(error) => {
                return self.give_up(kind, FallbackReason::Build(error.to_string()), None);
            },
        };

        let model = self.config.model_for(kind);
        let options = CallOptions {
            model,
            image: request.image,
            response_format: request.response_format,
            reasoning_effort: self
                .config
                .reasoning_effort_for(kind)
                .unwrap_or(request.reasoning_effort),
        };
        debug!(
            task = %kind,
            stage = %Stage::Calling,
            model,
            reasoning_effort = ?options.reasoning_effort,
            prompt_len = request.prompt.len(),
            "calling model"
        );
        let raw = match self.gateway.call(&request.prompt, options).await {
            Ok(raw) => raw,
            Err(unavailable) => {
                return self.give_up(kind, FallbackReason::Unavailable(unavailable), None);
            },
        };

        debug!(task = %kind, stage = %Stage::Sanitizing, "sanitizing response");
        let text = response_sanitizer::sanitize(&raw.text);

        debug!(task = %kind, stage = %Stage::Validating, "validating response");
        let ctx = ValidationContext::from_slice(&input.slice);
        match validator::validate(kind, &text, &ctx) {
            Ok(result) => {
                debug!(task = %kind, "task done");
                TaskOutcome::done(result)
            },
            Err(failure) => {
                self.give_up(kind, FallbackReason::Validation(failure), Some(&raw.text))
            },
        }
    }

    fn give_up(&self, kind: TaskKind, reason: FallbackReason, raw: Option<&str>) -> TaskOutcome {
        match raw {
            Some(raw) => warn!(
                task = %kind,
                stage = %reason.stage(),
                reason = %reason,
                raw = %truncate(raw, LOG_TEXT_LIMIT),
                "using fallback result"
            ),
            None => warn!(
                task = %kind,
                stage = %reason.stage(),
                reason = %reason,
                "using fallback result"
            ),
        }
        TaskOutcome::fallback(kind, reason)
    }
}

/// No-op conditions that end the invocation before anything is built.
fn unmet_precondition(kind: TaskKind, input: &TaskInput<'_>) -> Option<&'static str> {
    let slice = &input.slice;
    match kind {
        TaskKind::VisualBilling if input.image.is_none() => Some("no image supplied"),
        TaskKind::VisualBilling if slice.inventory.is_empty() => Some("inventory is empty"),
        TaskKind::FaceDescription if input.image.is_none() => Some("no image supplied"),
        TaskKind::FaceIdentification if input.image.is_none() => Some("no image supplied"),
        TaskKind::FaceIdentification if slice.customers_with_descriptor().next().is_none() => {
            Some("no customer has a stored face descriptor")
        },
        TaskKind::VoiceCommand if input.text().is_none() => Some("transcript is empty"),
        TaskKind::ShopQuery if input.text().is_none() => Some("question is empty"),
        TaskKind::UpsellSuggestion if slice.cart_names().next().is_none() => Some("cart is empty"),
        _ => None,
    }
}

/// First `max` characters of `text`.
fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {
        super::*,
        shelfwise_common::{Product, ReasoningEffort},
        shelfwise_config::TaskOverride,
        shelfwise_providers::ScriptedService,
    };

    use crate::{context::DomainSlice, result::VoiceCommand};

    fn dispatcher(svc: &Arc<ScriptedService>) -> TaskDispatcher {
        TaskDispatcher::new(ModelGateway::new(svc.clone()), ShelfwiseConfig::default())
    }

    #[tokio::test]
    async fn done_on_valid_response() {
        let svc = Arc::new(ScriptedService::repeating("```json\n{\"type\":\"CHECKOUT\"}\n```"));
        let inventory = vec![Product::named("p1", "Rice 1kg")];
        let input = TaskInput {
            slice: DomainSlice {
                inventory: &inventory,
                ..Default::default()
            },
            text: Some("checkout"),
            image: None,
        };
        let outcome = dispatcher(&svc).execute(TaskKind::VoiceCommand, &input).await;
        assert_eq!(outcome.terminal, Terminal::Done);
        assert_eq!(
            outcome.result,
            ParsedResult::VoiceCommand(Some(VoiceCommand::Checkout))
        );
        assert_eq!(svc.calls(), 1);
    }

    #[tokio::test]
    async fn precondition_skips_the_call() {
        let svc = Arc::new(ScriptedService::repeating("Try butter."));
        let outcome = dispatcher(&svc)
            .execute(TaskKind::UpsellSuggestion, &TaskInput::default())
            .await;
        assert_eq!(
            outcome.terminal,
            Terminal::Fallback(FallbackReason::Precondition("cart is empty"))
        );
        assert_eq!(outcome.result, ParsedResult::UpsellSuggestion(None));
        assert_eq!(svc.calls(), 0);
    }

    #[tokio::test]
    async fn transport_failure_falls_back() {
        let svc = Arc::new(ScriptedService::with_replies([Err("503".into())]));
        let outcome = dispatcher(&svc)
            .execute(TaskKind::MarketNews, &TaskInput::default())
            .await;
        assert!(matches!(
            outcome.terminal,
            Terminal::Fallback(FallbackReason::Unavailable(_))
        ));
        assert_eq!(outcome.result, ParsedResult::fallback(TaskKind::MarketNews));
        assert_eq!(svc.calls(), 1);
    }

    #[tokio::test]
    async fn validation_failure_reports_stage() {
        let svc = Arc::new(ScriptedService::repeating("   "));
        let outcome = dispatcher(&svc)
            .execute(TaskKind::PriceSuggestion, &TaskInput::default())
            .await;
        let Terminal::Fallback(reason) = outcome.terminal else {
            panic!("expected fallback");
        };
        assert_eq!(reason, FallbackReason::Validation(ValidationFailure::Empty));
        assert_eq!(reason.stage(), Stage::Validating);
    }

    #[tokio::test]
    async fn task_override_changes_model_and_effort() {
        let svc = Arc::new(ScriptedService::repeating("Markets are calm."));
        let mut config = ShelfwiseConfig::default();
        config.tasks.insert(TaskKind::MarketNews, TaskOverride {
            model: Some("gemini-pro-test".into()),
            reasoning_effort: Some(ReasoningEffort::High),
        });
        let dispatcher = TaskDispatcher::new(ModelGateway::new(svc.clone()), config);
        let result = dispatcher
            .run(TaskKind::MarketNews, &TaskInput::default())
            .await;
        assert_eq!(result, ParsedResult::MarketNews("Markets are calm.".into()));

        let reqs = svc.requests().await;
        assert_eq!(reqs[0].model, "gemini-pro-test");
        assert_eq!(reqs[0].reasoning_effort, ReasoningEffort::High);
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("aéb", 2), "aé");
    }
}
