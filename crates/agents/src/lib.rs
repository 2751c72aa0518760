//! Turns free-form model output into typed point-of-sale results: prompt
//! building, response sanitizing and validation, and the fallback dispatcher.

pub mod assistant;
pub mod context;
pub mod dispatcher;
pub mod json_repair;
pub mod prompt;
pub mod response_sanitizer;
pub mod result;
pub mod validator;

pub use {
    assistant::PosAssistant,
    context::{ContextPayload, DomainSlice, FieldWhitelist, whitelist},
    dispatcher::{FallbackReason, Stage, TaskDispatcher, TaskOutcome, Terminal},
    prompt::{BuildError, BuiltRequest, RequestBuilder, TaskInput, TaskProfile},
    result::{BillLine, HeatmapEntry, ParsedResult, SmartInsights, VoiceCommand},
    validator::{ValidationContext, ValidationFailure, validate},
};
