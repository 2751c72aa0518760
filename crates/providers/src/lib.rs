//! Model service backends and the single-attempt gateway in front of them.

pub mod error;
pub mod gateway;
pub mod gemini;
pub mod scripted;
pub mod service;

pub use {
    error::{Error, Result},
    gateway::{CallOptions, ModelGateway, RawModelResponse, Unavailable},
    gemini::GeminiService,
    scripted::ScriptedService,
    service::{GenerateRequest, ModelService},
};
