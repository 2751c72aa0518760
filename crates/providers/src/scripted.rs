//! In-memory model service that replays canned replies.
//!
//! Used by tests and by the CLI's `--dry-run` mode.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use {async_trait::async_trait, tokio::sync::Mutex};

use crate::{
    error::{Error, Result},
    service::{GenerateRequest, ModelService},
};

/// One queued outcome: the reply text, or a failure message.
pub type ScriptedReply = std::result::Result<String, String>;

#[derive(Default)]
pub struct ScriptedService {
    replies: Mutex<VecDeque<ScriptedReply>>,
    /// Returned once the queue is drained. `None` means drained calls fail.
    repeat: Option<String>,
    requests: Mutex<Vec<GenerateRequest>>,
    calls: AtomicUsize,
}

impl ScriptedService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call with the same text.
    #[must_use]
    pub fn repeating(text: impl Into<String>) -> Self {
        Self {
            repeat: Some(text.into()),
            ..Self::default()
        }
    }

    /// Queue replies in order.
    #[must_use]
    pub fn with_replies<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = ScriptedReply>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub async fn push_reply(&self, reply: ScriptedReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Number of `generate` calls seen so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub async fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ModelService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        match self.replies.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(Error::message(message)),
            None => self
                .repeat
                .clone()
                .ok_or_else(|| Error::message("no scripted reply left")),
        }
    }
}
