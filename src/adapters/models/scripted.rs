//! Scripted chat model for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ModelReply, ModelRequest};
use crate::domain::ports::ChatModel;

/// One queued step of a script.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    /// Canned reply.
    Reply(ModelReply),
    /// Fail the call with `ModelFailed`
    Fail(String),
}

/// Chat model that replays queued replies.
///
/// Queued steps are consumed first. Once the queue is empty, the fallback
/// texts are cycled; with no fallback the call fails. Every request is
/// recorded for inspection.
#[derive(Clone, Default)]
pub struct ScriptedChatModel {
    queue: Arc<Mutex<VecDeque<ScriptedStep>>>,
    fallback: Arc<Vec<String>>,
    cursor: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    delay: Option<Duration>,
}

impl ScriptedChatModel {
    /// Model with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Model that cycles through fixed texts.
    pub fn cycling(replies: Vec<String>) -> Self {
        Self {
            fallback: Arc::new(replies),
            ..Self::default()
        }
    }

    /// Model that plays `replies` in order.
    pub fn with_replies(replies: impl IntoIterator<Item = ModelReply>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(
                replies.into_iter().map(ScriptedStep::Reply).collect(),
            )),
            ..Self::default()
        }
    }

    /// Sleep before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a reply.
    pub async fn push_reply(&self, reply: ModelReply) {
        self.queue.lock().await.push_back(ScriptedStep::Reply(reply));
    }

    /// Queue a failure.
    pub async fn push_error(&self, message: impl Into<String>) {
        self.queue
            .lock()
            .await
            .push_back(ScriptedStep::Fail(message.into()));
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of completed calls.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Steps still queued.
    pub async fn remaining(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: ModelRequest) -> DomainResult<ModelReply> {
        self.requests.lock().await.push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let step = self.queue.lock().await.pop_front();
        match step {
            Some(ScriptedStep::Reply(reply)) => Ok(reply),
            Some(ScriptedStep::Fail(message)) => Err(DomainError::ModelFailed(message)),
            None if self.fallback.is_empty() => Err(DomainError::ModelFailed(
                "scripted model has no replies left".to_string(),
            )),
            None => {
                let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.fallback.len();
                Ok(ModelReply::text(self.fallback[idx].clone()))
            }
        }
    }
}
