//! Provider that replays queued responses.
//!
//! Used by tests to drive the arena without network access.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

/// Replays queued replies in FIFO order and records every request it sees
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    latency: Duration,
}

impl ScriptedProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Delay every reply, to exercise caller timeouts
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue a successful reply
    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.lock_replies().push_back(Ok(text.into()));
        self
    }

    /// Queue a failed call
    pub fn push_error(&self, message: impl Into<String>) -> &Self {
        self.lock_replies().push_back(Err(message.into()));
        self
    }

    /// Number of replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.lock_replies().len()
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: GenerateRequest) -> LlmResult<GenerateResponse> {
        let start = Instant::now();
        let timeout = request.timeout;
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        if !self.latency.is_zero() {
            if self.latency >= timeout {
                tokio::time::sleep(timeout).await;
                return Err(LlmError::Timeout(timeout));
            }
            tokio::time::sleep(self.latency).await;
        }

        let reply = self
            .lock_replies()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));

        match reply {
            Ok(text) => Ok(GenerateResponse {
                text: text.trim().to_string(),
                metadata: ResponseMetadata {
                    provider: self.name.clone(),
                    model: "scripted".to_string(),
                    tokens_used: None,
                    latency_ms: start.elapsed().as_millis() as u64,
                },
            }),
            Err(message) => Err(LlmError::ApiError(message)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
