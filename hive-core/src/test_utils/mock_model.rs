//! MockModel — scripted model connection.

use crate::error::ModelError;
use crate::model::{Completion, CompletionRequest, ModelClient};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A model connection that replays queued completions and records every
/// request. When the queue is empty it answers with `"ok"`.
pub struct MockModel {
    provider: String,
    model: String,
    responses: Mutex<VecDeque<Result<Completion, ModelError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    closes: AtomicUsize,
    fail_close: bool,
}

impl MockModel {
    /// Create a mock connection for `provider`/`model`.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(vec![]),
            closes: AtomicUsize::new(0),
            fail_close: false,
        }
    }

    /// Queue completions to return, in order.
    pub fn with_responses(self, responses: Vec<Completion>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .extend(responses.into_iter().map(Ok));
        self
    }

    /// Queue an error to return.
    pub fn with_error(self, error: ModelError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Make `close` fail.
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of times `close` was called.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for MockModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Completion::text("ok")))
    }

    async fn close(&self) -> Result<(), ModelError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(ModelError::RequestFailed(format!(
                "failed to close {}/{}",
                self.provider, self.model
            )));
        }
        Ok(())
    }
}
