//! Scripted completion service.
//!
//! Replays a fixed sequence of answers. Useful for tests and for exercising the
//! pipeline without network access.

use super::{CompletionError, CompletionRequest, CompletionService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Completion service that returns pre-recorded responses in order.
///
/// Once the script runs out every further call fails with an API error.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    /// Create a service replaying the given responses.
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Service that answers a single call with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    /// Service whose first call fails with `error`.
    pub fn failing(error: CompletionError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = self
            .script
            .lock()
            .map_err(|_| CompletionError::Api("script lock poisoned".to_string()))?
            .pop_front();

        next.unwrap_or_else(|| Err(CompletionError::Api("script exhausted".to_string())))
    }
}
