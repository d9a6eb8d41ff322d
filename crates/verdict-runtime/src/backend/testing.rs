//! Scripted mock backend for stage and pipeline tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use super::{BackendError, GenerateRequest, GenerateResponse, InferenceBackend};

/// Deterministic scripted backend. Clones share state, so a test can
/// hand one clone to a stage and inspect the calls on another.
#[derive(Clone, Default)]
pub(crate) struct MockBackend {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    /// One-shot replies consumed in order; empty falls through to
    /// `fallback`.
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Mutex<Option<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    calls: AtomicU32,
}

impl MockBackend {
    /// Always reply with the same text.
    pub fn replying(text: &str) -> Self {
        let mock = Self::default();
        *mock.inner.fallback.lock() = Some(Ok(text.to_string()));
        mock
    }

    /// Always fail with a transport error.
    pub fn failing(message: &str) -> Self {
        let mock = Self::default();
        *mock.inner.fallback.lock() = Some(Err(message.to_string()));
        mock
    }

    /// Reply with each entry once, in order, then fall back to the last
    /// entry.
    pub fn scripted(replies: Vec<Result<String, String>>) -> Self {
        let mock = Self::default();
        *mock.inner.fallback.lock() = replies.last().cloned();
        *mock.inner.script.lock() = replies.into();
        mock
    }

    pub fn call_count(&self) -> u32 {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.inner.requests.lock().last().cloned()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_request().map(|r| r.prompt)
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, BackendError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.requests.lock().push(request.clone());

        let reply = self
            .inner
            .script
            .lock()
            .pop_front()
            .or_else(|| self.inner.fallback.lock().clone())
            .unwrap_or_else(|| Ok(String::new()));

        match reply {
            Ok(text) => Ok(GenerateResponse {
                text,
                model: "mock".to_string(),
            }),
            Err(message) => Err(BackendError::HttpError(message)),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "mock"
    }
}
