//! Mock chat backend for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use super::traits::*;

/// Mock backend for tests.
///
/// Responses are served from a queue; the last response is repeated once
/// the queue is drained. Can be flipped into rate-limited or unavailable
/// modes.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    rate_limited: AtomicBool,
    responses: Mutex<VecDeque<String>>,
    last_response: Mutex<String>,
    last_system_prompt: Mutex<Option<String>>,
    call_count: AtomicU32,
}

impl MockBackend {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            rate_limited: AtomicBool::new(false),
            responses: Mutex::new(VecDeque::new()),
            last_response: Mutex::new("Mock response".to_string()),
            last_system_prompt: Mutex::new(None),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set a single response, repeated for every call.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        *self.last_response.lock().unwrap() = content.into();
        self
    }

    /// Queue responses served in order; the final one repeats.
    pub fn with_responses<I, S>(self, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut queue = self.responses.lock().unwrap();
            for content in contents {
                queue.push_back(content.into());
            }
        }
        self
    }

    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Make every call fail with `RateLimited`.
    pub fn with_rate_limited(self, limited: bool) -> Self {
        self.rate_limited.store(limited, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The system prompt of the most recent call, if any.
    pub fn last_system_prompt(&self) -> Option<String> {
        self.last_system_prompt.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_system_prompt.lock().unwrap() = request.system_prompt.clone();

        if !self.available.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("Mock backend disabled".to_string()));
        }
        if self.rate_limited.load(Ordering::SeqCst) {
            return Err(BackendError::RateLimited {
                retry_after_ms: None,
            });
        }

        let content = {
            let mut queue = self.responses.lock().unwrap();
            match queue.pop_front() {
                Some(next) => {
                    *self.last_response.lock().unwrap() = next.clone();
                    next
                }
                None => self.last_response.lock().unwrap().clone(),
            }
        };

        let prompt_tokens: u32 = request
            .messages
            .iter()
            .map(|m| m.content.len() as u32 / 4)
            .sum();

        Ok(ChatResponse {
            usage: Usage {
                prompt_tokens,
                completion_tokens: content.len() as u32 / 4,
            },
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_queued_responses_then_repeats() {
        let backend = MockBackend::new("test-model").with_responses(["one", "two"]);

        assert_eq!(
            backend.complete(ChatRequest::user("a")).await.unwrap().content,
            "one"
        );
        assert_eq!(
            backend.complete(ChatRequest::user("b")).await.unwrap().content,
            "two"
        );
        assert_eq!(
            backend.complete(ChatRequest::user("c")).await.unwrap().content,
            "two"
        );
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn records_the_last_system_prompt() {
        let backend = MockBackend::default();
        assert!(backend.last_system_prompt().is_none());

        backend
            .complete(ChatRequest::user("a").with_system("act as a preceptor"))
            .await
            .unwrap();
        assert_eq!(
            backend.last_system_prompt().as_deref(),
            Some("act as a preceptor")
        );
    }

    #[tokio::test]
    async fn rate_limited_mode_fails_every_call() {
        let backend = MockBackend::default().with_rate_limited(true);
        let err = backend.complete(ChatRequest::user("a")).await.unwrap_err();
        assert!(matches!(err, BackendError::RateLimited { .. }));
    }
}
