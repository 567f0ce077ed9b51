//! Recording decorator for providers.

use async_trait::async_trait;
use sealog_audit::EventLog;
use sealog_core::{EventId, LLM_INTERACTION, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use crate::error::{LlmError, LlmResult};
use crate::provider::LlmProvider;
use crate::types::{LlmResponse, Message};

/// Provider wrapper that records every completion as an `llm_interaction`.
///
/// All operations are forwarded to the inner provider unchanged. Only
/// `complete` is intercepted: it is timed, and one event is appended after
/// the inner call returns, whether it succeeded or not. A failure to append
/// is surfaced as [`LlmError::Recording`].
pub struct RecordingProvider<P> {
    inner: P,
    log: Arc<EventLog>,
}

impl<P: LlmProvider> RecordingProvider<P> {
    /// Wrap `inner`, recording to `log`.
    pub fn new(inner: P, log: Arc<EventLog>) -> Self {
        Self { inner, log }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// The log interactions are recorded to.
    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    /// Unwrap, returning the inner provider.
    pub fn into_inner(self) -> P {
        self.inner
    }

    fn interaction_payload(
        &self,
        messages: &[Message],
        system: &str,
        result: &LlmResult<LlmResponse>,
        latency_ms: f64,
    ) -> Value {
        let mut payload = Map::new();
        payload.insert("provider", self.inner.name());
        payload.insert("model", self.inner.model());
        payload.insert(
            "messages",
            messages.iter().map(Message::to_value).collect::<Vec<_>>(),
        );
        if !system.is_empty() {
            payload.insert("system", system);
        }
        match result {
            Ok(response) => {
                payload.insert("response", response.message.content.as_str());
                payload.insert("usage", response.usage.to_value());
                payload.insert("stop_reason", response.stop_reason.as_str());
            },
            Err(e) => {
                payload.insert("error", e.to_string());
            },
        }
        payload.insert("latency_ms", latency_ms);
        Value::Map(payload)
    }

    async fn record(&self, payload: Value) -> LlmResult<EventId> {
        let log = Arc::clone(&self.log);
        tokio::task::spawn_blocking(move || log.append(LLM_INTERACTION, payload))
            .await
            .map_err(|e| LlmError::Recording(e.to_string()))?
            .map_err(|e| LlmError::Recording(e.to_string()))
    }
}

#[async_trait]
impl<P: LlmProvider> LlmProvider for RecordingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn complete(&self, messages: &[Message], system: &str) -> LlmResult<LlmResponse> {
        let start = Instant::now();
        let result = self.inner.complete(messages, system).await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let payload = self.interaction_payload(messages, system, &result, latency_ms);
        match self.record(payload).await {
            Ok(event_id) => {
                debug!(
                    event_id = %event_id,
                    provider = %self.inner.name(),
                    latency_ms,
                    "Recorded LLM interaction"
                );
                result
            },
            Err(e) => {
                if let Err(call_error) = &result {
                    error!(error = %call_error, "LLM call failed and could not be recorded");
                }
                Err(e)
            },
        }
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.inner.count_tokens(text)
    }

    fn max_context_length(&self) -> usize {
        self.inner.max_context_length()
    }
}

impl<P> std::fmt::Debug for RecordingProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingProvider")
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StopReason, Usage};
    use sealog_audit::{AuditResult, EventRecord, EventStorage, MemoryEventStorage};
    use sealog_core::SessionId;
    use sealog_crypto::HashEngine;

    struct MockProvider {
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-1"
        }

        async fn complete(&self, messages: &[Message], _system: &str) -> LlmResult<LlmResponse> {
            match &self.reply {
                Some(text) => Ok(LlmResponse {
                    message: Message::assistant(text.clone()),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage {
                        input_tokens: messages.len().saturating_mul(10),
                        output_tokens: 5,
                    },
                }),
                None => Err(LlmError::ApiRequestFailed("backend down".to_string())),
            }
        }

        fn count_tokens(&self, _text: &str) -> usize {
            7
        }

        fn max_context_length(&self) -> usize {
            8_192
        }
    }

    /// Storage that refuses every write.
    struct BrokenStorage;

    impl EventStorage for BrokenStorage {
        fn append_row(&self, _record: &EventRecord) -> AuditResult<()> {
            Err(sealog_audit::AuditError::Storage("disk full".to_string()))
        }

        fn rows(&self) -> AuditResult<Vec<sealog_audit::StoredRow>> {
            Ok(Vec::new())
        }

        fn fetch_by_session(&self, _session_id: &SessionId) -> AuditResult<Vec<EventRecord>> {
            Ok(Vec::new())
        }

        fn get(&self, _event_id: &EventId) -> AuditResult<Option<EventRecord>> {
            Ok(None)
        }

        fn list_sessions(&self) -> AuditResult<Vec<SessionId>> {
            Ok(Vec::new())
        }

        fn count(&self) -> AuditResult<usize> {
            Ok(0)
        }
    }

    fn recording(reply: Option<&str>) -> RecordingProvider<MockProvider> {
        let log = Arc::new(EventLog::in_memory(HashEngine::generate()));
        RecordingProvider::new(
            MockProvider {
                reply: reply.map(str::to_string),
            },
            log,
        )
    }

    #[tokio::test]
    async fn test_successful_call_is_recorded() {
        let provider = recording(Some("hi!"));
        let response = provider
            .complete(&[Message::user("hello")], "be nice")
            .await
            .unwrap();
        assert_eq!(response.message.content, "hi!");

        let events = provider.log().events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, LLM_INTERACTION);

        let payload = events[0].payload_value().unwrap();
        assert_eq!(payload.get("model").and_then(Value::as_str), Some("mock-1"));
        assert_eq!(payload.get("provider").and_then(Value::as_str), Some("mock"));
        assert_eq!(payload.get("response").and_then(Value::as_str), Some("hi!"));
        assert_eq!(payload.get("system").and_then(Value::as_str), Some("be nice"));
        assert_eq!(payload.get("messages").and_then(Value::as_list).map(<[Value]>::len), Some(1));
        assert!(payload.get("latency_ms").and_then(Value::as_f64).is_some());
        assert_eq!(
            payload
                .get("usage")
                .and_then(|u| u.get("input_tokens"))
                .and_then(Value::as_i64),
            Some(10)
        );

        assert!(provider.log().verify().unwrap().all_valid);
    }

    #[tokio::test]
    async fn test_failed_call_is_recorded_with_error() {
        let provider = recording(None);
        let err = provider.complete(&[Message::user("hello")], "").await;
        assert!(matches!(err, Err(LlmError::ApiRequestFailed(_))));

        let events = provider.log().events().unwrap();
        assert_eq!(events.len(), 1);
        let payload = events[0].payload_value().unwrap();
        assert!(payload.get("error").is_some());
        assert!(payload.get("response").is_none());
        assert!(payload.get("system").is_none());
    }

    #[tokio::test]
    async fn test_recording_failure_surfaces() {
        let engine = Arc::new(HashEngine::generate());
        let log = Arc::new(EventLog::new(Arc::new(BrokenStorage), engine, SessionId::new()));
        let provider = RecordingProvider::new(
            MockProvider {
                reply: Some("ok".to_string()),
            },
            log,
        );

        let result = provider.complete(&[Message::user("hello")], "").await;
        assert!(matches!(result, Err(LlmError::Recording(_))));
    }

    #[tokio::test]
    async fn test_other_operations_forwarded() {
        let provider = recording(Some("x"));
        assert_eq!(provider.name(), "mock");
        assert_eq!(provider.model(), "mock-1");
        assert_eq!(provider.count_tokens("anything"), 7);
        assert_eq!(provider.max_context_length(), 8_192);
        assert!(provider.log().events().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_boxed_provider_can_be_wrapped() {
        let boxed: Box<dyn LlmProvider> = Box::new(MockProvider {
            reply: Some("boxed".to_string()),
        });
        let storage = Arc::new(MemoryEventStorage::new());
        let log = Arc::new(EventLog::new(
            storage,
            Arc::new(HashEngine::generate()),
            SessionId::new(),
        ));
        let provider = RecordingProvider::new(boxed, log);
        assert_eq!(provider.complete_simple("hi").await.unwrap(), "boxed");
        assert_eq!(provider.log().events().unwrap().len(), 1);
    }
}
