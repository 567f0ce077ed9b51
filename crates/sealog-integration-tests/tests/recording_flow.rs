//! Model calls recorded through the provider decorator, then replayed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sealog_audit::{EventLog, EventStorage, FileEventStorage, IntegrityVerifier};
use sealog_core::{LLM_INTERACTION, SessionId, Value};
use sealog_crypto::HashEngine;
use sealog_llm::{
    LlmError, LlmProvider, LlmResponse, LlmResult, Message, RecordingProvider, StopReason, Usage,
};
use sealog_replay::ReplayEngine;

/// Replies after a scripted delay per call; `None` fails the call.
struct ScriptedProvider {
    delays_ms: Vec<Option<u64>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(delays_ms: Vec<Option<u64>>) -> Self {
        Self {
            delays_ms,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-large"
    }

    async fn complete(&self, messages: &[Message], _system: &str) -> LlmResult<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(delay) = self.delays_ms.get(call).copied().flatten() else {
            return Err(LlmError::ApiRequestFailed("scripted failure".to_owned()));
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(LlmResponse {
            message: Message::assistant(format!("reply {call}")),
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: messages.len(),
                output_tokens: 3,
            },
        })
    }

    fn max_context_length(&self) -> usize {
        8_192
    }
}

#[tokio::test]
async fn test_recorded_calls_replay_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let engine = Arc::new(HashEngine::generate());
    let session = SessionId::new();

    let log = Arc::new(EventLog::open(&path, Arc::clone(&engine), session.clone()).unwrap());
    let provider = RecordingProvider::new(
        ScriptedProvider::new(vec![Some(5), Some(5), Some(5), Some(5), Some(400)]),
        Arc::clone(&log),
    );

    let mut conversation = vec![Message::system("be brief")];
    for turn in 0..5 {
        conversation.push(Message::user(format!("question {turn}")));
        let response = provider.complete(&conversation, "").await.unwrap();
        conversation.push(response.message);
    }

    let storage = FileEventStorage::open(&path).unwrap();
    assert_eq!(storage.count().unwrap(), 5);

    let replay = ReplayEngine::from_storage(&storage, &session, IntegrityVerifier::new(engine))
        .unwrap();
    let timeline = replay.decision_timeline();
    assert_eq!(timeline.len(), 5);
    assert!(timeline.iter().all(|d| d.model == "scripted-large"));
    assert_eq!(timeline[0].message_count, 2);
    assert_eq!(timeline[4].message_count, 10);
    assert_eq!(timeline[2].response_length, "reply 2".len());

    let metrics = replay.session_metrics();
    let summary = metrics.summary().unwrap();
    assert_eq!(summary.interaction_count, 5);
    assert_eq!(summary.total_token_usage.get("output_tokens"), Some(&15));
    assert!(summary.all_hashes_valid);

    let anomalies = replay.anomaly_detection();
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].event_id, timeline[4].event_id);
}

#[tokio::test]
async fn test_failed_calls_are_recorded_too() {
    let log = Arc::new(EventLog::in_memory(HashEngine::generate()));
    let provider =
        RecordingProvider::new(ScriptedProvider::new(vec![Some(1), None]), Arc::clone(&log));

    assert!(provider.complete_simple("first").await.is_ok());
    assert!(provider.complete_simple("second").await.is_err());

    let events = log.events().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.event_type == LLM_INTERACTION));

    let failed = events[1].payload_value().unwrap();
    assert!(failed.get("error").and_then(Value::as_str).is_some());
    assert!(failed.get("usage").is_none());
    assert!(log.verify().unwrap().all_valid);
}

#[tokio::test]
async fn test_concurrent_calls_share_one_log() {
    let log = Arc::new(EventLog::in_memory(HashEngine::generate()));
    let provider = Arc::new(RecordingProvider::new(
        ScriptedProvider::new(vec![Some(1); 16]),
        Arc::clone(&log),
    ));

    let mut handles = Vec::new();
    for n in 0..16 {
        let provider = Arc::clone(&provider);
        handles.push(tokio::spawn(async move {
            provider.complete_simple(&format!("q{n}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let report = log.verify().unwrap();
    assert_eq!(report.total_events, 16);
    assert!(report.all_valid);
}
