//! Shared test utilities

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use eldervoice::voice::SpeechFeedback;
use eldervoice::{AssistantReply, AudioArtifact, Error, RemoteAssistant, Result};

/// One scripted remote outcome
pub enum Scripted {
    Reply(serde_json::Value),
    Fail,
}

/// Scriptable in-memory assistant backend
///
/// Pops one scripted outcome per submission and records every call. An
/// optional gate makes submissions block until released, to hold the
/// orchestrator in its busy window.
pub struct MockAssistant {
    healthy: bool,
    replies: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl MockAssistant {
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            healthy: false,
            ..Self::healthy()
        }
    }

    /// Queue a successful reply payload
    #[must_use]
    pub fn reply(self, payload: serde_json::Value) -> Self {
        self.replies.lock().unwrap().push_back(Scripted::Reply(payload));
        self
    }

    /// Queue a remote failure
    #[must_use]
    pub fn fail(self) -> Self {
        self.replies.lock().unwrap().push_back(Scripted::Fail);
        self
    }

    /// Block submissions until the returned handle is notified
    #[must_use]
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    /// Submissions recorded so far
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn settle(&self) -> Result<AssistantReply> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Scripted::Reply(payload)) => Ok(serde_json::from_value(payload)?),
            Some(Scripted::Fail) | None => Err(Error::Remote("scripted failure".to_string())),
        }
    }
}

#[async_trait]
impl RemoteAssistant for MockAssistant {
    async fn health_check(&self) -> Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(Error::ServiceUnavailable("scripted outage".to_string()))
        }
    }

    async fn submit_voice(&self, _artifact: &AudioArtifact) -> Result<AssistantReply> {
        self.calls.lock().unwrap().push("voice".to_string());
        self.settle().await
    }

    async fn submit_text(&self, command: &str) -> Result<AssistantReply> {
        self.calls.lock().unwrap().push(format!("text:{command}"));
        self.settle().await
    }
}

/// Speech feedback that records every utterance
#[derive(Default)]
pub struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeech {
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last_spoken(&self) -> Option<String> {
        self.spoken.lock().unwrap().last().cloned()
    }
}

impl SpeechFeedback for RecordingSpeech {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

/// A minimal submission artifact
#[must_use]
pub fn test_artifact() -> AudioArtifact {
    AudioArtifact {
        data: vec![0; 64],
        mime: "audio/wav",
    }
}

/// Let spawned tasks and due timers run
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
