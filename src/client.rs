//! Remote assistant client
//!
//! Thin request/response wrappers around the assistant backend: a one-shot
//! health probe, binary voice submission, and text command submission. The
//! reply payload is read defensively; several alternate field names are
//! tolerated and resolved by a fixed priority order.

use async_trait::async_trait;
use serde::Deserialize;

use crate::result::{
    FAILED_ACTION_TEXT, InteractionResult, Intent, MessageEntry, NO_RESPONSE_TEXT,
    TRANSCRIPTION_SENTINEL,
};
use crate::voice::AudioArtifact;
use crate::{Error, Result};

/// The assistant backend consumed by the orchestrator
#[async_trait]
pub trait RemoteAssistant: Send + Sync {
    /// One-shot reachability probe
    async fn health_check(&self) -> Result<()>;

    /// Submit a captured audio artifact for transcription and execution
    async fn submit_voice(&self, artifact: &AudioArtifact) -> Result<AssistantReply>;

    /// Submit a text command directly to the NLP pipeline
    async fn submit_text(&self, command: &str) -> Result<AssistantReply>;
}

/// Structured message payload nested in a reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyData {
    /// Message list for message-reading intents
    #[serde(default)]
    pub messages: Vec<MessageEntry>,
}

/// Raw reply payload from the assistant backend
///
/// Field names vary between backend versions, so every text field is
/// optional and resolution happens through [`AssistantReply::resolved_text`]
/// and [`AssistantReply::resolved_transcription`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantReply {
    /// Whether the backend executed the action
    #[serde(default)]
    pub success: bool,

    /// Detected intent tag
    #[serde(default)]
    pub intent: Intent,

    /// What the backend understood
    #[serde(default)]
    pub transcription: Option<String>,

    /// Alternate transcription field
    #[serde(default)]
    pub raw_text: Option<String>,

    /// Alternate transcription field
    #[serde(default)]
    pub text: Option<String>,

    /// Recognition confidence in [0, 1]
    #[serde(default)]
    pub confidence: Option<f32>,

    /// Spoken-form reply
    #[serde(default)]
    pub tts_text: Option<String>,

    /// Action result text
    #[serde(default)]
    pub action_result: Option<String>,

    /// Alternate reply field
    #[serde(default)]
    pub response_text: Option<String>,

    /// Alternate reply field
    #[serde(default)]
    pub message: Option<String>,

    /// Structured payload (message lists)
    #[serde(default, alias = "data")]
    pub action_data: Option<ReplyData>,
}

impl AssistantReply {
    /// Resolve the reply text by strict priority: spoken form, action
    /// result, then the generic reply fields. Blank fields are skipped.
    ///
    /// Returns `None` when no field carried usable text.
    #[must_use]
    pub fn resolved_text(&self) -> Option<String> {
        let candidates = [
            self.tts_text.as_deref(),
            self.action_result.as_deref(),
            self.response_text.as_deref(),
            self.message.as_deref(),
        ];

        candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Resolve the transcription, falling back to the display sentinel
    #[must_use]
    pub fn resolved_transcription(&self) -> String {
        let candidates = [
            self.transcription.as_deref(),
            self.raw_text.as_deref(),
            self.text.as_deref(),
        ];

        candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map_or_else(|| TRANSCRIPTION_SENTINEL.to_string(), ToOwned::to_owned)
    }

    /// Build the canonical result from this reply
    ///
    /// The resolved reply text feeds both display and speech, so the two can
    /// never diverge.
    #[must_use]
    pub fn into_result(self) -> InteractionResult {
        let transcription = self.resolved_transcription();
        let response_text = self.resolved_text().unwrap_or_else(|| {
            if self.success {
                NO_RESPONSE_TEXT.to_string()
            } else {
                FAILED_ACTION_TEXT.to_string()
            }
        });

        InteractionResult {
            success: self.success,
            intent: self.intent,
            transcription,
            response_text,
            confidence: self.confidence.map(|c| c.clamp(0.0, 1.0)),
            messages: self.action_data.map(|d| d.messages).unwrap_or_default(),
        }
    }
}

/// HTTP client for the assistant backend
pub struct AssistantClient {
    client: reqwest::Client,
    base_url: String,
}

impl AssistantClient {
    /// Create a client for the given backend base URL
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RemoteAssistant for AssistantClient {
    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(url = %url, "assistant service reachable");
            Ok(())
        } else {
            Err(Error::ServiceUnavailable(format!(
                "health probe returned {status}"
            )))
        }
    }

    async fn submit_voice(&self, artifact: &AudioArtifact) -> Result<AssistantReply> {
        tracing::debug!(bytes = artifact.data.len(), mime = artifact.mime, "submitting voice");

        let part = reqwest::multipart::Part::bytes(artifact.data.clone())
            .file_name("recording.wav")
            .mime_str(artifact.mime)
            .map_err(|e| Error::Remote(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("audio_file", part);

        let response = self
            .client
            .post(format!("{}/api/process-voice", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "voice submission failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "voice pipeline error");
            return Err(Error::Remote(format!("voice pipeline error {status}")));
        }

        let reply: AssistantReply = response.json().await?;
        tracing::info!(intent = ?reply.intent, success = reply.success, "voice reply received");
        Ok(reply)
    }

    async fn submit_text(&self, command: &str) -> Result<AssistantReply> {
        #[derive(serde::Serialize)]
        struct TextCommand<'a> {
            text: &'a str,
        }

        tracing::debug!(command, "submitting text command");

        let response = self
            .client
            .post(format!("{}/api/process-text", self.base_url))
            .json(&TextCommand { text: command })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "text submission failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "text pipeline error");
            return Err(Error::Remote(format!("text pipeline error {status}")));
        }

        let reply: AssistantReply = response.json().await?;
        tracing::info!(intent = ?reply.intent, success = reply.success, "text reply received");
        Ok(reply)
    }
}
