//! Speech feedback
//!
//! Fire-and-forget text-to-speech: `speak` returns immediately, and starting
//! a new utterance cancels the one in progress so at most one is audible at
//! a time.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::VoiceConfig;
use crate::voice::playback;
use crate::{Error, Result};

/// Voice rendering parameters
#[derive(Debug, Clone)]
pub struct SpeechOptions {
    /// Utterance language (BCP 47)
    pub language: String,

    /// Preferred voice language prefix (e.g. "fr")
    pub voice_language_prefix: String,

    /// Speaking rate multiplier
    pub rate: f32,

    /// Voice pitch multiplier (not honored by every synthesis backend)
    pub pitch: f32,

    /// Playback volume in [0, 1]
    pub volume: f32,
}

impl From<&VoiceConfig> for SpeechOptions {
    fn from(config: &VoiceConfig) -> Self {
        let prefix = config
            .language
            .split('-')
            .next()
            .unwrap_or(&config.language)
            .to_string();
        Self {
            language: config.language.clone(),
            voice_language_prefix: prefix,
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
        }
    }
}

/// Converts reply text to spoken audio
pub trait SpeechFeedback: Send + Sync {
    /// Speak the given text, cancelling any in-progress utterance
    fn speak(&self, text: &str);
}

/// Tracks the utterance currently being synthesized or played
struct ActiveUtterance {
    cancel: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<()>,
}

/// Speech feedback over an OpenAI-compatible speech endpoint
pub struct VoiceFeedback {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    voice: String,
    options: SpeechOptions,
    active: Mutex<Option<ActiveUtterance>>,
}

impl VoiceFeedback {
    /// Create speech feedback from the voice configuration
    ///
    /// # Errors
    ///
    /// Returns error if no TTS API key is configured
    pub fn new(config: &VoiceConfig) -> Result<Self> {
        let api_key = config
            .tts_api_key
            .clone()
            .ok_or_else(|| Error::Config("TTS API key required for spoken feedback".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            url: config.tts_url.clone(),
            api_key,
            model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
            options: SpeechOptions::from(config),
            active: Mutex::new(None),
        })
    }

    /// Synthesize text to MP3 bytes
    async fn synthesize(
        client: reqwest::Client,
        url: String,
        api_key: String,
        model: String,
        voice: String,
        rate: f32,
        text: String,
    ) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &model,
            input: &text,
            voice: &voice,
            speed: rate,
        };

        let response = client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("speech synthesis error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

impl SpeechFeedback for VoiceFeedback {
    fn speak(&self, text: &str) {
        tracing::debug!(
            chars = text.len(),
            language = %self.options.language,
            voice_prefix = %self.options.voice_language_prefix,
            "speaking"
        );

        let cancel = Arc::new(AtomicBool::new(false));
        let playback_cancel = Arc::clone(&cancel);

        let client = self.client.clone();
        let url = self.url.clone();
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        let voice = self.voice.clone();
        let rate = self.options.rate;
        let volume = self.options.volume;
        let text = text.to_string();

        // Silence the previous utterance before the new one can start
        if let Some(previous) = self.active.lock().expect("utterance slot poisoned").take() {
            previous.cancel.store(true, Ordering::Relaxed);
            previous.task.abort();
        }

        let task = tokio::spawn(async move {
            let audio =
                match Self::synthesize(client, url, api_key, model, voice, rate, text).await {
                    Ok(audio) => audio,
                    Err(e) => {
                        tracing::warn!(error = %e, "speech synthesis failed");
                        return;
                    }
                };

            if playback_cancel.load(Ordering::Relaxed) {
                return;
            }

            let result = tokio::task::spawn_blocking(move || {
                playback::play_mp3(&audio, volume, &playback_cancel)
            })
            .await;

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "speech playback failed"),
                Err(e) => tracing::warn!(error = %e, "speech playback task failed"),
            }
        });

        *self.active.lock().expect("utterance slot poisoned") =
            Some(ActiveUtterance { cancel, task });
    }
}

/// Speech feedback that only logs (headless or voice-disabled operation)
pub struct MutedSpeech;

impl SpeechFeedback for MutedSpeech {
    fn speak(&self, text: &str) {
        tracing::debug!(chars = text.len(), "spoken feedback muted");
    }
}
