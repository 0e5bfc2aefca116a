//! Configuration management for the eldervoice client

use std::time::Duration;

use crate::Result;

/// Default assistant backend URL
const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Eldervoice client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Assistant backend base URL
    pub api_url: String,

    /// Voice feedback configuration
    pub voice: VoiceConfig,

    /// Status reset delays
    pub timing: TimingConfig,
}

/// Speech feedback configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable spoken feedback
    pub enabled: bool,

    /// Interface language (BCP 47, e.g. "fr-FR")
    pub language: String,

    /// TTS endpoint (OpenAI-compatible speech API)
    pub tts_url: String,

    /// API key for the TTS endpoint
    pub tts_api_key: Option<String>,

    /// TTS model identifier
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// Speaking rate multiplier (slowed down for the target audience)
    pub rate: f32,

    /// Voice pitch multiplier
    pub pitch: f32,

    /// Playback volume in [0, 1]
    pub volume: f32,
}

/// Delays for the timed status resets
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Delay before an error status reverts to ready
    pub error_reset: Duration,

    /// Delay before the emergency status reverts to ready
    pub emergency_reset: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            error_reset: Duration::from_secs(5),
            emergency_reset: Duration::from_secs(8),
        }
    }
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if a delay variable is set but not a valid integer
    pub fn load(api_url: Option<String>, disable_voice: bool) -> Result<Self> {
        let api_url = api_url
            .or_else(|| std::env::var("ELDERVOICE_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let language =
            std::env::var("ELDERVOICE_LANGUAGE").unwrap_or_else(|_| "fr-FR".to_string());

        let voice = VoiceConfig {
            enabled: !disable_voice,
            language,
            tts_url: std::env::var("ELDERVOICE_TTS_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/audio/speech".to_string()),
            tts_api_key: std::env::var("OPENAI_API_KEY").ok(),
            tts_model: std::env::var("ELDERVOICE_TTS_MODEL")
                .unwrap_or_else(|_| "tts-1".to_string()),
            tts_voice: std::env::var("ELDERVOICE_TTS_VOICE")
                .unwrap_or_else(|_| "alloy".to_string()),
            rate: 0.85,
            pitch: 1.0,
            volume: 1.0,
        };

        if disable_voice {
            tracing::info!("spoken feedback explicitly disabled via --disable-voice");
        }

        let timing = TimingConfig {
            error_reset: delay_from_env("ELDERVOICE_ERROR_RESET_SECS", 5)?,
            emergency_reset: delay_from_env("ELDERVOICE_EMERGENCY_RESET_SECS", 8)?,
        };

        Ok(Self {
            api_url,
            voice,
            timing,
        })
    }
}

/// Read a delay in whole seconds from the environment
fn delay_from_env(var: &str, default_secs: u64) -> Result<Duration> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| crate::Error::Config(format!("invalid {var}={raw}: {e}"))),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_uses_short_and_long_delays() {
        let timing = TimingConfig::default();
        assert_eq!(timing.error_reset, Duration::from_secs(5));
        assert_eq!(timing.emergency_reset, Duration::from_secs(8));
        assert!(timing.error_reset < timing.emergency_reset);
    }
}
