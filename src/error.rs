//! Error types for the eldervoice client

use thiserror::Error;

/// Result type alias for eldervoice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the eldervoice client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Assistant service failed the startup reachability probe
    #[error("assistant service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Microphone missing or permission denied
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    /// Remote submission failed (network or non-2xx response)
    #[error("remote error: {0}")]
    Remote(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
