//! Voice capture and speech feedback
//!
//! Capture bridges the microphone to a single finalized audio artifact;
//! speech feedback turns reply text into audio, keeping at most one
//! utterance audible at a time.

mod capture;
mod playback;
mod speech;

pub use capture::{AudioArtifact, CaptureSession, SAMPLE_RATE, samples_to_wav};
pub use playback::{play_mp3, play_samples};
pub use speech::{MutedSpeech, SpeechFeedback, SpeechOptions, VoiceFeedback};
