//! Eldervoice - voice assistant client for elderly users
//!
//! This library provides the core of the eldervoice client:
//! - The interaction orchestrator (state machine, fallback policy,
//!   emergency override, refresh signalling)
//! - Microphone capture into a single submission artifact
//! - Speech feedback with at-most-one-utterance playback
//! - The remote assistant HTTP client and dashboard fetches
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Shell / UI                       │
//! │   mic toggle  │  quick actions  │  SOS  │  panels   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Interaction Orchestrator                │
//! │   state machine │ fallback table │ refresh signal   │
//! └──────┬──────────────────┬─────────────────┬─────────┘
//!        │                  │                 │
//! ┌──────▼──────┐   ┌───────▼───────┐  ┌──────▼────────┐
//! │   Capture    │   │   Assistant   │  │    Speech     │
//! │  (cpal/wav)  │   │  (HTTP API)   │  │  (TTS/cpal)   │
//! └─────────────┘   └───────────────┘  └───────────────┘
//! ```

pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod orchestrator;
pub mod result;
pub mod voice;

pub use client::{AssistantClient, AssistantReply, RemoteAssistant};
pub use config::{Config, TimingConfig, VoiceConfig};
pub use dashboard::{DashboardClient, DashboardOverview};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, QuickAction, Snapshot, Status};
pub use result::{InteractionResult, Intent, MessageDirection, MessageEntry};
pub use voice::{
    AudioArtifact, CaptureSession, MutedSpeech, SAMPLE_RATE, SpeechFeedback, VoiceFeedback,
};
