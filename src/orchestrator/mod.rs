//! Interaction orchestrator
//!
//! Owns the interaction state machine: capture events, quick actions,
//! remote replies, and the emergency override are turned into one canonical
//! [`InteractionResult`], with offline fallback policy, speech feedback
//! triggering, and a refresh signal for the dashboard panels.
//!
//! State is mutated only here; observers get read-only snapshots through a
//! watch channel. Deferred status resets are tagged with the session
//! generation current at scheduling time, so a stale timer firing after a
//! newer transition is inert.

mod actions;

pub use actions::QuickAction;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::client::{AssistantReply, RemoteAssistant};
use crate::config::TimingConfig;
use crate::result::{InteractionResult, Intent, TRANSCRIPTION_SENTINEL};
use crate::voice::{AudioArtifact, SpeechFeedback};

/// Spoken apology when voice processing fails
const VOICE_FAILURE_TEXT: &str =
    "Désolé, je n'ai pas pu traiter votre demande. Veuillez réessayer.";

/// Fixed transcription recorded for an emergency trigger
const EMERGENCY_TRANSCRIPTION: &str = "Urgence ! Au secours !";

/// Long-form emergency notice (display)
const EMERGENCY_LONG_TEXT: &str = "🚨 ALERTE URGENCE ! J'ai prévenu vos contacts d'urgence : \
     Mohamed, Fatma, SAMU. Restez calme, de l'aide arrive. Le SAMU a été contacté au 190.";

/// Short-form emergency notice (spoken)
const EMERGENCY_SPOKEN_TEXT: &str = "Alerte urgence ! J'ai prévenu vos contacts d'urgence. \
     Mohamed et Fatma ont été contactés. Le SAMU a été appelé au 190. \
     Restez calme, de l'aide arrive.";

/// User-visible interaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Startup health probe in progress
    Checking,
    /// Resting state, ready to listen
    Ready,
    /// Microphone capture in progress
    Recording,
    /// Voice submission in flight
    Processing,
    /// Quick-action submission in flight
    Executing,
    /// Health probe failed; capture disabled
    ErrorService,
    /// Voice submission failed
    ErrorMic,
    /// Emergency alert in progress
    Emergency,
}

impl Status {
    /// Fixed status line shown to the user
    #[must_use]
    pub const fn display_text(self) -> &'static str {
        match self {
            Self::Checking => "🔄 Vérification de la connexion…",
            Self::Ready => "✅ Prêt à vous écouter",
            Self::Recording => "🔴 Parlez maintenant… Appuyez pour arrêter",
            Self::Processing => "⏳ Traitement en cours…",
            Self::Executing => "⏳ Exécution en cours…",
            Self::ErrorService => "❌ Service non disponible — réessayez",
            Self::ErrorMic => "❌ Erreur de communication",
            Self::Emergency => "🚨 ALERTE URGENCE EN COURS…",
        }
    }
}

/// Read-only view of the orchestrator state
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Current status
    pub status: Status,
    /// Whether a submission is in flight
    pub busy: bool,
    /// Latest settled result, if any
    pub result: Option<InteractionResult>,
}

/// Mutable session state, owned by the orchestrator
struct SessionState {
    status: Status,
    busy: bool,
    service_ok: bool,
    generation: u64,
    result: Option<InteractionResult>,
    refreshes: u64,
}

/// State plus the observer channels, shared with deferred reset tasks
struct Shared {
    state: Mutex<SessionState>,
    snapshot_tx: watch::Sender<Snapshot>,
    refresh_tx: watch::Sender<u64>,
}

impl Shared {
    /// Publish the current state to observers; call with the lock held
    fn publish(&self, state: &SessionState) {
        let _ = self.snapshot_tx.send(Snapshot {
            status: state.status,
            busy: state.busy,
            result: state.result.clone(),
        });
    }

    /// Apply a deferred return to ready, unless the session has moved on
    fn apply_reset(&self, generation: u64) {
        let mut state = self.state.lock().expect("session state poisoned");
        if state.generation == generation {
            state.status = Status::Ready;
            self.publish(&state);
            tracing::debug!(generation, "status reset to ready");
        } else {
            tracing::debug!(
                scheduled = generation,
                current = state.generation,
                "stale status reset ignored"
            );
        }
    }
}

/// The voice interaction orchestrator
pub struct Orchestrator {
    remote: Arc<dyn RemoteAssistant>,
    speech: Arc<dyn SpeechFeedback>,
    timing: TimingConfig,
    shared: Arc<Shared>,
}

impl Orchestrator {
    /// Create an orchestrator in the pre-health-check state
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteAssistant>,
        speech: Arc<dyn SpeechFeedback>,
        timing: TimingConfig,
    ) -> Self {
        let initial = Snapshot {
            status: Status::Checking,
            busy: false,
            result: None,
        };
        let (snapshot_tx, _) = watch::channel(initial);
        let (refresh_tx, _) = watch::channel(0);

        Self {
            remote,
            speech,
            timing,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    status: Status::Checking,
                    busy: false,
                    service_ok: false,
                    generation: 0,
                    result: None,
                    refreshes: 0,
                }),
                snapshot_tx,
                refresh_tx,
            }),
        }
    }

    /// Run the one-shot startup health probe
    ///
    /// Failure leaves a persistent service-unavailable status and disables
    /// the capture entry point; there is no periodic retry.
    pub async fn start(&self) {
        match self.remote.health_check().await {
            Ok(()) => {
                let mut state = self.lock();
                state.service_ok = true;
                state.status = Status::Ready;
                state.generation += 1;
                self.shared.publish(&state);
            }
            Err(e) => {
                tracing::error!(error = %e, "assistant service unreachable, capture disabled");
                let mut state = self.lock();
                state.service_ok = false;
                state.status = Status::ErrorService;
                state.generation += 1;
                self.shared.publish(&state);
            }
        }
    }

    /// Subscribe to state snapshots
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Subscribe to the dashboard refresh counter
    ///
    /// Incremented once per settled interaction (success, fallback, or
    /// emergency); consumers re-fetch their own data on every tick.
    #[must_use]
    pub fn refresh_signal(&self) -> watch::Receiver<u64> {
        self.shared.refresh_tx.subscribe()
    }

    /// Current state snapshot
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            status: state.status,
            busy: state.busy,
            result: state.result.clone(),
        }
    }

    /// Whether a new capture may start
    #[must_use]
    pub fn capture_enabled(&self) -> bool {
        let state = self.lock();
        state.service_ok && !state.busy
    }

    /// Begin a capture session (transition to recording)
    ///
    /// Returns `false` without any state change when the service is
    /// unreachable, a submission is in flight, or a capture is already
    /// running.
    pub fn begin_capture(&self) -> bool {
        let mut state = self.lock();
        if !state.service_ok || state.busy || state.status == Status::Recording {
            tracing::debug!(
                service_ok = state.service_ok,
                busy = state.busy,
                status = ?state.status,
                "capture request rejected"
            );
            return false;
        }

        state.status = Status::Recording;
        state.generation += 1;
        self.shared.publish(&state);
        true
    }

    /// Roll back a recording status after a hardware-level capture failure
    ///
    /// The failure is surfaced to the user as a blocking notice by the
    /// caller; no result is produced here.
    pub fn capture_aborted(&self) {
        let mut state = self.lock();
        if state.status == Status::Recording {
            state.status = Status::Ready;
            state.generation += 1;
            self.shared.publish(&state);
        }
    }

    /// Submit a finalized capture artifact (recording → processing → settle)
    pub async fn complete_capture(&self, artifact: AudioArtifact) {
        {
            let mut state = self.lock();
            if state.busy {
                tracing::warn!("voice submission ignored, another submission is in flight");
                return;
            }
            state.busy = true;
            state.status = Status::Processing;
            state.generation += 1;
            self.shared.publish(&state);
        }

        match self.remote.submit_voice(&artifact).await {
            Ok(reply) => self.settle_with_reply(reply),
            Err(e) => {
                tracing::error!(error = %e, "voice processing failed");
                self.settle_voice_failure();
            }
        }
    }

    /// Dispatch a quick action by its string identifier
    ///
    /// Unmapped identifiers are ignored: no result, no status change.
    pub async fn dispatch_action(&self, id: &str) {
        match QuickAction::from_id(id) {
            Some(action) => self.quick_action(action).await,
            None => tracing::debug!(id, "unmapped quick action ignored"),
        }
    }

    /// Execute a quick action (executing → settle, degrading offline)
    pub async fn quick_action(&self, action: QuickAction) {
        {
            let mut state = self.lock();
            if state.busy {
                tracing::debug!(action = ?action, "quick action rejected, busy");
                return;
            }
            state.busy = true;
            state.status = Status::Executing;
            state.generation += 1;
            self.shared.publish(&state);
        }

        let phrase = action.command_phrase();
        match self.remote.submit_text(phrase).await {
            Ok(reply) => self.settle_with_reply(reply),
            Err(e) => {
                tracing::warn!(error = %e, action = ?action, "remote failed, using local fallback");
                self.settle_with_fallback(action);
            }
        }
    }

    /// Trigger the emergency alert override
    ///
    /// Available from any state and not gated by the busy flag. An in-flight
    /// submission is not cancelled; if it settles later, its result replaces
    /// this one (last settled wins).
    pub fn emergency(&self) {
        tracing::warn!("emergency alert triggered");

        let reply = AssistantReply {
            success: true,
            intent: Intent::EmergencyAlert,
            transcription: Some(EMERGENCY_TRANSCRIPTION.to_string()),
            tts_text: Some(EMERGENCY_SPOKEN_TEXT.to_string()),
            action_result: Some(EMERGENCY_LONG_TEXT.to_string()),
            confidence: Some(1.0),
            ..AssistantReply::default()
        };
        let spoken = reply.resolved_text();
        let result = reply.into_result();

        let generation = {
            let mut state = self.lock();
            state.result = Some(result);
            state.status = Status::Emergency;
            state.generation += 1;
            state.refreshes += 1;
            let _ = self.shared.refresh_tx.send(state.refreshes);
            self.shared.publish(&state);
            state.generation
        };

        if let Some(text) = spoken {
            self.speech.speak(&text);
        }
        self.schedule_reset(self.timing.emergency_reset, generation);
    }

    /// Re-speak the current result's response text
    pub fn replay_response(&self) {
        let text = {
            let state = self.lock();
            state.result.as_ref().map(|r| r.response_text.clone())
        };
        if let Some(text) = text {
            self.speech.speak(&text);
        }
    }

    /// Settle a submission with a parsed server reply
    fn settle_with_reply(&self, reply: AssistantReply) {
        let spoken = reply.resolved_text();
        let result = reply.into_result();

        {
            let mut state = self.lock();
            state.result = Some(result);
            state.status = Status::Ready;
            state.busy = false;
            state.generation += 1;
            state.refreshes += 1;
            let _ = self.shared.refresh_tx.send(state.refreshes);
            self.shared.publish(&state);
        }

        if let Some(text) = spoken {
            self.speech.speak(&text);
        }
    }

    /// Settle a failed voice submission with a synthetic failure result
    ///
    /// Shows the error status and schedules the short timed reset. No retry
    /// is attempted; the user re-initiates.
    fn settle_voice_failure(&self) {
        let result = InteractionResult {
            success: false,
            intent: Intent::Unknown,
            transcription: TRANSCRIPTION_SENTINEL.to_string(),
            response_text: VOICE_FAILURE_TEXT.to_string(),
            confidence: None,
            messages: Vec::new(),
        };

        let generation = {
            let mut state = self.lock();
            state.result = Some(result);
            state.status = Status::ErrorMic;
            state.busy = false;
            state.generation += 1;
            self.shared.publish(&state);
            state.generation
        };

        self.schedule_reset(self.timing.error_reset, generation);
    }

    /// Settle a failed quick action with the offline fallback table
    ///
    /// Degrades silently: the fabricated result is success-shaped, the
    /// canned phrase doubles as transcription, and no error status is shown.
    fn settle_with_fallback(&self, action: QuickAction) {
        let text = action.fallback_response();
        let reply = AssistantReply {
            success: true,
            intent: action.intent(),
            transcription: Some(action.command_phrase().to_string()),
            tts_text: Some(text.clone()),
            action_result: Some(text),
            confidence: Some(1.0),
            ..AssistantReply::default()
        };
        let spoken = reply.resolved_text();
        let result = reply.into_result();

        {
            let mut state = self.lock();
            state.result = Some(result);
            state.status = Status::Ready;
            state.busy = false;
            state.generation += 1;
            state.refreshes += 1;
            let _ = self.shared.refresh_tx.send(state.refreshes);
            self.shared.publish(&state);
        }

        if let Some(text) = spoken {
            self.speech.speak(&text);
        }
    }

    /// Schedule a deferred return to ready, tagged with `generation`
    fn schedule_reset(&self, delay: Duration, generation: u64) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.apply_reset(generation);
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.shared.state.lock().expect("session state poisoned")
    }
}
