//! Interaction state machine integration tests
//!
//! Exercises the orchestrator through mock collaborators: no audio hardware,
//! no network, and virtual time for the exact-delay assertions.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use eldervoice::{Intent, Orchestrator, QuickAction, Status, TimingConfig};

mod common;
use common::{MockAssistant, RecordingSpeech, settle_tasks, test_artifact};

/// Build an orchestrator around the given mock backend
fn harness(remote: Arc<MockAssistant>) -> (Arc<Orchestrator>, Arc<RecordingSpeech>) {
    let speech = Arc::new(RecordingSpeech::default());
    let orchestrator = Arc::new(Orchestrator::new(
        remote,
        Arc::clone(&speech) as Arc<dyn eldervoice::SpeechFeedback>,
        TimingConfig::default(),
    ));
    (orchestrator, speech)
}

#[tokio::test]
async fn test_success_speaks_exactly_what_it_displays() {
    let remote = Arc::new(MockAssistant::healthy().reply(json!({
        "success": true,
        "intent": "get_time",
        "transcription": "quelle heure est-il",
        "tts_text": "Il est dix heures.",
        "confidence": 0.93,
    })));
    let (orchestrator, speech) = harness(Arc::clone(&remote));

    orchestrator.start().await;
    orchestrator.quick_action(QuickAction::GetTime).await;

    let snapshot = orchestrator.snapshot();
    let result = snapshot.result.expect("result settled");
    assert!(result.success);
    assert_eq!(result.intent, Intent::GetTime);
    assert_eq!(result.response_text, "Il est dix heures.");
    assert_eq!(speech.last_spoken().as_deref(), Some("Il est dix heures."));
    assert_eq!(snapshot.status, Status::Ready);
    assert!(!snapshot.busy);
    assert_eq!(remote.calls(), vec!["text:quelle heure est-il"]);
}

#[tokio::test]
async fn test_requests_while_busy_are_rejected_not_queued() {
    let (mock, gate) = MockAssistant::healthy()
        .reply(json!({"success": true, "intent": "get_time", "tts_text": "Il est midi."}))
        .gated();
    let remote = Arc::new(mock);
    let (orchestrator, _speech) = harness(Arc::clone(&remote));

    orchestrator.start().await;

    let in_flight = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.quick_action(QuickAction::GetTime).await })
    };
    settle_tasks().await;

    let held = orchestrator.snapshot();
    assert!(held.busy);
    assert_eq!(held.status, Status::Executing);

    // A second quick action and a capture start must be plain no-ops
    orchestrator.quick_action(QuickAction::GetWeather).await;
    assert!(!orchestrator.begin_capture());
    let unchanged = orchestrator.snapshot();
    assert_eq!(unchanged.status, Status::Executing);
    assert!(unchanged.result.is_none());

    gate.notify_one();
    in_flight.await.expect("submission task");

    // Only the first submission ever reached the backend
    assert_eq!(remote.calls(), vec!["text:quelle heure est-il"]);
    assert_eq!(orchestrator.snapshot().status, Status::Ready);
}

#[tokio::test]
async fn test_every_fallback_entry_fabricates_a_local_success() {
    for action in QuickAction::ALL {
        let remote = Arc::new(MockAssistant::healthy().fail());
        let (orchestrator, speech) = harness(remote);

        orchestrator.start().await;
        orchestrator.quick_action(action).await;

        let snapshot = orchestrator.snapshot();
        let result = snapshot.result.expect("fallback result");
        assert!(result.success, "{action:?} fallback must be success-shaped");
        assert_eq!(result.confidence, Some(1.0));
        assert_eq!(result.transcription, action.command_phrase());
        assert_eq!(result.intent, action.intent());

        // Degrades silently: no error status on this path
        assert_eq!(snapshot.status, Status::Ready);
        assert!(!snapshot.busy);

        // Spoken fallback matches the displayed text
        assert_eq!(speech.last_spoken().as_deref(), Some(result.response_text.as_str()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_emergency_reverts_after_the_long_delay() {
    let remote = Arc::new(MockAssistant::healthy());
    let (orchestrator, speech) = harness(remote);

    orchestrator.start().await;
    orchestrator.emergency();
    settle_tasks().await;

    let snapshot = orchestrator.snapshot();
    let result = snapshot.result.expect("emergency result");
    assert_eq!(result.intent, Intent::EmergencyAlert);
    assert!(result.success);
    assert_eq!(result.transcription, "Urgence ! Au secours !");
    assert_eq!(snapshot.status, Status::Emergency);

    // The spoken short form is exactly what the result displays
    assert_eq!(speech.last_spoken().as_deref(), Some(result.response_text.as_str()));

    // The short (error) delay must not revert it
    tokio::time::advance(Duration::from_millis(7_999)).await;
    settle_tasks().await;
    assert_eq!(orchestrator.snapshot().status, Status::Emergency);

    tokio::time::advance(Duration::from_millis(2)).await;
    settle_tasks().await;
    let reverted = orchestrator.snapshot();
    assert_eq!(reverted.status, Status::Ready);
    // The emergency result itself stays on display
    assert_eq!(reverted.result.expect("result kept").intent, Intent::EmergencyAlert);
}

#[tokio::test(start_paused = true)]
async fn test_failed_voice_submission_shows_error_then_recovers() {
    let remote = Arc::new(MockAssistant::healthy().fail());
    let (orchestrator, speech) = harness(remote);

    orchestrator.start().await;
    assert!(orchestrator.begin_capture());
    orchestrator.complete_capture(test_artifact()).await;
    settle_tasks().await;

    let snapshot = orchestrator.snapshot();
    let result = snapshot.result.expect("synthetic failure result");
    assert!(!result.success);
    assert_eq!(result.intent, Intent::Unknown);
    assert!(!result.response_text.is_empty());
    assert_eq!(snapshot.status, Status::ErrorMic);
    assert!(!snapshot.busy);

    // The failure path is silent; nothing was spoken
    assert!(speech.spoken().is_empty());

    tokio::time::advance(Duration::from_millis(4_999)).await;
    settle_tasks().await;
    assert_eq!(orchestrator.snapshot().status, Status::ErrorMic);

    tokio::time::advance(Duration::from_millis(2)).await;
    settle_tasks().await;
    assert_eq!(orchestrator.snapshot().status, Status::Ready);
}

#[tokio::test]
async fn test_get_time_round_trip_online_and_offline() {
    // Healthy remote: the reply text is used verbatim
    let remote = Arc::new(MockAssistant::healthy().reply(json!({
        "success": true,
        "intent": "get_time",
        "tts_text": "It is 10:00",
    })));
    let (orchestrator, _speech) = harness(remote);
    orchestrator.start().await;
    orchestrator.quick_action(QuickAction::GetTime).await;
    let online = orchestrator.snapshot().result.expect("online result");
    assert_eq!(online.response_text, "It is 10:00");

    // Failing remote: a freshly computed local time string, never the literal
    let remote = Arc::new(MockAssistant::healthy().fail());
    let (orchestrator, _speech) = harness(remote);
    orchestrator.start().await;
    orchestrator.quick_action(QuickAction::GetTime).await;
    let offline = orchestrator.snapshot().result.expect("offline result");
    assert!(offline.response_text.starts_with("Il est actuellement"));
    assert_ne!(offline.response_text, "It is 10:00");
}

#[tokio::test(start_paused = true)]
async fn test_stale_reset_never_clobbers_a_newer_status() {
    let remote = Arc::new(MockAssistant::healthy().fail());
    let (orchestrator, _speech) = harness(remote);

    orchestrator.start().await;
    assert!(orchestrator.begin_capture());
    orchestrator.complete_capture(test_artifact()).await;
    assert_eq!(orchestrator.snapshot().status, Status::ErrorMic);

    // Two seconds in, an emergency takes over
    tokio::time::advance(Duration::from_secs(2)).await;
    settle_tasks().await;
    orchestrator.emergency();
    settle_tasks().await;
    assert_eq!(orchestrator.snapshot().status, Status::Emergency);

    // The error reset scheduled at t=0 comes due at t=5 and must be inert
    tokio::time::advance(Duration::from_millis(3_500)).await;
    settle_tasks().await;
    assert_eq!(orchestrator.snapshot().status, Status::Emergency);

    // The emergency reset (t=2+8s) is the one that lands
    tokio::time::advance(Duration::from_millis(4_501)).await;
    settle_tasks().await;
    assert_eq!(orchestrator.snapshot().status, Status::Ready);
}

#[tokio::test]
async fn test_unmapped_identifier_is_a_silent_no_op() {
    let remote = Arc::new(MockAssistant::healthy());
    let (orchestrator, speech) = harness(Arc::clone(&remote));

    orchestrator.start().await;
    orchestrator.dispatch_action("open_pod_bay_doors").await;

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, Status::Ready);
    assert!(snapshot.result.is_none());
    assert!(remote.calls().is_empty());
    assert!(speech.spoken().is_empty());
}

#[tokio::test]
async fn test_failed_health_probe_disables_capture_but_not_quick_actions() {
    let remote = Arc::new(MockAssistant::unreachable().fail());
    let (orchestrator, _speech) = harness(remote);

    orchestrator.start().await;
    assert_eq!(orchestrator.snapshot().status, Status::ErrorService);
    assert!(!orchestrator.capture_enabled());
    assert!(!orchestrator.begin_capture());

    // Quick actions still work offline through the fallback table
    orchestrator.quick_action(QuickAction::GetWeather).await;
    let result = orchestrator.snapshot().result.expect("fallback result");
    assert!(result.success);

    // Capture stays disabled until an external restart
    assert!(!orchestrator.begin_capture());
}

#[tokio::test]
async fn test_refresh_counter_ticks_once_per_settled_interaction() {
    let remote = Arc::new(
        MockAssistant::healthy()
            .reply(json!({"success": true, "intent": "get_time", "tts_text": "Il est midi."}))
            .fail() // quick action → fallback
            .fail(), // voice → failure result
    );
    let (orchestrator, _speech) = harness(remote);
    let refresh = orchestrator.refresh_signal();

    orchestrator.start().await;
    assert_eq!(*refresh.borrow(), 0);

    orchestrator.quick_action(QuickAction::GetTime).await;
    assert_eq!(*refresh.borrow(), 1);

    orchestrator.quick_action(QuickAction::GetWeather).await;
    assert_eq!(*refresh.borrow(), 2);

    orchestrator.emergency();
    assert_eq!(*refresh.borrow(), 3);

    // A failed voice submission settles without anything to refetch
    assert!(orchestrator.begin_capture());
    orchestrator.complete_capture(test_artifact()).await;
    assert_eq!(*refresh.borrow(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_late_settling_submission_overwrites_the_emergency_result() {
    let (mock, gate) = MockAssistant::healthy()
        .reply(json!({"success": true, "intent": "get_time", "tts_text": "Il est midi."}))
        .gated();
    let remote = Arc::new(mock);
    let (orchestrator, speech) = harness(remote);

    orchestrator.start().await;
    assert!(orchestrator.begin_capture());

    let in_flight = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.complete_capture(test_artifact()).await })
    };
    settle_tasks().await;
    assert_eq!(orchestrator.snapshot().status, Status::Processing);

    // Emergency mid-processing: not gated by busy, takes over immediately
    orchestrator.emergency();
    settle_tasks().await;
    let emergency = orchestrator.snapshot();
    assert_eq!(emergency.status, Status::Emergency);
    assert_eq!(
        emergency.result.expect("emergency result").intent,
        Intent::EmergencyAlert
    );

    // The in-flight submission settles later and wins
    gate.notify_one();
    in_flight.await.expect("submission task");
    let settled = orchestrator.snapshot();
    assert_eq!(settled.status, Status::Ready);
    let result = settled.result.expect("settled result");
    assert_eq!(result.intent, Intent::GetTime);
    assert_eq!(result.response_text, "Il est midi.");
    assert_eq!(speech.last_spoken().as_deref(), Some("Il est midi."));

    // The emergency's pending reset is stale and must stay inert
    tokio::time::advance(Duration::from_secs(9)).await;
    settle_tasks().await;
    assert_eq!(orchestrator.snapshot().status, Status::Ready);
}
