use std::io::Cursor;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use eldervoice::dashboard::DashboardClient;
use eldervoice::voice::{CaptureSession, MutedSpeech, SpeechFeedback, VoiceFeedback, play_samples};
use eldervoice::{
    AssistantClient, Config, InteractionResult, Orchestrator, QuickAction, RemoteAssistant,
    Snapshot, Status,
};

/// Eldervoice - voice assistant client for elderly users
#[derive(Parser)]
#[command(name = "eldervoice", version, about)]
struct Cli {
    /// Assistant backend base URL
    #[arg(long, env = "ELDERVOICE_API_URL")]
    api_url: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable spoken feedback (for headless use without audio hardware)
    #[arg(long, env = "ELDERVOICE_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,eldervoice=info",
        1 => "info,eldervoice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
        };
    }

    let config = Config::load(cli.api_url, cli.disable_voice)?;
    tracing::info!(api_url = %config.api_url, "starting eldervoice client");

    let remote: Arc<dyn RemoteAssistant> = Arc::new(AssistantClient::new(&config.api_url));

    let speech: Arc<dyn SpeechFeedback> = if config.voice.enabled {
        match VoiceFeedback::new(&config.voice) {
            Ok(feedback) => Arc::new(feedback),
            Err(e) => {
                tracing::info!(error = %e, "spoken feedback unavailable, running muted");
                Arc::new(MutedSpeech)
            }
        }
    } else {
        Arc::new(MutedSpeech)
    };

    let orchestrator = Arc::new(Orchestrator::new(remote, speech, config.timing));

    tokio::spawn(render_status(orchestrator.subscribe()));
    tokio::spawn(watch_dashboard(
        DashboardClient::new(&config.api_url),
        orchestrator.refresh_signal(),
    ));

    // One-shot startup gate; a failure disables capture but the shell keeps
    // running so quick actions can degrade to their offline fallbacks
    orchestrator.start().await;
    if orchestrator.snapshot().status == Status::ErrorService {
        println!("(les actions rapides restent disponibles en mode hors-ligne)");
    }

    print_help();
    shell_loop(&orchestrator).await
}

/// Interactive command loop
async fn shell_loop(orchestrator: &Arc<Orchestrator>) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut session: Option<CaptureSession> = None;

    while let Some(line) = lines.next_line().await? {
        let command = line.trim().to_lowercase();
        match command.as_str() {
            "talk" | "t" => {
                if let Some(active) = session.take() {
                    match active.finish() {
                        Ok(artifact) => orchestrator.complete_capture(artifact).await,
                        Err(e) => {
                            orchestrator.capture_aborted();
                            eprintln!("Enregistrement perdu : {e}");
                        }
                    }
                } else if orchestrator.begin_capture() {
                    match CaptureSession::begin() {
                        Ok(active) => session = Some(active),
                        Err(e) => {
                            orchestrator.capture_aborted();
                            eprintln!("Microphone non disponible. Vérifiez les permissions. ({e})");
                        }
                    }
                } else {
                    println!("(micro indisponible : service injoignable ou traitement en cours)");
                }
            }
            "sos" => orchestrator.emergency(),
            "again" | "a" => orchestrator.replay_response(),
            "help" | "?" => print_help(),
            "quit" | "q" | "exit" => break,
            "" => {}
            other => {
                let id = action_alias(other);
                if QuickAction::from_id(id).is_none() {
                    println!("Commande inconnue : {other} (tapez « help »)");
                }
                orchestrator.dispatch_action(id).await;
            }
        }
    }

    Ok(())
}

/// Map friendly shell aliases to quick-action identifiers
fn action_alias(input: &str) -> &str {
    match input {
        "time" | "heure" => "get_time",
        "weather" | "meteo" | "météo" => "get_weather",
        "messages" => "read_messages",
        "agenda" => "check_agenda",
        "call" | "appeler" => "call_contact",
        "reminder" | "rappel" => "create_reminder",
        other => other,
    }
}

fn print_help() {
    println!("Commandes :");
    println!("  talk      démarrer / arrêter l'enregistrement");
    println!("  time, weather, messages, agenda, call, reminder");
    println!("            actions rapides");
    println!("  sos       alerte d'urgence");
    println!("  again     réécouter la dernière réponse");
    println!("  quit      quitter");
}

/// Print status and result updates as they arrive
async fn render_status(mut rx: watch::Receiver<Snapshot>) {
    let mut last_result: Option<InteractionResult> = None;

    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let snapshot = rx.borrow_and_update().clone();
        println!("{}", snapshot.status.display_text());

        if snapshot.result != last_result {
            if let Some(result) = &snapshot.result {
                print_result(result);
            }
            last_result = snapshot.result;
        }
    }
}

/// Render one result card
fn print_result(result: &InteractionResult) {
    let badge = if result.success { "✅" } else { "⚠️" };
    print!("  {badge} {}", result.intent.label());
    if let Some(confidence) = result.confidence {
        if confidence > 0.0 {
            print!("  ({:.0}% confiance)", confidence * 100.0);
        }
    }
    println!();
    println!("  🎤 Ce que j'ai compris : {}", result.transcription);
    println!("  🤖 Ma réponse : {}", result.response_text);

    for message in &result.messages {
        let icon = match message.direction {
            eldervoice::MessageDirection::Received => "📩",
            eldervoice::MessageDirection::Sent => "📤",
        };
        let sender = if message.sender.is_empty() {
            "Inconnu"
        } else {
            &message.sender
        };
        println!("    {icon} {sender} : {}", message.content);
    }
}

/// Refetch the dashboard panels on every refresh tick
async fn watch_dashboard(client: DashboardClient, mut rx: watch::Receiver<u64>) {
    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let tick = *rx.borrow_and_update();
        let overview = client.fetch_overview().await;
        tracing::info!(
            tick,
            reminders = overview.reminders.len(),
            medications = overview.medications.len(),
            contacts = overview.contacts.len(),
            messages = overview.messages.len(),
            "dashboard refreshed"
        );
    }
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let session = CaptureSession::begin()?;
    tokio::time::sleep(Duration::from_secs(duration)).await;
    let artifact = session.finish()?;

    println!("Captured {} bytes ({})", artifact.data.len(), artifact.mime);

    let mut reader = hound::WavReader::new(Cursor::new(&artifact.data))?;
    let samples: Vec<f32> = reader
        .samples::<i16>()
        .map(|s| f32::from(s.unwrap_or(0)) / 32768.0)
        .collect();
    let energy = calculate_rms(&samples);
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

    println!("RMS: {energy:.4} | Peak: {peak:.4}");
    println!("\n---");
    println!("If RMS moved away from 0, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");
    println!("  4. Try: pavucontrol (to check levels)");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    // Generate 2 seconds of 440Hz sine wave at the playback sample rate
    let sample_rate = 24_000_i32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());
    play_samples(samples, 1.0, &AtomicBool::new(false))?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}
