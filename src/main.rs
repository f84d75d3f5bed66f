use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use interlocutor::audio::{CpalMicrophone, Recorder};
use interlocutor::config::InterviewConfig;
use interlocutor::kernel::event::SessionEvent;
use interlocutor::kernel::{SessionContext, Speaker};
use interlocutor::services::interview::HttpBackend;
use interlocutor::vision::manual::{ManualPresence, StillFrameSource};
use interlocutor::vision::AttentionTracker;
use interlocutor::{Orchestrator, SessionParts};

// Console harness: the camera is simulated with `away` / `back`.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = InterviewConfig::load(path.as_deref())?;
    tracing::info!(backend = %config.backend.base_url, "Interlocutor booting...");

    let context = Arc::new(SessionContext::new(config.backend.token.clone()));
    let backend = HttpBackend::new(&config.backend, Arc::clone(&context))
        .context("building backend client")?;

    let presence = Arc::new(ManualPresence::new(true));
    let attention = AttentionTracker::start(
        Arc::new(StillFrameSource::new()),
        presence.clone(),
        config.attention.tracker(),
    );

    let parts = SessionParts {
        backend: Arc::new(backend),
        speech: Arc::new(config.speech.playback()),
        recorder: Recorder::new(Arc::new(CpalMicrophone::new())),
        attention,
        settings: config.session.clone(),
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(context, parts, events_tx);
    let (handle, session) = orchestrator.spawn();

    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                SessionEvent::MessageAppended(message) => {
                    let who = match message.speaker() {
                        Speaker::Candidate => "you",
                        Speaker::Interviewer => "interviewer",
                    };
                    println!("[{who}] {}", message.text());
                }
                SessionEvent::StateChanged { to, .. } => println!("-- {to:?}"),
                SessionEvent::RecordingStarted => println!("-- recording, type 'stop' when done"),
                SessionEvent::RecordingStopped { duration_ms } => {
                    println!("-- recorded {duration_ms} ms, submitting")
                }
                SessionEvent::Notice(notice) => println!("!! {notice:?}"),
                SessionEvent::CodingRound => println!("!! continue in the coding round"),
                SessionEvent::Error(message) => eprintln!("error: {message}"),
                SessionEvent::ReauthenticationRequired => eprintln!("error: sign in again"),
                SessionEvent::Ended(reason) => println!("-- session ended: {reason:?}"),
            }
        }
    });

    if let Err(e) = handle.resume().await {
        tracing::error!(error = %e, "could not resume session");
    }

    let console = handle.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Commands: start, stop, away, back, end");

        while let Ok(Some(line)) = lines.next_line().await {
            let result = match line.trim() {
                "" => continue,
                "start" => console.begin_answer().await,
                "stop" => console.end_answer().await,
                "away" => {
                    presence.set(false);
                    Ok(())
                }
                "back" => {
                    presence.set(true);
                    Ok(())
                }
                "end" => {
                    console.end_session();
                    break;
                }
                other => {
                    println!("unknown command: {other}");
                    Ok(())
                }
            };
            if let Err(e) = result {
                println!("{e}");
            }
        }
    });

    let reason = session.await.context("session task panicked")?;
    tracing::info!(?reason, "Interlocutor shut down");
    Ok(())
}
