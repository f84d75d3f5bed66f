use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::context::SessionContext;
use super::event::{Command, Notice, SessionEvent, TerminationReason};
use super::routing::{route_reply, RoutingDecision};
use super::session::{SessionGraph, SessionRequest, SessionState};
use super::telemetry::{TelemetryEvent, TelemetryRecorder, TelemetrySnapshot};
use super::transcript::{Transcript, TurnMessage};
use crate::audio::{Recorder, RecorderError};
use crate::config::SessionSettings;
use crate::error::InterviewError;
use crate::outputs::SpeechPlayback;
use crate::services::interview::{AnswerSubmission, BackendError, InterviewBackend};
use crate::vision::detector::DetectorError;
use crate::vision::{AttentionTracker, AttentionValue, TrackerPhase};

/// Collaborators handed to an orchestrator for the lifetime of one session.
pub struct SessionParts {
    pub backend: Arc<dyn InterviewBackend>,
    pub speech: Arc<dyn SpeechPlayback>,
    pub recorder: Recorder,
    pub attention: AttentionTracker,
    pub settings: SessionSettings,
}

/// How a completed `end_answer` left the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Back in `AwaitingCandidate`, ready for the next answer.
    Ready(RoutingDecision),
    Ended(TerminationReason),
}

/// Turn-taking state machine for one interview session.
///
/// The only writer of `SessionState` and the transcript, and the only caller
/// of the recorder, the attention tracker, the backend and speech playback.
/// Methods take `&mut self`, so turns are serialized by construction; the
/// session's cancellation token is the one way to interrupt a turn in flight.
pub struct Orchestrator {
    context: Arc<SessionContext>,
    backend: Arc<dyn InterviewBackend>,
    speech: Arc<dyn SpeechPlayback>,
    recorder: Recorder,
    attention: AttentionTracker,
    settings: SessionSettings,

    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    transcript: Transcript,
    events: mpsc::UnboundedSender<SessionEvent>,
    telemetry: TelemetryRecorder,
    behavioral_notice_shown: bool,
    attention_fault_reported: bool,
    termination: Option<TerminationReason>,
}

impl Orchestrator {
    pub fn new(
        context: Arc<SessionContext>,
        parts: SessionParts,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::default());

        Self {
            context,
            backend: parts.backend,
            speech: parts.speech,
            recorder: parts.recorder,
            attention: parts.attention,
            settings: parts.settings,
            state: SessionState::default(),
            state_tx,
            transcript: Transcript::new(),
            events,
            telemetry: TelemetryRecorder::new(),
            behavioral_notice_shown: false,
            attention_fault_reported: false,
            termination: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn attention(&self) -> AttentionValue {
        self.attention.current()
    }

    /// The tracker's fault, if it failed open or the camera was refused.
    pub fn attention_fault(&self) -> Option<InterviewError> {
        self.attention.fault().map(InterviewError::from)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_capturing()
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Replays prior history, then optionally speaks the latest interviewer line.
    /// Only valid before the first turn. Returns the number of restored messages.
    pub async fn resume(&mut self) -> Result<usize, InterviewError> {
        self.ensure_live("resume").await?;
        if self.state != SessionState::AwaitingCandidate
            || !self.transcript.is_empty()
            || self.recorder.is_capturing()
        {
            return Err(InterviewError::logic("resume", self.state));
        }

        let token = self.context.cancellation();
        let backend = Arc::clone(&self.backend);
        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = backend.history() => Some(result),
        };

        let entries = match fetched {
            None => {
                self.terminate(TerminationReason::EndedByCandidate).await;
                return Ok(0);
            }
            Some(Err(e)) => {
                warn!(session = %self.context.id(), error = %e, "failed to load interview history");
                self.report_backend_error(&e, "Failed to load interview history");
                return Err(e.into());
            }
            Some(Ok(entries)) => entries,
        };

        let restored = entries.len();
        for entry in entries {
            self.append(entry.into_message());
        }
        info!(session = %self.context.id(), messages = restored, "history restored");

        if !self.settings.replay_last_on_resume {
            return Ok(restored);
        }

        let Some(text) = self.transcript.last_interviewer().map(|m| m.text().to_string()) else {
            return Ok(restored);
        };

        self.transition(SessionRequest::ReplayStarted, "resume")?;
        if !self.play(&text, &token).await {
            self.terminate(TerminationReason::EndedByCandidate).await;
            return Ok(restored);
        }
        self.transition(SessionRequest::PlaybackEnded, "resume")?;
        Ok(restored)
    }

    /// Starts capturing the candidate's answer.
    pub async fn begin_answer(&mut self) -> Result<(), InterviewError> {
        self.ensure_live("begin_answer").await?;
        if self.state != SessionState::AwaitingCandidate {
            return Err(InterviewError::logic("begin_answer", self.state));
        }

        match self.recorder.start().await {
            Ok(()) => {
                self.emit(SessionEvent::RecordingStarted);
                Ok(())
            }
            Err(RecorderError::Permission(e)) => {
                error!(session = %self.context.id(), error = %e, "microphone unavailable, ending session");
                self.emit(SessionEvent::Error(format!("Could not access the microphone: {e}")));
                self.terminate(TerminationReason::PermissionDenied).await;
                Err(InterviewError::Permission(e))
            }
            Err(e) => {
                debug!(error = %e, "begin_answer rejected");
                Err(InterviewError::logic("begin_answer", self.state))
            }
        }
    }

    /// Stops capture, submits the answer with the attention value read right
    /// now, then handles the reply: transcript, speech, routing.
    pub async fn end_answer(&mut self) -> Result<TurnOutcome, InterviewError> {
        self.ensure_live("end_answer").await?;
        if self.state != SessionState::AwaitingCandidate || !self.recorder.is_capturing() {
            return Err(InterviewError::logic("end_answer", self.state));
        }

        let audio = match self.recorder.stop().await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(error = %e, "recording could not be finalized");
                return Err(InterviewError::logic("end_answer", self.state));
            }
        };
        let audio_ms = audio.duration_ms();
        self.emit(SessionEvent::RecordingStopped { duration_ms: audio_ms });

        let attention = self.attention.current();
        self.telemetry
            .record(TelemetryEvent::AnswerSubmitted { attention, audio_ms });
        self.transition(SessionRequest::SubmitAnswer, "end_answer")?;

        let token = self.context.cancellation();
        let backend = Arc::clone(&self.backend);
        let sent_at = Instant::now();
        let request = backend.submit_answer(AnswerSubmission { audio, attention });
        self.transition(SessionRequest::RequestIssued, "end_answer")?;

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = request => Some(result),
        };

        // A reply that lands after the session ended must not touch it.
        let result = match result {
            Some(result) if !token.is_cancelled() => result,
            Some(_) => {
                info!(session = %self.context.id(), "late reply discarded");
                self.telemetry.record(TelemetryEvent::LateReplyDiscarded);
                return Ok(self.end_turn(TerminationReason::EndedByCandidate).await);
            }
            None => return Ok(self.end_turn(TerminationReason::EndedByCandidate).await),
        };

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %self.context.id(), error = %e, "answer submission failed");
                self.telemetry.record(TelemetryEvent::SubmissionFailed);
                self.transition(SessionRequest::SubmissionFailed, "end_answer")?;
                self.report_backend_error(&e, "Error contacting the interview service");
                return Err(e.into());
            }
        };

        let decision = route_reply(reply.route, &reply.text);
        self.telemetry.record(TelemetryEvent::ReplyReceived {
            round_trip_ms: sent_at.elapsed().as_millis() as u64,
            decision,
        });

        self.append(TurnMessage::candidate(reply.answer, reply.confidence));
        self.append(TurnMessage::interviewer(reply.text.clone()));
        self.transition(SessionRequest::ReplyReceived, "end_answer")?;

        let ending = if reply.interview_ended || decision == RoutingDecision::EndInterview {
            Some(TerminationReason::InterviewComplete)
        } else if decision == RoutingDecision::EnterCodingRound {
            Some(TerminationReason::CodingRound)
        } else {
            None
        };

        if decision == RoutingDecision::EnterBehavioralNotice && !self.behavioral_notice_shown {
            self.behavioral_notice_shown = true;
            self.emit(SessionEvent::Notice(Notice::BehavioralRound));
        }

        if !self.play(&reply.text, &token).await {
            return Ok(self.end_turn(TerminationReason::EndedByCandidate).await);
        }

        match ending {
            Some(reason) => {
                if reason == TerminationReason::CodingRound {
                    self.emit(SessionEvent::CodingRound);
                }
                Ok(self.end_turn(reason).await)
            }
            None => {
                self.transition(SessionRequest::PlaybackEnded, "end_answer")?;
                Ok(TurnOutcome::Ready(decision))
            }
        }
    }

    /// Ends the session. Idempotent.
    pub async fn end_session(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.terminate(TerminationReason::EndedByCandidate).await;
    }

    /// Drives the session from host commands until it terminates.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Option<TerminationReason> {
        let token = self.context.cancellation();
        let mut phase = self.attention.watch_phase();
        let mut tracking = true;
        info!(session = %self.context.id(), "session started");

        while !self.state.is_terminal() {
            if let Err(e) = self.check_attention().await {
                debug!(error = %e, "attention check ended the session");
                continue;
            }

            let command = tokio::select! {
                _ = token.cancelled() => Command::EndSession,
                changed = phase.changed(), if tracking => {
                    // Closed once the tracker task exits.
                    tracking = changed.is_ok();
                    continue;
                }
                command = commands.recv() => command.unwrap_or(Command::EndSession),
            };

            let result = match command {
                Command::Resume => self.resume().await.map(|_| ()),
                Command::BeginAnswer => self.begin_answer().await,
                Command::EndAnswer => self.end_answer().await.map(|_| ()),
                Command::EndSession => {
                    self.end_session().await;
                    Ok(())
                }
            };

            if let Err(e) = result {
                if e.is_logic() {
                    warn!(?command, error = %e, "command rejected");
                } else {
                    debug!(?command, error = %e, "command failed");
                }
            }
        }

        self.termination
    }

    /// Moves the orchestrator onto its own task.
    pub fn spawn(self) -> (SessionHandle, JoinHandle<Option<TerminationReason>>) {
        let (commands, rx) = mpsc::channel(16);
        let handle = SessionHandle {
            context: Arc::clone(&self.context),
            commands,
            state: self.subscribe(),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    fn transition(&mut self, request: SessionRequest, op: &'static str) -> Result<(), InterviewError> {
        let from = self.state;
        let to = SessionGraph::transition(from, request).ok_or(InterviewError::logic(op, from))?;

        self.state = to;
        self.state_tx.send_replace(to);
        self.telemetry.record(TelemetryEvent::Transition { from, to });
        debug!(session = %self.context.id(), ?from, ?to, ?request, "session transition");
        self.emit(SessionEvent::StateChanged { from, to });
        Ok(())
    }

    fn append(&mut self, message: TurnMessage) {
        debug!(speaker = ?message.speaker(), text = message.text(), "transcript append");
        self.transcript.push(message.clone());
        self.emit(SessionEvent::MessageAppended(message));
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    fn report_backend_error(&self, e: &BackendError, what: &str) {
        if matches!(e, BackendError::Unauthorized | BackendError::MissingCredential) {
            self.emit(SessionEvent::ReauthenticationRequired);
        }
        self.emit(SessionEvent::Error(format!("{what}: {e}")));
    }

    /// Rejects work on a dead session, and finishes an end requested via the handle.
    async fn ensure_live(&mut self, op: &'static str) -> Result<(), InterviewError> {
        if !self.state.is_terminal() && self.context.is_ending() {
            self.terminate(TerminationReason::EndedByCandidate).await;
        }
        self.check_attention().await?;
        if self.state.is_terminal() {
            return Err(InterviewError::logic(op, self.state));
        }
        Ok(())
    }

    /// Ends the session when the camera was refused. A fail-open tracker is
    /// reported once and otherwise ignored.
    async fn check_attention(&mut self) -> Result<(), InterviewError> {
        if self.state.is_terminal() {
            return Ok(());
        }

        match self.attention.phase() {
            TrackerPhase::PermissionDenied => {
                let fault = self
                    .attention
                    .fault()
                    .unwrap_or_else(|| DetectorError::PermissionDenied("camera unavailable".into()));
                let e = InterviewError::from(fault);
                error!(session = %self.context.id(), error = %e, "camera unavailable, ending session");
                self.emit(SessionEvent::Error(e.to_string()));
                self.terminate(TerminationReason::PermissionDenied).await;
                Err(e)
            }
            TrackerPhase::FailedOpen if !self.attention_fault_reported => {
                self.attention_fault_reported = true;
                if let Some(e) = self.attention_fault() {
                    warn!(session = %self.context.id(), error = %e, "attention assumed focused");
                    self.emit(SessionEvent::Error(e.to_string()));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Plays `text`. Returns false if the session was ended mid-playback.
    async fn play(&mut self, text: &str, token: &CancellationToken) -> bool {
        let speech = Arc::clone(&self.speech);
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return false,
            result = speech.speak(text) => result,
        };

        if let Err(e) = result {
            // No safe retry; treat as the end of playback.
            warn!(session = %self.context.id(), error = %e, "speech playback failed");
            self.telemetry.record(TelemetryEvent::PlaybackFault);
        }
        true
    }

    async fn end_turn(&mut self, reason: TerminationReason) -> TurnOutcome {
        self.terminate(reason).await;
        TurnOutcome::Ended(reason)
    }

    /// Any state -> Terminated. Releases microphone and camera first.
    async fn terminate(&mut self, reason: TerminationReason) {
        if self.state.is_terminal() {
            return;
        }

        self.context.request_end();
        self.recorder.discard();
        self.attention.stop().await;

        let from = self.state;
        self.state = SessionState::Terminated;
        self.state_tx.send_replace(SessionState::Terminated);
        self.telemetry.record(TelemetryEvent::Transition {
            from,
            to: SessionState::Terminated,
        });
        self.emit(SessionEvent::StateChanged {
            from,
            to: SessionState::Terminated,
        });

        self.termination = Some(reason);
        self.telemetry.record(TelemetryEvent::SessionEnded { reason });

        if reason == TerminationReason::EndedByCandidate {
            let backend = Arc::clone(&self.backend);
            tokio::spawn(async move {
                if let Err(e) = backend.end_interview().await {
                    debug!(error = %e, "end-interview notification failed, ignored");
                }
            });
        }

        let summary = self.telemetry.snapshot();
        info!(
            session = %self.context.id(),
            ?reason,
            turns = summary.turns,
            failures = summary.submission_failures,
            focus_ratio = summary.focus_ratio(),
            "session terminated"
        );
        self.emit(SessionEvent::Ended(reason));
    }
}

/// Cloneable host-side handle to a spawned session.
#[derive(Clone)]
pub struct SessionHandle {
    context: Arc<SessionContext>,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub async fn resume(&self) -> Result<(), InterviewError> {
        self.send(Command::Resume, "resume").await
    }

    /// Rejected outright unless the session is waiting for the candidate,
    /// so the microphone never opens over interviewer speech.
    pub async fn begin_answer(&self) -> Result<(), InterviewError> {
        let state = self.state();
        if state != SessionState::AwaitingCandidate {
            return Err(InterviewError::logic("begin_answer", state));
        }
        self.send(Command::BeginAnswer, "begin_answer").await
    }

    pub async fn end_answer(&self) -> Result<(), InterviewError> {
        self.send(Command::EndAnswer, "end_answer").await
    }

    /// Ends the session now, interrupting any submission or playback in flight.
    pub fn end_session(&self) {
        self.context.request_end();
    }

    async fn send(&self, command: Command, op: &'static str) -> Result<(), InterviewError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| InterviewError::logic(op, SessionState::Terminated))
    }
}
