// Shared fakes for the session-level tests. No devices, no network.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use interlocutor::audio::{
    AudioChunk, AudioFormat, CaptureDevice, CaptureError, CaptureStream, Recorder, StreamGuard,
};
use interlocutor::config::SessionSettings;
use interlocutor::kernel::event::SessionEvent;
use interlocutor::kernel::{SessionContext, SessionState};
use interlocutor::outputs::{PlaybackError, SpeechPlayback};
use interlocutor::services::interview::{
    AnswerSubmission, BackendError, HistoryEntry, InterviewBackend, InterviewerReply,
};
use interlocutor::vision::detector::{DetectorError, FaceDetector, Frame, FrameSource};
use interlocutor::vision::manual::ManualPresence;
use interlocutor::vision::{AttentionTracker, AttentionValue, Thresholds, TrackerSettings};
use interlocutor::{Orchestrator, SessionParts};

/// Microphone that replays canned chunks. The chunk channel closes when the
/// guard is released, like a real device confirming it stopped.
pub struct FakeMic {
    chunks: Vec<AudioChunk>,
    deny: bool,
    pub opens: AtomicUsize,
}

impl FakeMic {
    pub fn new(chunks: Vec<AudioChunk>) -> Self {
        Self {
            chunks,
            deny: false,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn denied() -> Self {
        Self {
            chunks: Vec::new(),
            deny: true,
            opens: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CaptureDevice for FakeMic {
    async fn open(&self) -> Result<CaptureStream, CaptureError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.deny {
            return Err(CaptureError::PermissionDenied("user declined".into()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in &self.chunks {
            let _ = tx.send(chunk.clone());
        }

        Ok(CaptureStream {
            format: AudioFormat::default(),
            chunks: rx,
            guard: StreamGuard::new(move || drop(tx)),
        })
    }
}

/// Blank-frame camera that can be refused and records its release.
#[derive(Default)]
pub struct FakeCamera {
    refuse: bool,
    released: AtomicBool,
}

impl FakeCamera {
    pub fn refused() -> Self {
        Self {
            refuse: true,
            ..Default::default()
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSource for FakeCamera {
    async fn open(&self) -> Result<(), DetectorError> {
        if self.refuse {
            return Err(DetectorError::PermissionDenied("user declined".into()));
        }
        Ok(())
    }

    async fn next_frame(&self) -> Option<Frame> {
        Some(image::DynamicImage::new_rgb8(8, 8))
    }

    async fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Face model that never loads.
pub struct BrokenModel;

#[async_trait]
impl FaceDetector for BrokenModel {
    async fn load(&self) -> Result<(), DetectorError> {
        Err(DetectorError::ModelLoad("blazeface weights missing".into()))
    }

    async fn detect(&self, _frame: &Frame) -> Result<bool, DetectorError> {
        Ok(true)
    }
}

pub fn reply(text: &str) -> InterviewerReply {
    InterviewerReply {
        text: text.to_string(),
        answer: "I have five years of experience.".to_string(),
        confidence: Some(0.92),
        interview_ended: false,
        route: None,
    }
}

#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<Result<InterviewerReply, BackendError>>>,
    history: Mutex<Vec<HistoryEntry>>,
    pub submissions: Mutex<Vec<AttentionValue>>,
    pub end_calls: AtomicUsize,
    /// Ends this session while the request is in flight.
    end_on_submit: Mutex<Option<Arc<SessionContext>>>,
}

impl FakeBackend {
    pub fn with_replies(replies: Vec<Result<InterviewerReply, BackendError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    pub fn set_history(&self, history: Vec<HistoryEntry>) {
        *self.history.lock().unwrap() = history;
    }

    pub fn end_session_on_submit(&self, context: Arc<SessionContext>) {
        *self.end_on_submit.lock().unwrap() = Some(context);
    }

    pub fn submitted(&self) -> Vec<AttentionValue> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn ends(&self) -> usize {
        self.end_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InterviewBackend for FakeBackend {
    async fn submit_answer(&self, submission: AnswerSubmission) -> Result<InterviewerReply, BackendError> {
        self.submissions.lock().unwrap().push(submission.attention);

        let context = self.end_on_submit.lock().unwrap().clone();
        if let Some(context) = context {
            context.request_end();
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(reply("Tell me more.")))
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, BackendError> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn end_interview(&self) -> Result<(), BackendError> {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSpeech {
    pub spoken: Mutex<Vec<String>>,
    pub fail: bool,
    /// Playback never finishes on its own.
    pub endless: bool,
}

impl FakeSpeech {
    pub fn endless() -> Self {
        Self {
            endless: true,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechPlayback for FakeSpeech {
    async fn speak(&self, text: &str) -> Result<(), PlaybackError> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.endless {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(PlaybackError::Exit("exit status: 1".into()));
        }
        Ok(())
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub backend: Arc<FakeBackend>,
    pub speech: Arc<FakeSpeech>,
    pub mic: Arc<FakeMic>,
    pub presence: Arc<ManualPresence>,
    pub camera: Arc<FakeCamera>,
}

pub struct HarnessBuilder {
    backend: FakeBackend,
    speech: FakeSpeech,
    mic: FakeMic,
    present: bool,
    camera: FakeCamera,
    model_loads: bool,
    settings: SessionSettings,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            backend: FakeBackend::default(),
            speech: FakeSpeech::default(),
            mic: FakeMic::new(vec![vec![100, -100, 50], vec![], vec![7; 16]]),
            present: true,
            camera: FakeCamera::default(),
            model_loads: true,
            settings: SessionSettings::default(),
        }
    }

    pub fn backend(mut self, backend: FakeBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn speech(mut self, speech: FakeSpeech) -> Self {
        self.speech = speech;
        self
    }

    pub fn mic(mut self, mic: FakeMic) -> Self {
        self.mic = mic;
        self
    }

    pub fn present(mut self, present: bool) -> Self {
        self.present = present;
        self
    }

    pub fn camera(mut self, camera: FakeCamera) -> Self {
        self.camera = camera;
        self
    }

    pub fn broken_model(mut self) -> Self {
        self.model_loads = false;
        self
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Harness {
        let backend = Arc::new(self.backend);
        let speech = Arc::new(self.speech);
        let mic = Arc::new(self.mic);
        let presence = Arc::new(ManualPresence::new(self.present));
        let camera = Arc::new(self.camera);
        let detector: Arc<dyn FaceDetector> = if self.model_loads {
            presence.clone()
        } else {
            Arc::new(BrokenModel)
        };

        let attention = AttentionTracker::start(
            camera.clone(),
            detector,
            TrackerSettings {
                poll_interval: Duration::from_millis(10),
                thresholds: Thresholds::default(),
            },
        );

        let parts = SessionParts {
            backend: backend.clone(),
            speech: speech.clone(),
            recorder: Recorder::new(mic.clone()),
            attention,
            settings: self.settings,
        };

        let context = Arc::new(SessionContext::new(Some("token".into())));
        let (tx, events) = mpsc::unbounded_channel();

        Harness {
            orchestrator: Orchestrator::new(context, parts, tx),
            events,
            backend,
            speech,
            mic,
            presence,
            camera,
        }
    }
}

impl Harness {
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

pub fn states(events: &[SessionEvent]) -> Vec<SessionState> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

/// Lets fire-and-forget tasks spawned by the session run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
