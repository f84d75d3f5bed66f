use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::attention::{AttentionSample, AttentionState, AttentionValue, Thresholds};
use super::detector::{DetectorError, FaceDetector, FrameSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    /// Face model still loading; value stays at its default.
    WarmingUp,
    Polling,
    /// Model failed to load. Value pinned to Focused until stopped.
    FailedOpen,
    /// Camera could not be acquired. Nothing to release; the task has exited.
    PermissionDenied,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    pub thresholds: Thresholds,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            thresholds: Thresholds::default(),
        }
    }
}

/// Non-blocking view of the current attention value.
#[derive(Debug, Clone)]
pub struct AttentionReader {
    value: watch::Receiver<AttentionValue>,
}

impl AttentionReader {
    pub fn current(&self) -> AttentionValue {
        *self.value.borrow()
    }

    /// Waits for the next confirmed flip. `None` once tracking has stopped.
    pub async fn changed(&mut self) -> Option<AttentionValue> {
        self.value.changed().await.ok()?;
        Some(*self.value.borrow_and_update())
    }
}

/// Polls the face detector on a fixed cadence and keeps a debounced
/// attention value. The polling task is cancelled on `stop()` and on drop.
pub struct AttentionTracker {
    reader: AttentionReader,
    phase: watch::Receiver<TrackerPhase>,
    fault: watch::Receiver<Option<DetectorError>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl AttentionTracker {
    pub fn start(
        source: Arc<dyn FrameSource>,
        detector: Arc<dyn FaceDetector>,
        settings: TrackerSettings,
    ) -> Self {
        let (value_tx, value_rx) = watch::channel(AttentionValue::default());
        let (phase_tx, phase_rx) = watch::channel(TrackerPhase::WarmingUp);
        let (fault_tx, fault_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(tracking_loop(
            source,
            detector,
            settings,
            Outputs {
                value: value_tx,
                phase: phase_tx,
                fault: fault_tx,
            },
            cancel.clone(),
        ));

        Self {
            reader: AttentionReader { value: value_rx },
            phase: phase_rx,
            fault: fault_rx,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn current(&self) -> AttentionValue {
        self.reader.current()
    }

    pub fn reader(&self) -> AttentionReader {
        self.reader.clone()
    }

    pub fn phase(&self) -> TrackerPhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<TrackerPhase> {
        self.phase.clone()
    }

    /// Why the tracker is in `FailedOpen` or `PermissionDenied`.
    pub fn fault(&self) -> Option<DetectorError> {
        self.fault.borrow().clone()
    }

    /// Waits until the tracker leaves `WarmingUp`.
    pub async fn ready(&mut self) -> TrackerPhase {
        let _ = self
            .phase
            .wait_for(|phase| *phase != TrackerPhase::WarmingUp)
            .await;
        self.phase()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Cancels polling and waits for the camera to be released.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "attention task ended abnormally");
            }
        }
    }
}

impl Drop for AttentionTracker {
    fn drop(&mut self) {
        // The task observes the token and still releases the camera.
        self.cancel.cancel();
    }
}

struct Outputs {
    value: watch::Sender<AttentionValue>,
    phase: watch::Sender<TrackerPhase>,
    fault: watch::Sender<Option<DetectorError>>,
}

async fn tracking_loop(
    source: Arc<dyn FrameSource>,
    detector: Arc<dyn FaceDetector>,
    settings: TrackerSettings,
    out: Outputs,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        _ = cancel.cancelled() => None,
        result = source.open() => Some(result),
    };

    match opened {
        None => {
            debug!("attention tracking cancelled before the camera opened");
            out.phase.send_replace(TrackerPhase::Stopped);
            return;
        }
        Some(Err(e)) => {
            warn!(error = %e, "camera unavailable, attention tracking not started");
            out.fault.send_replace(Some(e));
            out.phase.send_replace(TrackerPhase::PermissionDenied);
            return;
        }
        Some(Ok(())) => {}
    }

    let loaded = tokio::select! {
        _ = cancel.cancelled() => None,
        result = detector.load() => Some(result),
    };

    match loaded {
        None => debug!("attention tracking cancelled during warm-up"),
        Some(Err(e)) => {
            warn!(error = %e, "attention model unavailable, failing open");
            out.fault.send_replace(Some(e));
            out.phase.send_replace(TrackerPhase::FailedOpen);
            cancel.cancelled().await;
        }
        Some(Ok(())) => {
            info!(
                interval_ms = settings.poll_interval.as_millis() as u64,
                "attention polling started"
            );
            out.phase.send_replace(TrackerPhase::Polling);
            poll(&*source, &*detector, settings, &out.value, &cancel).await;
        }
    }

    source.release().await;
    out.phase.send_replace(TrackerPhase::Stopped);
    info!("attention tracking stopped, camera released");
}

async fn poll(
    source: &dyn FrameSource,
    detector: &dyn FaceDetector,
    settings: TrackerSettings,
    value_tx: &watch::Sender<AttentionValue>,
    cancel: &CancellationToken,
) {
    let mut state = AttentionState::new(settings.thresholds);
    let mut ticker = tokio::time::interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                // A hung detector must not hold up stop().
                let sampled = tokio::select! {
                    _ = cancel.cancelled() => break,
                    sampled = sample(source, detector) => sampled,
                };
                let Some(sample) = sampled else {
                    continue;
                };
                if let Some(value) = state.observe(sample) {
                    info!(attention = value.label(), "attention changed");
                    value_tx.send_replace(value);
                }
            }
        }
    }
}

/// One detector query. Faults and unready frames count as no evidence.
async fn sample(source: &dyn FrameSource, detector: &dyn FaceDetector) -> Option<AttentionSample> {
    let Some(frame) = source.next_frame().await else {
        debug!("camera frame not ready, tick skipped");
        return None;
    };

    match detector.detect(&frame).await {
        Ok(presence) => Some(AttentionSample::now(presence)),
        Err(e) => {
            debug!(error = %e, "detector sample failed, tick ignored");
            None
        }
    }
}
