use std::io::Cursor;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use super::capture::{AudioChunk, AudioFormat, CaptureDevice, CaptureError, StreamGuard};

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error(transparent)]
    Permission(#[from] CaptureError),

    #[error("a recording is already in progress")]
    AlreadyCapturing,

    #[error("no recording in progress")]
    NotCapturing,

    #[error("capture collector failed: {0}")]
    Collector(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStatus {
    Idle,
    Capturing,
}

/// Everything captured between one `start()` and its `stop()`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub format: AudioFormat,
    pub samples: Vec<i16>,
}

impl AudioPayload {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        let frames = self.samples.len() as u64 / self.format.channels.max(1) as u64;
        frames * 1000 / self.format.sample_rate.max(1) as u64
    }

    /// 16-bit PCM WAV, the upload format for answers.
    pub fn to_wav(&self) -> Result<Vec<u8>, hound::Error> {
        let spec = hound::WavSpec {
            channels: self.format.channels,
            sample_rate: self.format.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}

struct ActiveCapture {
    id: Uuid,
    format: AudioFormat,
    guard: StreamGuard,
    collector: JoinHandle<Vec<AudioChunk>>,
}

/// Owns at most one capture session and hands back its audio as one payload.
///
/// Callers serialize `start`/`stop`; a second `start` while capturing is rejected.
pub struct Recorder {
    device: Arc<dyn CaptureDevice>,
    active: Option<ActiveCapture>,
}

impl Recorder {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        Self {
            device,
            active: None,
        }
    }

    pub fn status(&self) -> RecordingStatus {
        if self.active.is_some() {
            RecordingStatus::Capturing
        } else {
            RecordingStatus::Idle
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    pub async fn start(&mut self) -> Result<(), RecorderError> {
        if self.active.is_some() {
            return Err(RecorderError::AlreadyCapturing);
        }

        let stream = self.device.open().await?;
        let mut chunks = stream.chunks;

        // Fresh buffer per session; empty data events are dropped.
        let collector = tokio::spawn(async move {
            let mut buffer: Vec<AudioChunk> = Vec::new();
            while let Some(chunk) = chunks.recv().await {
                if !chunk.is_empty() {
                    buffer.push(chunk);
                }
            }
            buffer
        });

        let id = Uuid::new_v4();
        info!(recording = %id, rate = stream.format.sample_rate, "recording started");

        self.active = Some(ActiveCapture {
            id,
            format: stream.format,
            guard: stream.guard,
            collector,
        });
        Ok(())
    }

    /// Stops the device, waits for it to confirm, and concatenates every chunk.
    pub async fn stop(&mut self) -> Result<AudioPayload, RecorderError> {
        let active = self.active.take().ok_or(RecorderError::NotCapturing)?;

        active.guard.release();
        let chunks = active
            .collector
            .await
            .map_err(|e| RecorderError::Collector(e.to_string()))?;

        let chunk_count = chunks.len();
        let payload = AudioPayload {
            format: active.format,
            samples: chunks.concat(),
        };

        info!(
            recording = %active.id,
            chunks = chunk_count,
            duration_ms = payload.duration_ms(),
            "recording stopped"
        );
        Ok(payload)
    }

    /// Drops an in-progress capture without building a payload.
    pub fn discard(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(recording = %active.id, "recording discarded");
            active.guard.release();
            active.collector.abort();
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.discard();
    }
}
