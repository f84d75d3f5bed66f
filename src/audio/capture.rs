use std::sync::mpsc as std_mpsc;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

/// Interleaved 16-bit PCM as delivered by one device callback.
pub type AudioChunk = Vec<i16>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no input device available")]
    NoDevice,

    #[error("microphone could not be acquired: {0}")]
    PermissionDenied(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("capture thread exited before the stream opened")]
    ThreadExited,
}

/// Releases the device exactly once: explicitly, or when dropped.
pub struct StreamGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl StreamGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// An open microphone stream.
///
/// `chunks` yields data events until the device has actually stopped, at which
/// point the channel closes. Releasing `guard` asks the device to stop.
pub struct CaptureStream {
    pub format: AudioFormat,
    pub chunks: mpsc::UnboundedReceiver<AudioChunk>,
    pub guard: StreamGuard,
}

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn open(&self) -> Result<CaptureStream, CaptureError>;
}

/// Default system microphone via cpal.
///
/// cpal streams are not `Send`, so each capture lives on its own OS thread that
/// holds the stream until the guard fires.
#[derive(Debug, Default, Clone)]
pub struct CpalMicrophone;

impl CpalMicrophone {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CaptureDevice for CpalMicrophone {
    async fn open(&self) -> Result<CaptureStream, CaptureError> {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || input_thread(chunk_tx, ready_tx, stop_rx))
            .map_err(|_| CaptureError::ThreadExited)?;

        let format = ready_rx.await.map_err(|_| CaptureError::ThreadExited)??;

        Ok(CaptureStream {
            format,
            chunks: chunk_rx,
            guard: StreamGuard::new(move || {
                let _ = stop_tx.send(());
            }),
        })
    }
}

fn input_thread(
    chunk_tx: mpsc::UnboundedSender<AudioChunk>,
    ready_tx: oneshot::Sender<Result<AudioFormat, CaptureError>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let stream = match build_stream(chunk_tx) {
        Ok((stream, format)) => {
            let _ = ready_tx.send(Ok(format));
            stream
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    // Returns on an explicit stop or when the guard is dropped.
    let _ = stop_rx.recv();

    if let Err(e) = stream.pause() {
        debug!("pausing input stream failed: {}", e);
    }
    // Dropping the stream drops the callbacks and with them the last chunk sender.
    drop(stream);
    info!("Microphone released");
}

fn build_stream(
    chunk_tx: mpsc::UnboundedSender<AudioChunk>,
) -> Result<(cpal::Stream, AudioFormat), CaptureError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

    info!("Audio Input Device: {}", device.name().unwrap_or_default());

    let config = device
        .default_input_config()
        .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

    let format = AudioFormat {
        sample_rate: config.sample_rate().0,
        channels: config.channels(),
    };

    info!(
        "Audio Config Selected: Rate={}Hz, Channels={}",
        format.sample_rate, format.channels
    );

    let err_fn = |err: cpal::StreamError| error!("an error occurred on stream: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let tx = chunk_tx.clone();
            device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| {
                    let _ = tx.send(data.iter().map(|&s| f32_to_i16(s)).collect());
                },
                err_fn,
                None,
            )
        }
        cpal::SampleFormat::I16 => {
            let tx = chunk_tx.clone();
            device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &_| {
                    let _ = tx.send(data.to_vec());
                },
                err_fn,
                None,
            )
        }
        other => return Err(CaptureError::UnsupportedFormat(format!("{other:?}"))),
    }
    .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

    Ok((stream, format))
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
