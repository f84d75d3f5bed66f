use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::detector::{DetectorError, FaceDetector, Frame, FrameSource};

/// Camera stand-in for hosts without video: always yields the same blank
/// 224x224 frame until released.
#[derive(Debug, Default)]
pub struct StillFrameSource {
    released: AtomicBool,
}

impl StillFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSource for StillFrameSource {
    async fn open(&self) -> Result<(), DetectorError> {
        Ok(())
    }

    async fn next_frame(&self) -> Option<Frame> {
        if self.is_released() {
            return None;
        }
        Some(image::DynamicImage::new_rgb8(224, 224))
    }

    async fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Presence flag flipped by the host (console commands, tests). Ignores the frame.
#[derive(Debug)]
pub struct ManualPresence {
    present: AtomicBool,
}

impl ManualPresence {
    pub fn new(present: bool) -> Self {
        Self {
            present: AtomicBool::new(present),
        }
    }

    pub fn set(&self, present: bool) {
        debug!(present, "manual presence updated");
        self.present.store(present, Ordering::SeqCst);
    }
}

#[async_trait]
impl FaceDetector for ManualPresence {
    async fn load(&self) -> Result<(), DetectorError> {
        Ok(())
    }

    async fn detect(&self, _frame: &Frame) -> Result<bool, DetectorError> {
        Ok(self.present.load(Ordering::SeqCst))
    }
}
