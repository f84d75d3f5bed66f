use async_trait::async_trait;
use thiserror::Error;

/// A single camera frame handed to the detector.
pub type Frame = image::DynamicImage;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("camera could not be acquired: {0}")]
    PermissionDenied(String),

    #[error("face model failed to load: {0}")]
    ModelLoad(String),

    #[error("face detection failed: {0}")]
    Sample(String),
}

/// Camera stream owned by the attention tracker for its whole lifetime.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Acquire the camera. Fails with `PermissionDenied` when access is refused.
    async fn open(&self) -> Result<(), DetectorError>;

    /// Latest frame, or `None` while the stream is not ready yet.
    async fn next_frame(&self) -> Option<Frame>;

    /// Release the underlying camera. Called once when tracking stops.
    async fn release(&self);
}

/// Face-presence capability. May warm up slowly and may fail per frame.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn load(&self) -> Result<(), DetectorError>;

    async fn detect(&self, frame: &Frame) -> Result<bool, DetectorError>;
}
