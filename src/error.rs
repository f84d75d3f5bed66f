use thiserror::Error;

use crate::audio::CaptureError;
use crate::kernel::session::SessionState;
use crate::services::interview::BackendError;
use crate::vision::detector::DetectorError;

#[derive(Error, Debug)]
pub enum InterviewError {
    /// Microphone denied. Ends the session attempt.
    #[error("microphone access denied: {0}")]
    Permission(#[source] CaptureError),

    /// Camera denied. Ends the session attempt.
    #[error("camera access denied: {0}")]
    CameraPermission(#[source] DetectorError),

    /// Face detection unavailable. The tracker fails open; reported, never fatal.
    #[error("attention tracking unavailable: {0}")]
    CapabilityInit(#[source] DetectorError),

    /// Submission or history fetch failed. The candidate may answer again.
    #[error("could not reach the interview service: {0}")]
    Network(#[source] BackendError),

    #[error("session expired, sign in again")]
    Unauthorized,

    /// An operation was called in a state that forbids it.
    #[error("`{op}` is not allowed while {state:?}")]
    Logic { op: &'static str, state: SessionState },
}

impl InterviewError {
    pub fn logic(op: &'static str, state: SessionState) -> Self {
        Self::Logic { op, state }
    }

    pub fn is_logic(&self) -> bool {
        matches!(self, Self::Logic { .. })
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission(_) | Self::CameraPermission(_))
    }
}

impl From<BackendError> for InterviewError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unauthorized | BackendError::MissingCredential => Self::Unauthorized,
            other => Self::Network(other),
        }
    }
}

impl From<DetectorError> for InterviewError {
    fn from(e: DetectorError) -> Self {
        match e {
            DetectorError::PermissionDenied(_) => Self::CameraPermission(e),
            DetectorError::ModelLoad(_) | DetectorError::Sample(_) => Self::CapabilityInit(e),
        }
    }
}
