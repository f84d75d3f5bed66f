pub mod capture;
pub mod recorder;

pub use capture::{AudioChunk, AudioFormat, CaptureDevice, CaptureError, CaptureStream, CpalMicrophone, StreamGuard};
pub use recorder::{AudioPayload, Recorder, RecorderError, RecordingStatus};
