pub mod client;
pub mod types;

pub use client::{BackendError, HttpBackend, InterviewBackend};
pub use types::{AnswerSubmission, HistoryEntry, HistorySender, InterviewerReply};
