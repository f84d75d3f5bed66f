use serde::{Deserialize, Serialize};

use crate::audio::AudioPayload;
use crate::kernel::routing::RouteTag;
use crate::kernel::transcript::TurnMessage;
use crate::vision::AttentionValue;

/// One answer as sent to `POST /api/audio`.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub audio: AudioPayload,
    /// Attention at the instant the answer ended, not over the whole answer.
    pub attention: AttentionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewerReply {
    /// Next interviewer utterance.
    pub text: String,
    /// Transcription of the candidate's answer.
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub interview_ended: bool,
    #[serde(default)]
    pub route: Option<RouteTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: HistorySender,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl HistoryEntry {
    pub fn into_message(self) -> TurnMessage {
        let text = self.question.or(self.answer).unwrap_or_default();
        match self.sender {
            HistorySender::User => TurnMessage::candidate(text, self.confidence),
            HistorySender::Ai => TurnMessage::interviewer(text),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}
