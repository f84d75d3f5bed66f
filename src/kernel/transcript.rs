use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Candidate,
    Interviewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One utterance in the visible transcript. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMessage {
    speaker: Speaker,
    text: String,
    confidence: Option<f32>,
}

impl TurnMessage {
    pub fn candidate(text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            speaker: Speaker::Candidate,
            text: text.into(),
            confidence: confidence.map(|c| c.clamp(0.0, 1.0)),
        }
    }

    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Interviewer,
            text: text.into(),
            confidence: None,
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }

    pub fn confidence_band(&self) -> Option<ConfidenceBand> {
        self.confidence.map(ConfidenceBand::from_score)
    }
}

/// Append-only, chronologically ordered history of the session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<TurnMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: TurnMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[TurnMessage] {
        &self.messages
    }

    pub fn last_interviewer(&self) -> Option<&TurnMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.speaker == Speaker::Interviewer)
    }
}
