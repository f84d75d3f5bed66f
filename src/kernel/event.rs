use serde::{Deserialize, Serialize};

use super::session::SessionState;
use super::transcript::TurnMessage;

/// Why a session reached `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Explicit end-session request from the candidate or host.
    EndedByCandidate,
    /// Backend flagged the interview as ended, or the reply said so.
    InterviewComplete,
    /// Handed off to the separate coding-round flow.
    CodingRound,
    /// Camera or microphone could not be acquired.
    PermissionDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    BehavioralRound,
}

/// Notifications for the host UI, in the order they happened.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged { from: SessionState, to: SessionState },
    RecordingStarted,
    RecordingStopped { duration_ms: u64 },
    MessageAppended(TurnMessage),
    Notice(Notice),
    /// Leave this session for the coding-round flow.
    CodingRound,
    /// Something the candidate must be told about. The session stays usable
    /// unless an `Ended` event follows.
    Error(String),
    ReauthenticationRequired,
    Ended(TerminationReason),
}

/// Host commands accepted by a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Resume,
    BeginAnswer,
    EndAnswer,
    EndSession,
}
