use serde::{Deserialize, Serialize};

/// Orchestration phase of one interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Ready for the candidate. Recording, when active, happens here.
    AwaitingCandidate,
    /// Answer captured, request being packaged.
    Submitting,
    /// Request sent, reply pending. Drives the "typing" indicator.
    AwaitingInterviewerReply,
    /// Interviewer speech is playing. Recording is not allowed.
    Speaking,
    /// Absorbing. Nothing records, submits or plays after this.
    Terminated,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::AwaitingCandidate
    }
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        self == Self::Terminated
    }
}

/// Requests for a session transition. The graph decides whether they apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    SubmitAnswer,
    RequestIssued,
    SubmissionFailed,
    ReplyReceived,
    /// Replaying the latest interviewer line after a resume.
    ReplayStarted,
    PlaybackEnded,
    Terminate,
}

pub struct SessionGraph;

impl SessionGraph {
    /// Pure function: (current state, request) -> next state.
    /// `None` means the request is illegal in `current`.
    pub fn transition(current: SessionState, request: SessionRequest) -> Option<SessionState> {
        use SessionRequest::*;
        use SessionState::*;

        match (current, request) {
            (Terminated, _) => None,
            (_, Terminate) => Some(Terminated),

            (AwaitingCandidate, SubmitAnswer) => Some(Submitting),
            (AwaitingCandidate, ReplayStarted) => Some(Speaking),

            (Submitting, RequestIssued) => Some(AwaitingInterviewerReply),
            (Submitting, SubmissionFailed) => Some(AwaitingCandidate),

            (AwaitingInterviewerReply, ReplyReceived) => Some(Speaking),
            (AwaitingInterviewerReply, SubmissionFailed) => Some(AwaitingCandidate),

            (Speaking, PlaybackEnded) => Some(AwaitingCandidate),

            _ => None,
        }
    }
}
