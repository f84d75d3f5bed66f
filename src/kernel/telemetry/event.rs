use serde::{Deserialize, Serialize};

use crate::kernel::event::TerminationReason;
use crate::kernel::routing::RoutingDecision;
use crate::kernel::session::SessionState;
use crate::vision::AttentionValue;

// Allowed: states, durations, counts, enums.
// Forbidden: audio, transcript text, reply text.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    Transition {
        from: SessionState,
        to: SessionState,
    },

    AnswerSubmitted {
        attention: AttentionValue,
        audio_ms: u64,
    },

    ReplyReceived {
        round_trip_ms: u64,
        decision: RoutingDecision,
    },

    SubmissionFailed,

    LateReplyDiscarded,

    PlaybackFault,

    SessionEnded {
        reason: TerminationReason,
    },
}
