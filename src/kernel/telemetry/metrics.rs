use std::collections::VecDeque;

use super::event::TelemetryEvent;
use crate::kernel::event::TerminationReason;
use crate::vision::AttentionValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub transitions: u64,
    pub turns: u64,
    pub focused_submissions: u64,
    pub distracted_submissions: u64,
    pub submission_failures: u64,
    pub late_replies: u64,
    pub playback_faults: u64,
    pub avg_round_trip_ms: f64,
    pub ended: Option<TerminationReason>,
}

impl TelemetrySnapshot {
    /// Share of submissions made while focused, 1.0 when nothing was submitted.
    pub fn focus_ratio(&self) -> f64 {
        let total = self.focused_submissions + self.distracted_submissions;
        if total == 0 {
            1.0
        } else {
            self.focused_submissions as f64 / total as f64
        }
    }
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut total_round_trip_ms = 0u64;

    for event in events {
        match event {
            TelemetryEvent::Transition { .. } => snap.transitions += 1,
            TelemetryEvent::AnswerSubmitted { attention, .. } => match attention {
                AttentionValue::Focused => snap.focused_submissions += 1,
                AttentionValue::Distracted => snap.distracted_submissions += 1,
            },
            TelemetryEvent::ReplyReceived { round_trip_ms, .. } => {
                snap.turns += 1;
                total_round_trip_ms += round_trip_ms;
            }
            TelemetryEvent::SubmissionFailed => snap.submission_failures += 1,
            TelemetryEvent::LateReplyDiscarded => snap.late_replies += 1,
            TelemetryEvent::PlaybackFault => snap.playback_faults += 1,
            TelemetryEvent::SessionEnded { reason } => snap.ended = Some(*reason),
        }
    }

    if snap.turns > 0 {
        snap.avg_round_trip_ms = total_round_trip_ms as f64 / snap.turns as f64;
    }

    snap
}
