//! Session telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer. It is never consulted by the
//! orchestrator when deciding a transition.
//!
//! # PRIVACY INVARIANT
//! Events never carry candidate content (audio, transcript text). Only states,
//! durations and counts.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::TelemetryEvent;
pub use metrics::TelemetrySnapshot;
pub use recorder::TelemetryRecorder;
