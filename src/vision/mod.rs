pub mod attention;
pub mod detector;
pub mod manual;
pub mod tracker;

pub use attention::{AttentionSample, AttentionState, AttentionValue, Thresholds};
pub use tracker::{AttentionReader, AttentionTracker, TrackerPhase, TrackerSettings};
