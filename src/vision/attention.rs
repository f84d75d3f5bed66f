use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Debounced attention signal derived from face presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttentionValue {
    Focused,
    Distracted,
}

impl Default for AttentionValue {
    /// Fail open: without a reliable signal the candidate counts as focused.
    fn default() -> Self {
        Self::Focused
    }
}

impl AttentionValue {
    /// Wire representation used by the backend's `focus_score` field.
    pub fn as_score(self) -> u8 {
        match self {
            Self::Focused => 1,
            Self::Distracted => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Focused => "Focused",
            Self::Distracted => "Distracted",
        }
    }
}

/// One poll result from the face-presence detector.
#[derive(Debug, Clone, Copy)]
pub struct AttentionSample {
    pub at: Instant,
    pub presence: bool,
}

impl AttentionSample {
    pub fn now(presence: bool) -> Self {
        Self {
            at: Instant::now(),
            presence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Consecutive presence=true samples needed to confirm Focused.
    pub focus: u32,
    /// Consecutive presence=false samples needed to confirm Distracted.
    pub distraction: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            focus: 2,
            distraction: 3,
        }
    }
}

/// Hysteresis over noisy presence samples.
///
/// Slower to declare distraction than to declare recovery: a brief look-away
/// or a single missed detection never flips the value on its own.
#[derive(Debug, Clone)]
pub struct AttentionState {
    value: AttentionValue,
    focused_streak: u32,
    distracted_streak: u32,
    thresholds: Thresholds,
    last_sample: Option<Instant>,
}

impl Default for AttentionState {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

impl AttentionState {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            value: AttentionValue::default(),
            focused_streak: 0,
            distracted_streak: 0,
            thresholds,
            last_sample: None,
        }
    }

    pub fn value(&self) -> AttentionValue {
        self.value
    }

    pub fn focused_streak(&self) -> u32 {
        self.focused_streak
    }

    pub fn distracted_streak(&self) -> u32 {
        self.distracted_streak
    }

    pub fn last_sample(&self) -> Option<Instant> {
        self.last_sample
    }

    /// Feed one sample. Returns the new value when this sample confirmed a flip.
    pub fn observe(&mut self, sample: AttentionSample) -> Option<AttentionValue> {
        self.last_sample = Some(sample.at);

        match (self.value, sample.presence) {
            // Staying put needs no streak, only clears the opposing one.
            (AttentionValue::Focused, true) => {
                self.distracted_streak = 0;
                None
            }
            (AttentionValue::Distracted, false) => {
                self.focused_streak = 0;
                None
            }
            (AttentionValue::Focused, false) => {
                self.focused_streak = 0;
                self.distracted_streak += 1;
                if self.distracted_streak >= self.thresholds.distraction {
                    Some(self.flip(AttentionValue::Distracted))
                } else {
                    None
                }
            }
            (AttentionValue::Distracted, true) => {
                self.distracted_streak = 0;
                self.focused_streak += 1;
                if self.focused_streak >= self.thresholds.focus {
                    Some(self.flip(AttentionValue::Focused))
                } else {
                    None
                }
            }
        }
    }

    fn flip(&mut self, to: AttentionValue) -> AttentionValue {
        self.value = to;
        self.focused_streak = 0;
        self.distracted_streak = 0;
        to
    }
}
