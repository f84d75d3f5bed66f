use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::outputs::CommandSpeech;
use crate::vision::{Thresholds, TrackerSettings};

pub const ENV_API_URL: &str = "INTERLOCUTOR_API_URL";
pub const ENV_TOKEN: &str = "INTERLOCUTOR_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub attention: AttentionSettings,

    #[serde(default)]
    pub speech: SpeechSettings,

    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Bearer credential. Usually supplied through the environment.
    pub token: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionSettings {
    pub poll_interval_ms: u64,
    pub focus_threshold: u32,
    pub distraction_threshold: u32,
}

impl Default for AttentionSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            focus_threshold: 2,
            distraction_threshold: 3,
        }
    }
}

impl AttentionSettings {
    pub fn tracker(&self) -> TrackerSettings {
        TrackerSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            thresholds: Thresholds {
                focus: self.focus_threshold,
                distraction: self.distraction_threshold,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub program: String,
    pub args: Vec<String>,
    pub rate_flag: Option<String>,
    /// Relative speaking rate, 1.0 is the program's normal pace.
    pub rate: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            program: "say".to_string(),
            args: Vec::new(),
            rate_flag: Some("-r".to_string()),
            rate: 1.05,
        }
    }
}

impl SpeechSettings {
    pub fn playback(&self) -> CommandSpeech {
        CommandSpeech::new(&self.program, self.args.clone(), self.rate_flag.clone(), self.rate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Speak the latest interviewer line again after a resume.
    pub replay_last_on_resume: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            replay_last_on_resume: true,
        }
    }
}

impl InterviewConfig {
    /// Reads `path` when given (defaults otherwise), then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("parsing config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL) {
            self.backend.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.backend.token = Some(token);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.attention.focus_threshold == 0 || self.attention.distraction_threshold == 0 {
            bail!("attention thresholds must be at least 1");
        }
        if self.attention.poll_interval_ms == 0 {
            bail!("attention.poll_interval_ms must be positive");
        }
        Ok(())
    }
}
