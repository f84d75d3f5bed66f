use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("failed to spawn speech process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("speech process exited with status {0}")]
    Exit(String),
}

/// Speech synthesis capability.
///
/// `speak` resolves on the end-of-playback signal. Dropping the future stops
/// playback; there is no pause/resume.
#[async_trait]
pub trait SpeechPlayback: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), PlaybackError>;
}

/// Words per minute for a relative rate of 1.0 (macOS `say` default).
const BASE_WPM: f32 = 175.0;

/// Speaks through an external TTS program (`say` by default).
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
    /// Flag taking words per minute (`-r` for `say`, `-s` for `espeak`).
    rate_flag: Option<String>,
    rate: f32,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>, rate_flag: Option<String>, rate: f32) -> Self {
        Self {
            program: program.into(),
            args,
            rate_flag,
            rate,
        }
    }

    pub fn words_per_minute(&self) -> u32 {
        (BASE_WPM * self.rate).round().max(1.0) as u32
    }

    /// Arguments after the program name. The text follows `--` so a reply
    /// starting with `-` is never read as a flag.
    pub fn argv(&self, text: &str) -> Vec<String> {
        let mut argv = self.args.clone();
        if let Some(flag) = &self.rate_flag {
            argv.push(flag.clone());
            argv.push(self.words_per_minute().to_string());
        }
        argv.push("--".to_string());
        argv.push(text.to_string());
        argv
    }
}

impl Default for CommandSpeech {
    fn default() -> Self {
        Self::new("say", Vec::new(), Some("-r".to_string()), 1.05)
    }
}

#[async_trait]
impl SpeechPlayback for CommandSpeech {
    async fn speak(&self, text: &str) -> Result<(), PlaybackError> {
        info!(program = %self.program, chars = text.len(), "speech started");

        let mut child = tokio::process::Command::new(&self.program)
            .args(self.argv(text))
            .kill_on_drop(true)
            .spawn()?;

        let status = child.wait().await?;
        debug!(?status, "speech process finished");

        if status.success() {
            Ok(())
        } else {
            Err(PlaybackError::Exit(status.to_string()))
        }
    }
}
