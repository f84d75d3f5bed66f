pub mod speech;

pub use speech::{CommandSpeech, PlaybackError, SpeechPlayback};
