pub mod audio;
pub mod config;
pub mod error;
pub mod kernel;
pub mod outputs;
pub mod services;
pub mod vision;

// Re-export specific items for convenient access
pub use error::InterviewError;
pub use kernel::orchestrator::{Orchestrator, SessionHandle, SessionParts};
