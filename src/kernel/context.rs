use std::sync::RwLock;

use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

/// Per-session state shared between the orchestrator, its handle and the
/// network adapter. Created with the session, dropped with it.
#[derive(Debug)]
pub struct SessionContext {
    id: Uuid,
    credential: RwLock<Option<String>>,
    cancel: CancellationToken,
}

impl SessionContext {
    pub fn new(credential: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            credential: RwLock::new(credential),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn credential(&self) -> Option<String> {
        match self.credential.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_credential(&self, token: impl Into<String>) {
        let token = Some(token.into());
        match self.credential.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    /// Called on a 401. The host must re-authenticate before the next call.
    pub fn invalidate_credential(&self) {
        warn!(session = %self.id, "credential rejected, re-authentication required");
        match self.credential.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential().is_some()
    }

    /// Token cancelled when the session ends. Checked before acting on replies.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn request_end(&self) {
        self.cancel.cancel();
    }

    pub fn is_ending(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
