use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{AnswerSubmission, HistoryEntry, HistoryResponse, InterviewerReply};
use crate::config::BackendSettings;
use crate::kernel::context::SessionContext;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("not signed in")]
    MissingCredential,

    #[error("credential rejected, sign in again")]
    Unauthorized,

    #[error("backend returned {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not encode answer audio: {0}")]
    Encode(#[from] hound::Error),
}

/// Remote reasoning backend. Every call carries the session's bearer credential.
#[async_trait]
pub trait InterviewBackend: Send + Sync {
    async fn submit_answer(&self, submission: AnswerSubmission) -> Result<InterviewerReply, BackendError>;

    async fn history(&self) -> Result<Vec<HistoryEntry>, BackendError>;

    /// Best-effort notification; callers ignore failures.
    async fn end_interview(&self) -> Result<(), BackendError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    context: Arc<SessionContext>,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings, context: Arc<SessionContext>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            context,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<String, BackendError> {
        self.context.credential().ok_or(BackendError::MissingCredential)
    }

    /// A 401 from any endpoint invalidates the stored credential.
    fn check(&self, response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.context.invalidate_credential();
            return Err(BackendError::Unauthorized);
        }
        if !status.is_success() {
            warn!(%status, url = %response.url(), "backend call failed");
            return Err(BackendError::Status(status));
        }
        Ok(response)
    }
}

#[async_trait]
impl InterviewBackend for HttpBackend {
    async fn submit_answer(&self, submission: AnswerSubmission) -> Result<InterviewerReply, BackendError> {
        let token = self.bearer()?;
        let wav = submission.audio.to_wav()?;
        debug!(bytes = wav.len(), attention = ?submission.attention, "submitting answer");

        let audio = Part::bytes(wav)
            .file_name("answer.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .part("audio", audio)
            .text("focus_score", submission.attention.as_score().to_string());

        let response = self
            .client
            .post(self.url("/api/audio"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let reply: InterviewerReply = self.check(response)?.json().await?;
        Ok(reply)
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, BackendError> {
        let token = self.bearer()?;
        let response = self
            .client
            .get(self.url("/api/history"))
            .bearer_auth(token)
            .send()
            .await?;

        let body: HistoryResponse = self.check(response)?.json().await?;
        Ok(body.history)
    }

    async fn end_interview(&self) -> Result<(), BackendError> {
        let token = self.bearer()?;
        let response = self
            .client
            .post(self.url("/api/end-interview"))
            .bearer_auth(token)
            .send()
            .await?;

        self.check(response)?;
        Ok(())
    }
}
