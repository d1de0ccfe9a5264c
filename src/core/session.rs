//! Session context threaded through every downstream call
//!
//! Carries the caller identity and ERP token explicitly instead of keeping
//! them in process-wide state.

use crate::utils::generate_request_id;
use crate::utils::logging::redact_token;
use chrono::{DateTime, Utc};
use std::fmt;

/// Who is running a batch, and with which ERP session
#[derive(Clone)]
pub struct SessionContext {
    /// Owning user, recorded on every job
    pub user_id: String,
    /// ERP session token, if the bridge requires one
    pub token: Option<String>,
    /// Correlation id for logs
    pub request_id: String,
    pub started_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: None,
            request_id: generate_request_id(),
            started_at: Utc::now(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

// Hand-written so the token never reaches the logs.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("user_id", &self.user_id)
            .field("token", &self.token.as_deref().map(redact_token))
            .field("request_id", &self.request_id)
            .field("started_at", &self.started_at)
            .finish()
    }
}
