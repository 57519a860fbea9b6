//! Credential holder handed explicitly to whatever HTTP layer a host uses.
//!
//! The console keeps one bearer token per signed-in user and signs the user
//! out when the backend answers 401 or 403.

use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.set_token(token);
        session
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Store a token; an empty token clears the session
    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            self.clear();
        } else {
            debug!(target: "session", "Token stored");
            self.token = Some(token);
        }
    }

    pub fn clear(&mut self) {
        if self.token.take().is_some() {
            info!(target: "session", "Session cleared");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Value for the `Authorization` header, if signed in
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// Apply the auto-logout rule to a response status.
    /// Returns true when the session was signed out.
    pub fn handle_status(&mut self, status: u16) -> bool {
        if matches!(status, 401 | 403) && self.is_authenticated() {
            info!(target: "session", "Backend answered {}, signing out", status);
            self.clear();
            return true;
        }
        false
    }
}
