/// Register/login exchange with the auth collaborator.
///
/// Plain request/response HTTP calls. The server validates credentials and
/// owns the floor value; the client only submits and displays. No retry or
/// backoff: a failed exchange is surfaced and the user tries again.
use awc::Client;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::client::{LOGIN_PATH, REGISTER_PATH};

#[derive(Debug, Error)]
pub enum AuthError {
    /// The server rejected the credentials; text forwarded verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("auth request failed: {0}")]
    Transport(String),

    #[error("unexpected response from the auth service")]
    Decode,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthOk {
    message: String,
    floor: u32,
}

#[derive(Deserialize)]
struct AuthRejection {
    error: String,
}

/// Successful exchange: the server's greeting and the initial floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub message: String,
    pub floor: u32,
}

pub struct AuthClient {
    http: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: &str) -> Self {
        Self { http: Client::new(), base_url: base_url.to_string() }
    }

    /// Create a new account and establish the session identity.
    pub async fn register(&self, username: &str, password: &str) -> Result<AuthOutcome, AuthError> {
        self.exchange(REGISTER_PATH, username, password).await
    }

    /// Log into an existing account and establish the session identity.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthOutcome, AuthError> {
        self.exchange(LOGIN_PATH, username, password).await
    }

    async fn exchange(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        let mut response = self
            .http
            .post(url)
            .send_json(&Credentials { username, password })
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if response.status().is_success() {
            let body: AuthOk = response.json().await.map_err(|_| AuthError::Decode)?;
            info!("[Auth] {} authenticated at floor {}", username, body.floor);
            Ok(AuthOutcome { message: body.message, floor: body.floor })
        } else {
            let body: AuthRejection = response.json().await.map_err(|_| AuthError::Decode)?;
            Err(AuthError::Rejected(body.error))
        }
    }
}
