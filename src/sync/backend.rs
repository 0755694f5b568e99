//! The REST contract of the stats backend and its HTTP implementation.

use super::types::BackendError;
use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::game::{StatsDelta, StatsPatch};
use std::time::Duration;

/// The two stats endpoints the client depends on.
///
/// Implementations run on the sync worker thread, hence `Send + 'static`.
pub trait StatsBackend: Send + 'static {
    /// `GET /users/{id}/stats`
    fn fetch_stats(&self) -> Result<StatsPatch, BackendError>;

    /// `POST /users/{id}/update-stats`
    fn update_stats(&self, delta: &StatsDelta) -> Result<StatsPatch, BackendError>;
}

/// Blocking JSON client for the Pixmon REST API.
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
    session: AuthSession,
}

impl HttpBackend {
    pub fn new(base_url: &str, session: AuthSession, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("pixmon/", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn from_config(config: &ClientConfig, session: AuthSession) -> Self {
        Self::new(&config.api_base_url, session, config.request_timeout())
    }

    pub fn stats_url(&self) -> String {
        format!("{}/users/{}/stats", self.base_url, self.session.user_id)
    }

    pub fn update_url(&self) -> String {
        format!("{}/users/{}/update-stats", self.base_url, self.session.user_id)
    }

    fn authorization(&self) -> Result<String, BackendError> {
        if !self.session.is_valid() {
            return Err(BackendError::NotAuthenticated);
        }
        Ok(format!("Bearer {}", self.session.token))
    }
}

impl StatsBackend for HttpBackend {
    fn fetch_stats(&self) -> Result<StatsPatch, BackendError> {
        let response = self
            .agent
            .get(&self.stats_url())
            .set("Authorization", &self.authorization()?)
            .call()?;

        response
            .into_json()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn update_stats(&self, delta: &StatsDelta) -> Result<StatsPatch, BackendError> {
        let response = self
            .agent
            .post(&self.update_url())
            .set("Authorization", &self.authorization()?)
            .send_json(delta)?;

        response
            .into_json()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

impl From<ureq::Error> for BackendError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(401, _) => BackendError::NotAuthenticated,
            ureq::Error::Status(status, response) => {
                let body = response.into_string().unwrap_or_default();
                BackendError::Rejected {
                    status,
                    message: rejection_message(&body),
                }
            }
            ureq::Error::Transport(transport) => BackendError::Network(transport.to_string()),
        }
    }
}

/// Pulls `message` or `error` out of a JSON error body, falling back to the raw text.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
