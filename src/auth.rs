//! Stored credentials used to authenticate stats requests.
//!
//! Login itself happens against the backend; the client only keeps the
//! resulting user id and token between runs.

use crate::game::constants::SESSION_FILE;
use crate::utils::persistence::Storage;
use serde::{Deserialize, Serialize};
use std::io;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user_id: String,
    pub token: String,
}

impl AuthSession {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.token.trim().is_empty()
    }

    /// The stored session, if any. A stored but incomplete session counts as none.
    pub fn load(storage: &Storage) -> io::Result<Option<Self>> {
        Ok(storage
            .load_json::<Self>(SESSION_FILE)?
            .filter(AuthSession::is_valid))
    }

    pub fn save(&self, storage: &Storage) -> io::Result<()> {
        storage.save_json(SESSION_FILE, self)
    }

    /// Logout.
    pub fn clear(storage: &Storage) -> io::Result<()> {
        storage.remove(SESSION_FILE)
    }
}
