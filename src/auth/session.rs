//! Session management for authentication

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::AuthUser;

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The id token sent with every database request
    pub id_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The signed-in user
    pub user: AuthUser,

    /// Unix timestamp (seconds) at which `id_token` stops being accepted
    pub expires_at: i64,
}

impl Session {
    /// Create a new session that expires `expires_in` seconds from now
    pub fn new(id_token: String, refresh_token: String, user: AuthUser, expires_in: i64) -> Self {
        Self {
            id_token,
            refresh_token,
            user,
            expires_at: Utc::now().timestamp().saturating_add(expires_in),
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }

    /// The owner identifier records are partitioned by
    pub fn uid(&self) -> &str {
        &self.user.uid
    }
}
