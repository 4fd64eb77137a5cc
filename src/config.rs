//! Configuration options for the LocaScan client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Default identity API base used for email/password sessions
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com";

/// Default secure token API base used for refreshing sessions
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com";

/// Configuration options for the LocaScan client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to refresh an expired id token before using it
    pub auto_refresh_token: bool,

    /// Whether signed-in sessions are written to the settings store
    pub persist_session: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Identity API base URL
    pub auth_url: String,

    /// Secure token API base URL
    pub token_url: String,

    /// GPS timeout on the inventory page
    pub scan_fix_timeout: Duration,

    /// GPS timeout on the locations page
    pub location_fix_timeout: Duration,

    /// How long the splash screen waits before routing
    pub splash_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scan_fix_timeout: Duration::from_secs(10),
            location_fix_timeout: Duration::from_secs(15),
            splash_delay: Duration::from_secs(3),
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the identity API base URL
    pub fn with_auth_url(mut self, value: &str) -> Self {
        self.auth_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the secure token API base URL
    pub fn with_token_url(mut self, value: &str) -> Self {
        self.token_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the GPS timeout used while scanning products
    pub fn with_scan_fix_timeout(mut self, value: Duration) -> Self {
        self.scan_fix_timeout = value;
        self
    }

    /// Set the GPS timeout used while editing storage locations
    pub fn with_location_fix_timeout(mut self, value: Duration) -> Self {
        self.location_fix_timeout = value;
        self
    }

    /// Set the splash delay
    pub fn with_splash_delay(mut self, value: Duration) -> Self {
        self.splash_delay = value;
        self
    }
}

/// Connection settings for one project.
/// Load these from the environment or a secure config source.
#[derive(Debug, Clone)]
pub struct LocaScanConfig {
    pub database_url: Url,
    pub api_key: String,
}

impl LocaScanConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, api_key: String) -> Result<Self> {
        let database_url = Url::parse(url_str)?;
        if api_key.is_empty() {
            return Err(Error::config("api_key cannot be empty"));
        }
        Ok(Self {
            database_url,
            api_key,
        })
    }

    /// Reads `LOCASCAN_DATABASE_URL` and `LOCASCAN_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var("LOCASCAN_DATABASE_URL").map_err(|_| {
            Error::config("LOCASCAN_DATABASE_URL environment variable not found")
        })?;
        let api_key = std::env::var("LOCASCAN_API_KEY")
            .map_err(|_| Error::config("LOCASCAN_API_KEY environment variable not found"))?;
        Self::new(&url_str, api_key)
    }
}
