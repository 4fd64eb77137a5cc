//! Email/password authentication and the current session

mod session;
mod types;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::preferences::{SettingValue, SettingsStore};

pub use session::*;
pub use types::AuthUser;
use types::{parse_expires_in, PasswordCredentials, RefreshResponse, SignInResponse};

/// Settings key the persisted session lives under
pub const SESSION_KEY: &str = "auth_session";

/// Anything that can tell who is signed in right now
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// The active, unexpired session, if any
    async fn current_session(&self) -> Option<Session>;

    async fn current_user(&self) -> Option<AuthUser> {
        self.current_session().await.map(|session| session.user)
    }
}

/// Signs users in and out
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_out(&self) -> Result<()>;
}

/// Client for the identity REST API
pub struct Auth {
    /// The project API key
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<Mutex<Option<Session>>>,

    /// Where sessions are persisted, when enabled
    store: Option<Arc<dyn SettingsStore>>,

    /// Client options
    options: ClientOptions,
}

impl Auth {
    /// Create a new Auth client
    pub fn new(key: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            key: key.to_string(),
            client,
            session: Arc::new(Mutex::new(None)),
            store: None,
            options,
        }
    }

    /// Persist sessions into `store` (only when `persist_session` is set)
    pub fn with_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        if self.options.persist_session {
            self.store = Some(store);
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn accounts_url(&self, action: &str) -> String {
        format!("{}/v1/accounts:{}", self.options.auth_url, action)
    }

    async fn password_request(&self, action: &str, email: &str, password: &str) -> Result<Session> {
        let url = self.accounts_url(action);
        let body = PasswordCredentials {
            email,
            password,
            return_secure_token: true,
        };

        let response = Fetch::post(&self.client, &url)
            .query("key", &self.key)
            .timeout(self.options.request_timeout)
            .json(&body)?
            .execute::<SignInResponse>()
            .await
            .map_err(into_auth_error)?;

        let user = AuthUser {
            uid: response.local_id,
            email: response.email.or_else(|| Some(email.to_string())),
            display_name: response.display_name.filter(|name| !name.is_empty()),
        };
        let session = Session::new(
            response.id_token,
            response.refresh_token,
            user,
            parse_expires_in(&response.expires_in),
        );
        self.set_session(session.clone());
        Ok(session)
    }

    /// Sign in a user with email and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .password_request("signInWithPassword", email, password)
            .await?;
        log::info!("signed in as {}", session.uid());
        Ok(session)
    }

    /// Sign up a new user with email and password
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.password_request("signUp", email, password).await?;
        log::info!("created account {}", session.uid());
        Ok(session)
    }

    /// Exchange the refresh token for a new id token
    pub async fn refresh_session(&self) -> Result<Session> {
        let current = self.get_session().ok_or(Error::Unauthenticated)?;
        let url = format!("{}/v1/token", self.options.token_url);

        let response = Fetch::post(&self.client, &url)
            .query("key", &self.key)
            .timeout(self.options.request_timeout)
            .json(&json!({
                "grant_type": "refresh_token",
                "refresh_token": current.refresh_token,
            }))?
            .execute::<RefreshResponse>()
            .await
            .map_err(into_auth_error)?;

        if response.user_id != current.user.uid {
            return Err(Error::auth("refreshed token belongs to another user"));
        }

        let session = Session::new(
            response.id_token,
            response.refresh_token,
            current.user,
            parse_expires_in(&response.expires_in),
        );
        self.set_session(session.clone());
        log::debug!("refreshed session for {}", session.uid());
        Ok(session)
    }

    /// Forget the current session
    pub fn sign_out_local(&self) {
        *self.lock() = None;
        if let Some(store) = &self.store {
            if let Err(e) = store.remove(SESSION_KEY) {
                log::warn!("could not remove persisted session: {}", e);
            }
        }
    }

    /// Get the current session, expired or not
    pub fn get_session(&self) -> Option<Session> {
        self.lock().clone()
    }

    /// Set the session
    pub fn set_session(&self, session: Session) {
        if let Some(store) = &self.store {
            match serde_json::to_string(&session) {
                Ok(text) => {
                    if let Err(e) = store.set(SESSION_KEY, SettingValue::Text(text)) {
                        log::warn!("could not persist session: {}", e);
                    }
                }
                Err(e) => log::warn!("could not encode session: {}", e),
            }
        }
        *self.lock() = Some(session);
    }

    /// Load a previously persisted session into memory
    pub fn restore_session(&self) -> Option<Session> {
        let store = self.store.as_ref()?;
        let text = match store.get(SESSION_KEY) {
            Some(SettingValue::Text(text)) => text,
            _ => return None,
        };
        match serde_json::from_str::<Session>(&text) {
            Ok(session) => {
                *self.lock() = Some(session.clone());
                Some(session)
            }
            Err(e) => {
                log::warn!("discarding unreadable persisted session: {}", e);
                None
            }
        }
    }
}

fn into_auth_error(error: Error) -> Error {
    match error {
        Error::Api { message, .. } => Error::Auth(message),
        other => other,
    }
}

#[async_trait]
impl SessionSource for Auth {
    async fn current_session(&self) -> Option<Session> {
        let session = self.get_session()?;
        if !session.is_expired() {
            return Some(session);
        }
        if !self.options.auto_refresh_token {
            return None;
        }
        match self.refresh_session().await {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("session expired and could not be refreshed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Authenticator for Auth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        self.sign_in_with_password(email, password)
            .await
            .map(|session| session.user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_local();
        Ok(())
    }
}

/// A session set by hand, for offline use and tests
#[derive(Debug, Default)]
pub struct StaticSession {
    session: Mutex<Option<Session>>,
}

impl StaticSession {
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// A long-lived session for `uid`
    pub fn signed_in(uid: &str, email: Option<&str>) -> Self {
        let session = StaticSession::default();
        session.set(Some(Session::new(
            format!("static-{}", uid),
            String::new(),
            AuthUser::new(uid, email),
            i64::from(u32::MAX),
        )));
        session
    }

    pub fn set(&self, session: Option<Session>) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

#[async_trait]
impl SessionSource for StaticSession {
    async fn current_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|session| !session.is_expired())
    }
}
