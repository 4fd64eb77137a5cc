use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::forms::LoginForm;
use crate::auth::{AuthUser, Authenticator, SessionSource};
use crate::error::Result;
use crate::preferences::Preferences;

/// Entry points the gate can send the user to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Inventory,
}

/// Decides between the login page and the inventory at startup
#[derive(Clone)]
pub struct SessionGate {
    sessions: Arc<dyn SessionSource>,
    auth: Arc<dyn Authenticator>,
    preferences: Preferences,
    splash_delay: Duration,
}

impl fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGate")
            .field("splash_delay", &self.splash_delay)
            .finish_non_exhaustive()
    }
}

impl SessionGate {
    pub fn new(
        sessions: Arc<dyn SessionSource>,
        auth: Arc<dyn Authenticator>,
        preferences: Preferences,
        splash_delay: Duration,
    ) -> Self {
        Self {
            sessions,
            auth,
            preferences,
            splash_delay,
        }
    }

    pub async fn route(&self) -> Route {
        match self.sessions.current_user().await {
            Some(_) => Route::Inventory,
            None => Route::Login,
        }
    }

    /// Route once the splash screen has been shown
    pub async fn route_after_splash(&self) -> Route {
        tokio::time::sleep(self.splash_delay).await;
        self.preferences.set_first_launch(false);
        self.route().await
    }

    /// Validate and sign in, caching the user's display fields
    pub async fn login(&self, form: &LoginForm) -> Result<AuthUser> {
        let (email, password) = form.validate()?;
        let user = self.auth.sign_in(&email, &password).await?;
        self.preferences.save_user_info(
            user.email.as_deref().unwrap_or(&email),
            &user.display_name_or_default(),
        );
        log::info!("signed in {}", user.uid);
        Ok(user)
    }

    pub async fn logout(&self) -> Result<Route> {
        self.auth.sign_out().await?;
        self.preferences.clear_user_info();
        Ok(Route::Login)
    }
}
