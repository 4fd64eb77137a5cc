//! LocaScan client library
//!
//! Inventory tracking over a realtime database: users sign in, scan
//! barcodes, tag each scan with a position and a storage location, and keep
//! the records in their own partition of the database.

pub mod auth;
pub mod config;
pub mod controller;
pub mod database;
pub mod device;
pub mod error;
pub mod fetch;
pub mod models;
pub mod preferences;
pub mod records;

use reqwest::Client;
use std::sync::Arc;
use url::Url;

use crate::auth::{Auth, Authenticator, SessionSource};
use crate::config::{ClientOptions, LocaScanConfig};
use crate::controller::{InventoryController, LocationController, SessionGate};
use crate::database::{Database, RestDatabase};
use crate::device::Devices;
use crate::error::Result;
use crate::models::{ProductScan, StorageLocation};
use crate::preferences::{MemorySettings, Preferences, SettingsStore};
use crate::records::Collection;

/// The main entry point for the LocaScan client
pub struct LocaScan {
    /// Root of the realtime database
    pub database_url: Url,
    /// The project API key
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    auth: Arc<Auth>,
    database: Arc<dyn Database>,
    preferences: Preferences,
}

impl LocaScan {
    /// Create a new LocaScan client
    ///
    /// # Arguments
    ///
    /// * `database_url` - Root URL of the realtime database
    /// * `api_key` - The web API key of the project
    ///
    /// # Example
    ///
    /// ```
    /// use locascan::LocaScan;
    ///
    /// let client = LocaScan::new("https://your-project-default-rtdb.firebaseio.com", "your-api-key").unwrap();
    /// ```
    pub fn new(database_url: &str, api_key: &str) -> Result<Self> {
        Self::new_with_options(database_url, api_key, ClientOptions::default())
    }

    /// Create a new LocaScan client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use locascan::{LocaScan, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_auto_refresh_token(true);
    /// let client = LocaScan::new_with_options(
    ///     "https://your-project-default-rtdb.firebaseio.com",
    ///     "your-api-key",
    ///     options
    /// ).unwrap();
    /// ```
    pub fn new_with_options(database_url: &str, api_key: &str, options: ClientOptions) -> Result<Self> {
        let config = LocaScanConfig::new(database_url, api_key.to_string())?;
        Ok(Self::from_config(config, options))
    }

    /// Build a client from a loaded configuration
    pub fn from_config(config: LocaScanConfig, options: ClientOptions) -> Self {
        let http_client = Client::new();
        let auth = Auth::new(&config.api_key, http_client.clone(), options.clone());
        let database = RestDatabase::new(
            config.database_url.clone(),
            http_client.clone(),
            options.clone(),
        );

        Self {
            database_url: config.database_url,
            key: config.api_key,
            http_client,
            options,
            auth: Arc::new(auth),
            database: Arc::new(database),
            preferences: Preferences::new(Arc::new(MemorySettings::new())),
        }
    }

    /// Build a client from `LOCASCAN_DATABASE_URL` and `LOCASCAN_API_KEY`
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(
            LocaScanConfig::from_env()?,
            ClientOptions::default(),
        ))
    }

    /// Keep preferences, and the session when enabled, in `store`.
    ///
    /// Replaces the auth client, so call this before signing in.
    pub fn with_settings(mut self, store: Arc<dyn SettingsStore>) -> Self {
        let auth = Auth::new(&self.key, self.http_client.clone(), self.options.clone())
            .with_store(store.clone());
        auth.restore_session();
        self.auth = Arc::new(auth);
        self.preferences = Preferences::new(store);
        self
    }

    /// Use another database backend, e.g. [`database::MemoryDatabase`]
    pub fn with_database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = database;
        self
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Who is signed in, for the record service
    pub fn sessions(&self) -> Arc<dyn SessionSource> {
        self.auth.clone()
    }

    pub fn authenticator(&self) -> Arc<dyn Authenticator> {
        self.auth.clone()
    }

    pub fn database(&self) -> Arc<dyn Database> {
        self.database.clone()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// The signed-in user's product scans
    pub fn product_scans(&self) -> Collection<ProductScan> {
        Collection::new(self.database(), self.sessions())
    }

    /// The signed-in user's storage locations
    pub fn locations(&self) -> Collection<StorageLocation> {
        Collection::new(self.database(), self.sessions())
    }

    /// Controller for the inventory page
    pub fn inventory(&self, devices: Devices) -> InventoryController {
        InventoryController::new(
            self.product_scans(),
            self.preferences.clone(),
            devices,
            self.options.scan_fix_timeout,
        )
    }

    /// Controller for the locations page
    pub fn locations_page(&self, devices: Devices) -> LocationController {
        LocationController::new(self.locations(), devices, self.options.location_fix_timeout)
    }

    /// Startup routing, sign-in and sign-out
    pub fn session_gate(&self) -> SessionGate {
        SessionGate::new(
            self.sessions(),
            self.authenticator(),
            self.preferences.clone(),
            self.options.splash_delay,
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::LocaScan;
    pub use crate::auth::{AuthUser, Session};
    pub use crate::config::ClientOptions;
    pub use crate::controller::{LoginForm, Route, SubmitOutcome};
    pub use crate::device::Devices;
    pub use crate::error::{Error, Result};
    pub use crate::models::{Coordinates, LocationIcon, ProductScan, StorageLocation};
    pub use crate::preferences::Preferences;
}
