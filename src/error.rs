//! Error handling for the LocaScan client

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::device::Permission;

/// Unified error type for the LocaScan client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Local settings file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A remote service answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// Sign-in, sign-up or token refresh was rejected
    #[error("Authentication error: {0}")]
    Auth(String),

    /// No active session for an operation that requires one
    #[error("Not authenticated")]
    Unauthenticated,

    /// A read missed
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create, update or delete failed in transport or on the server
    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    /// Client-side form checks; never reaches the network
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Camera or location permission was not granted
    #[error("Permission denied: {0}")]
    PermissionDenied(Permission),

    /// Location fix did not arrive in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Feature unavailable on this device
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new remote write error
    pub fn remote_write<T: fmt::Display>(msg: T) -> Self {
        Error::RemoteWrite(msg.to_string())
    }

    /// Create a new unsupported-feature error
    pub fn unsupported<T: fmt::Display>(msg: T) -> Self {
        Error::Unsupported(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }
}

/// Field-level failures raised by form validation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("scan or enter a barcode")]
    MissingBarcode,

    #[error("enter the product name")]
    MissingProductName,

    #[error("enter a valid quantity (a whole number of at least 1)")]
    InvalidQuantity,

    #[error("the location name is required")]
    MissingLocationName,

    #[error("enter your email")]
    MissingEmail,

    #[error("enter your password")]
    MissingPassword,
}

pub type Result<T> = std::result::Result<T, Error>;
