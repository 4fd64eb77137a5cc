//! Records stored in the realtime database
//!
//! Field names on the wire are PascalCase so that records written by the
//! mobile application and by this crate are interchangeable. The record id is
//! the database key and never part of the body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Display accent given to new storage locations
pub const DEFAULT_LOCATION_COLOR: &str = "#6750A4";

/// A pair of decimal-degree coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reads the stored pair where `0, 0` means "no fix".
    pub fn from_stored(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude != 0.0 || longitude != 0.0 {
            Some(Self::new(latitude, longitude))
        } else {
            None
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Precision carries through, e.g. `{:.4}` for the compact form.
        let precision = f.precision().unwrap_or(6);
        write!(
            f,
            "{:.*}, {:.*}",
            precision, self.latitude, precision, self.longitude
        )
    }
}

/// One scanned product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductScan {
    #[serde(skip)]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub barcode: String,

    #[serde(default, deserialize_with = "nullable")]
    pub product_name: String,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,

    #[serde(default)]
    pub accuracy: Option<f64>,

    /// Set at creation, kept across updates
    #[serde(default = "Utc::now")]
    pub scan_date: DateTime<Utc>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub user_email: Option<String>,

    #[serde(default)]
    pub location_id: Option<String>,

    /// Copy of the location name so lists need no second read
    #[serde(default)]
    pub location_name: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl ProductScan {
    pub fn new(barcode: &str, product_name: &str, quantity: u32) -> Self {
        Self {
            id: None,
            barcode: barcode.to_string(),
            product_name: product_name.to_string(),
            quantity,
            latitude: 0.0,
            longitude: 0.0,
            accuracy: None,
            scan_date: Utc::now(),
            user_id: None,
            user_email: None,
            location_id: None,
            location_name: None,
        }
    }

    /// Attach a fix
    pub fn at(mut self, coordinates: Coordinates) -> Self {
        self.latitude = coordinates.latitude;
        self.longitude = coordinates.longitude;
        self
    }

    /// Point at a storage location
    pub fn stored_in(mut self, location: &StorageLocation) -> Self {
        self.location_id = location.id.clone();
        self.location_name = Some(location.name.clone());
        self
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_stored(self.latitude, self.longitude)
    }

    /// Location name for display
    pub fn location_label(&self) -> &str {
        match self.location_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "No location",
        }
    }
}

/// Icons a storage location can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocationIcon {
    #[default]
    Pin,
    Warehouse,
    Store,
    Home,
    Package,
}

impl LocationIcon {
    pub const ALL: [LocationIcon; 5] = [
        LocationIcon::Pin,
        LocationIcon::Warehouse,
        LocationIcon::Store,
        LocationIcon::Home,
        LocationIcon::Package,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            LocationIcon::Pin => "📍",
            LocationIcon::Warehouse => "🏭",
            LocationIcon::Store => "🏪",
            LocationIcon::Home => "🏠",
            LocationIcon::Package => "📦",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LocationIcon::Pin => "pin",
            LocationIcon::Warehouse => "warehouse",
            LocationIcon::Store => "store",
            LocationIcon::Home => "home",
            LocationIcon::Package => "package",
        }
    }
}

/// Accepts the icon name, in any case, or the emoji itself
impl FromStr for LocationIcon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        LocationIcon::ALL
            .into_iter()
            .find(|icon| icon.name().eq_ignore_ascii_case(s) || icon.emoji() == s)
            .ok_or_else(|| Error::general(format!("unknown icon '{}'", s)))
    }
}

impl From<String> for LocationIcon {
    fn from(emoji: String) -> Self {
        LocationIcon::ALL
            .into_iter()
            .find(|icon| icon.emoji() == emoji)
            .unwrap_or_default()
    }
}

impl From<LocationIcon> for String {
    fn from(icon: LocationIcon) -> Self {
        icon.emoji().to_string()
    }
}

impl fmt::Display for LocationIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

/// A place where products are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageLocation {
    #[serde(skip)]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,

    #[serde(default, deserialize_with = "nullable")]
    pub icon_emoji: LocationIcon,

    #[serde(default = "default_color", deserialize_with = "nullable_color")]
    pub color: String,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub user_id: Option<String>,

    /// Derived on read, never stored
    #[serde(skip)]
    pub product_count: usize,
}

fn default_color() -> String {
    DEFAULT_LOCATION_COLOR.to_string()
}

impl StorageLocation {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            description: None,
            address: None,
            latitude: 0.0,
            longitude: 0.0,
            icon_emoji: LocationIcon::default(),
            color: default_color(),
            created_at: Utc::now(),
            user_id: None,
            product_count: 0,
        }
    }

    pub fn at(mut self, coordinates: Coordinates) -> Self {
        self.latitude = coordinates.latitude;
        self.longitude = coordinates.longitude;
        self
    }

    pub fn with_icon(mut self, icon: LocationIcon) -> Self {
        self.icon_emoji = icon;
        self
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_stored(self.latitude, self.longitude)
    }

    /// Icon and name, as shown in pickers
    pub fn label(&self) -> String {
        format!("{} {}", self.icon_emoji, self.name)
    }
}

/// `null` reads as the type's default
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn nullable_color<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|color| color.unwrap_or_else(default_color))
}
