//! Form state and client-side validation

use crate::error::ValidationError;
use crate::models::{LocationIcon, ProductScan, StorageLocation};

/// Location chosen for a product: id plus the name copied onto the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRef {
    pub id: String,
    pub name: String,
}

impl LocationRef {
    pub fn of(location: &StorageLocation) -> Option<Self> {
        location.id.as_ref().map(|id| Self {
            id: id.clone(),
            name: location.name.clone(),
        })
    }

    /// The reference a product already carries
    pub fn from_product(product: &ProductScan) -> Option<Self> {
        product.location_id.as_ref().map(|id| Self {
            id: id.clone(),
            name: product.location_name.clone().unwrap_or_default(),
        })
    }
}

/// Inventory entry form, kept as typed text until submitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub barcode: String,
    pub product_name: String,
    pub quantity: String,
    pub location: Option<LocationRef>,
}

/// A product form that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub barcode: String,
    pub product_name: String,
    pub quantity: u32,
}

impl ProductForm {
    pub fn with_quantity(quantity: u32) -> Self {
        Self {
            quantity: quantity.to_string(),
            ..Self::default()
        }
    }

    /// Nothing the user would lose
    pub fn is_blank(&self) -> bool {
        self.barcode.trim().is_empty() && self.product_name.trim().is_empty()
    }

    /// Parsed quantity, `None` unless a whole number of at least 1
    pub fn parsed_quantity(&self) -> Option<u32> {
        self.quantity.trim().parse::<u32>().ok().filter(|q| *q >= 1)
    }

    /// Checks run in order; the first failure is reported.
    pub fn validate(&self) -> Result<ValidProduct, ValidationError> {
        let barcode = self.barcode.trim();
        if barcode.is_empty() {
            return Err(ValidationError::MissingBarcode);
        }
        let product_name = self.product_name.trim();
        if product_name.is_empty() {
            return Err(ValidationError::MissingProductName);
        }
        let quantity = self
            .parsed_quantity()
            .ok_or(ValidationError::InvalidQuantity)?;

        Ok(ValidProduct {
            barcode: barcode.to_string(),
            product_name: product_name.to_string(),
            quantity,
        })
    }
}

/// Storage location entry form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationForm {
    pub name: String,
    pub description: String,
    pub address: String,
    pub icon: LocationIcon,
}

/// A location form that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLocation {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub icon: LocationIcon,
}

impl LocationForm {
    pub fn of(location: &StorageLocation) -> Self {
        Self {
            name: location.name.clone(),
            description: location.description.clone().unwrap_or_default(),
            address: location.address.clone().unwrap_or_default(),
            icon: location.icon_emoji,
        }
    }

    pub fn validate(&self) -> Result<ValidLocation, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingLocationName);
        }
        Ok(ValidLocation {
            name: name.to_string(),
            description: optional(&self.description),
            address: optional(&self.address),
            icon: self.icon,
        })
    }
}

fn optional(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Sign-in form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Trimmed e-mail and the password as typed
    pub fn validate(&self) -> Result<(String, String), ValidationError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if self.password.trim().is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        Ok((email.to_string(), self.password.clone()))
    }
}
