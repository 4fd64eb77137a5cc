use std::fmt;
use std::mem;
use std::time::Duration;

use super::forms::{LocationRef, ProductForm};
use super::{Prompt, SubmitOutcome};
use crate::device::{
    locate, Devices, Detector, GeoFix, LocationRequest, Permission, PermissionStatus,
    ScannerOptions,
};
use crate::error::{Error, Result};
use crate::models::{ProductScan, StorageLocation};
use crate::preferences::Preferences;
use crate::records::Collection;

/// Where the inventory page is in its scan/edit flow.
///
/// Permission checks, validation and submission run inside a single call
/// and always end in one of these.
pub enum ScanState {
    Idle,
    /// The camera is open; the detector belongs to this page only
    Scanning(Box<dyn Detector>),
    /// The form holds data the user has not saved yet
    Populated,
}

impl fmt::Debug for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanState::Idle => "Idle",
            ScanState::Scanning(_) => "Scanning",
            ScanState::Populated => "Populated",
        })
    }
}

/// Observable form of [`ScanState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
    Populated,
}

/// What the host should do after a code was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFeedback {
    pub value: String,
    pub vibrate: bool,
    pub sound: bool,
}

/// Where the current position came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixSource {
    Live,
    /// Last fix remembered in preferences
    Saved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryStats {
    pub products: usize,
    pub total_quantity: u64,
}

/// Drives the inventory page: scanning, the entry form and the product list.
pub struct InventoryController {
    products: Collection<ProductScan>,
    locations: Collection<StorageLocation>,
    preferences: Preferences,
    devices: Devices,
    fix_timeout: Duration,
    state: ScanState,
    form: ProductForm,
    fix: Option<GeoFix>,
    editing: Option<ProductScan>,
    product_list: Vec<ProductScan>,
    location_list: Vec<StorageLocation>,
}

impl fmt::Debug for InventoryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryController")
            .field("state", &self.state)
            .field("form", &self.form)
            .field("fix", &self.fix)
            .field("editing", &self.editing.as_ref().and_then(|p| p.id.as_deref()))
            .finish_non_exhaustive()
    }
}

impl InventoryController {
    pub fn new(
        products: Collection<ProductScan>,
        preferences: Preferences,
        devices: Devices,
        fix_timeout: Duration,
    ) -> Self {
        let form = ProductForm::with_quantity(preferences.default_quantity());
        Self {
            locations: products.sibling(),
            products,
            preferences,
            devices,
            fix_timeout,
            state: ScanState::Idle,
            form,
            fix: None,
            editing: None,
            product_list: Vec::new(),
            location_list: Vec::new(),
        }
    }

    pub fn phase(&self) -> ScanPhase {
        match self.state {
            ScanState::Idle => ScanPhase::Idle,
            ScanState::Scanning(_) => ScanPhase::Scanning,
            ScanState::Populated => ScanPhase::Populated,
        }
    }

    pub fn form(&self) -> &ProductForm {
        &self.form
    }

    /// Typed edits; the phase follows on the next transition
    pub fn form_mut(&mut self) -> &mut ProductForm {
        &mut self.form
    }

    pub fn fix(&self) -> Option<GeoFix> {
        self.fix
    }

    pub fn editing(&self) -> Option<&ProductScan> {
        self.editing.as_ref()
    }

    pub fn products(&self) -> &[ProductScan] {
        &self.product_list
    }

    pub fn locations(&self) -> &[StorageLocation] {
        &self.location_list
    }

    pub fn stats(&self) -> InventoryStats {
        InventoryStats {
            products: self.product_list.len(),
            total_quantity: self
                .product_list
                .iter()
                .map(|product| u64::from(product.quantity))
                .sum(),
        }
    }

    fn resting_state(&self) -> ScanState {
        if self.editing.is_some() || !self.form.is_blank() {
            ScanState::Populated
        } else {
            ScanState::Idle
        }
    }

    /// Page became visible
    pub async fn on_appearing(&mut self) {
        self.close_scanner().await;
        self.form.quantity = self.preferences.default_quantity().to_string();

        self.location_list = self.locations.list_all().await;
        self.form.location = None;
        self.reload().await;

        if let Err(e) = self.acquire_location().await {
            log::warn!("no position for new products: {}", e);
        }
    }

    /// Page is going away; the camera never outlives it
    pub async fn on_disappearing(&mut self) {
        self.close_scanner().await;
    }

    pub async fn reload(&mut self) {
        self.product_list = self.products.list_all().await;
    }

    /// Ask for the camera and open a single-result detector.
    pub async fn start_scan(&mut self) -> Result<()> {
        self.close_scanner().await;

        let permissions = &self.devices.permissions;
        let mut status = permissions.check(Permission::Camera).await;
        if status != PermissionStatus::Granted {
            status = permissions.request(Permission::Camera).await;
        }
        if status != PermissionStatus::Granted {
            log::info!("camera permission {:?}", status);
            return Err(Error::PermissionDenied(Permission::Camera));
        }

        let options =
            ScannerOptions::single_result().with_torch(self.preferences.camera_flash_enabled());
        let detector = self.devices.scanner.open(options).await?;
        self.state = ScanState::Scanning(detector);
        Ok(())
    }

    /// Wait for the first code, close the camera and fill the barcode field.
    ///
    /// `None` when no scanner is open or the feed ended without a result.
    pub async fn await_detection(&mut self) -> Option<ScanFeedback> {
        let detected = match &mut self.state {
            ScanState::Scanning(detector) => loop {
                match detector.next_detection().await {
                    Some(batch) => {
                        if let Some(first) = batch.into_iter().next() {
                            break Some(first);
                        }
                    }
                    None => break None,
                }
            },
            _ => return None,
        };

        self.close_scanner().await;
        let detection = detected?;
        log::debug!("scanned {:?} {}", detection.format, detection.value);

        self.form.barcode = detection.value.clone();
        self.preferences.increment_scan_count();
        self.state = ScanState::Populated;

        Some(ScanFeedback {
            value: detection.value,
            vibrate: self.preferences.vibrate_on_scan(),
            sound: self.preferences.sound_on_scan(),
        })
    }

    /// Stop and release the camera if it is open
    pub async fn close_scanner(&mut self) {
        if let ScanState::Scanning(_) = self.state {
            let resting = self.resting_state();
            if let ScanState::Scanning(mut detector) = mem::replace(&mut self.state, resting) {
                detector.stop().await;
            }
        }
    }

    /// Take a high-accuracy fix, falling back to the last saved one.
    pub async fn acquire_location(&mut self) -> Result<FixSource> {
        let request = LocationRequest::high_accuracy(self.fix_timeout);
        let failure = match locate(self.devices.location.as_ref(), &request).await {
            Ok(Some(fix)) => {
                self.fix = Some(fix);
                self.preferences.save_last_location(fix.coordinates());
                return Ok(FixSource::Live);
            }
            Ok(None) => Error::not_found("no location fix"),
            Err(e) => e,
        };

        match self.preferences.last_location() {
            Some(saved) => {
                log::debug!("using saved position after: {}", failure);
                self.fix = Some(saved.into());
                Ok(FixSource::Saved)
            }
            None => {
                self.fix = None;
                Err(failure)
            }
        }
    }

    pub fn increase_quantity(&mut self) {
        let next = match self.form.quantity.trim().parse::<u32>() {
            Ok(quantity) => quantity.saturating_add(1),
            Err(_) => 1,
        };
        self.form.quantity = next.to_string();
    }

    /// Never goes below 1
    pub fn decrease_quantity(&mut self) {
        let next = match self.form.quantity.trim().parse::<u32>() {
            Ok(quantity) if quantity > 1 => quantity - 1,
            _ => 1,
        };
        self.form.quantity = next.to_string();
    }

    /// Pick a location from the loaded list, `None` for no location.
    ///
    /// Returns `false` when the id is not in the list.
    pub fn select_location(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.form.location = None;
                true
            }
            Some(id) => {
                let found = self
                    .location_list
                    .iter()
                    .find(|location| location.id.as_deref() == Some(id))
                    .and_then(LocationRef::of);
                match found {
                    Some(location) => {
                        self.form.location = Some(location);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Load an existing product into the form for editing
    pub async fn edit(&mut self, product: &ProductScan) {
        self.close_scanner().await;

        let location = product.location_id.as_deref().and_then(|id| {
            self.location_list
                .iter()
                .find(|location| location.id.as_deref() == Some(id))
                .and_then(LocationRef::of)
        });

        self.form = ProductForm {
            barcode: product.barcode.clone(),
            product_name: product.product_name.clone(),
            quantity: product.quantity.to_string(),
            location: location.or_else(|| LocationRef::from_product(product)),
        };
        if let Some(coordinates) = product.coordinates() {
            let mut fix = GeoFix::from(coordinates);
            fix.accuracy = product.accuracy;
            self.fix = Some(fix);
        }
        self.editing = Some(product.clone());
        self.state = ScanState::Populated;
    }

    pub async fn cancel_edit(&mut self) {
        self.close_scanner().await;
        self.clear_form();
    }

    fn clear_form(&mut self) {
        self.form = ProductForm::with_quantity(self.preferences.default_quantity());
        self.editing = None;
        self.state = ScanState::Idle;
    }

    /// Validate the form, then create or update.
    ///
    /// Validation failures never reach the network. On any failure the
    /// form is left as it was so the user can retry.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        self.close_scanner().await;
        let valid = match self.form.validate() {
            Ok(valid) => valid,
            Err(e) => {
                log::debug!("product form rejected: {}", e);
                return Err(e.into());
            }
        };

        let mut product = ProductScan::new(&valid.barcode, &valid.product_name, valid.quantity);
        if let Some(fix) = self.fix {
            product = product.at(fix.coordinates());
            product.accuracy = fix.accuracy;
        }
        if let Some(location) = &self.form.location {
            product.location_id = Some(location.id.clone());
            product.location_name = Some(location.name.clone());
        }

        let outcome = match &self.editing {
            Some(original) => {
                product.id = original.id.clone();
                product.scan_date = original.scan_date;
                product.user_email = original.user_email.clone();
                if !self.products.update(&product).await {
                    return Err(Error::remote_write("could not update the product"));
                }
                SubmitOutcome::Updated(product.id.unwrap_or_default())
            }
            None => SubmitOutcome::Created(self.products.create(&product).await?),
        };

        self.clear_form();
        self.preferences.touch_last_sync();
        self.reload().await;
        Ok(outcome)
    }

    /// Confirmation shown before deleting
    pub fn delete_prompt(&self, product: &ProductScan) -> Prompt {
        Prompt {
            title: "Confirm deletion".to_string(),
            message: format!("Delete '{}'?", product.product_name),
        }
    }

    /// Delete a confirmed product and drop it from the list
    pub async fn delete(&mut self, product: &ProductScan) -> Result<()> {
        let id = product
            .id
            .as_deref()
            .ok_or_else(|| Error::general("product has no id"))?;
        if !self.products.delete(id).await {
            return Err(Error::remote_write("could not delete the product"));
        }

        self.product_list
            .retain(|listed| listed.id.as_deref() != Some(id));
        if self
            .editing
            .as_ref()
            .map_or(false, |editing| editing.id.as_deref() == Some(id))
        {
            self.clear_form();
        }
        Ok(())
    }
}
