use std::time::Duration;

use super::forms::LocationForm;
use super::{Prompt, SubmitOutcome};
use crate::device::{locate, Devices, LocationRequest};
use crate::error::{Error, Result};
use crate::models::{Coordinates, LocationIcon, StorageLocation};
use crate::records::Collection;

/// Drives the storage locations page
#[derive(Debug)]
pub struct LocationController {
    locations: Collection<StorageLocation>,
    devices: Devices,
    fix_timeout: Duration,
    form: LocationForm,
    /// Position taken for the form being edited, if any
    taken: Option<Coordinates>,
    editing: Option<StorageLocation>,
    list: Vec<StorageLocation>,
}

impl LocationController {
    pub fn new(locations: Collection<StorageLocation>, devices: Devices, fix_timeout: Duration) -> Self {
        Self {
            locations,
            devices,
            fix_timeout,
            form: LocationForm::default(),
            taken: None,
            editing: None,
            list: Vec::new(),
        }
    }

    /// Locations with their product counts
    pub fn locations(&self) -> &[StorageLocation] {
        &self.list
    }

    pub fn total(&self) -> usize {
        self.list.len()
    }

    pub fn form(&self) -> &LocationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut LocationForm {
        &mut self.form
    }

    pub fn editing(&self) -> Option<&StorageLocation> {
        self.editing.as_ref()
    }

    /// Coordinates the form would show: a fresh fix, else the edited location's
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.taken
            .or_else(|| self.editing.as_ref().and_then(StorageLocation::coordinates))
    }

    pub async fn on_appearing(&mut self) {
        self.list = self.locations.list_with_counts().await;
    }

    /// Take a high-accuracy fix for the form. There is no saved fallback here.
    pub async fn acquire_coordinates(&mut self) -> Result<Coordinates> {
        let request = LocationRequest::high_accuracy(self.fix_timeout);
        let fix = locate(self.devices.location.as_ref(), &request)
            .await?
            .ok_or_else(|| Error::not_found("no location fix"))?;
        let coordinates = fix.coordinates();
        self.taken = Some(coordinates);
        Ok(coordinates)
    }

    pub fn select_icon(&mut self, icon: LocationIcon) {
        self.form.icon = icon;
    }

    pub fn edit(&mut self, location: &StorageLocation) {
        self.form = LocationForm::of(location);
        self.taken = None;
        self.editing = Some(location.clone());
    }

    pub fn cancel_edit(&mut self) {
        self.clear_form();
    }

    fn clear_form(&mut self) {
        self.form = LocationForm::default();
        self.taken = None;
        self.editing = None;
    }

    /// Validate, then create or update. An edited location keeps its
    /// coordinates unless a new fix was taken.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let valid = match self.form.validate() {
            Ok(valid) => valid,
            Err(e) => {
                log::debug!("location form rejected: {}", e);
                return Err(e.into());
            }
        };

        let outcome = match &self.editing {
            Some(original) => {
                let mut location = original.clone();
                location.name = valid.name;
                location.description = valid.description;
                location.address = valid.address;
                location.icon_emoji = valid.icon;
                if let Some(coordinates) = self.taken {
                    location = location.at(coordinates);
                }
                if !self.locations.update(&location).await {
                    return Err(Error::remote_write("could not update the location"));
                }
                SubmitOutcome::Updated(location.id.unwrap_or_default())
            }
            None => {
                let mut location = StorageLocation::new(&valid.name).with_icon(valid.icon);
                location.description = valid.description;
                location.address = valid.address;
                if let Some(coordinates) = self.taken {
                    location = location.at(coordinates);
                }
                SubmitOutcome::Created(self.locations.create(&location).await?)
            }
        };

        self.clear_form();
        self.on_appearing().await;
        Ok(outcome)
    }

    /// Confirmation shown before deleting; products keep their reference
    pub fn delete_prompt(&self, location: &StorageLocation) -> Prompt {
        let mut message = format!("Delete the location '{}'?", location.name);
        if location.product_count > 0 {
            message.push_str(&format!(
                "\n\n{} product(s) will keep pointing at a location that no longer exists.",
                location.product_count
            ));
        } else {
            message.push_str("\n\nProducts stored here will lose their location.");
        }
        Prompt {
            title: "Confirm deletion".to_string(),
            message,
        }
    }

    /// Delete a confirmed location. Products referencing it are left as they are.
    pub async fn delete(&mut self, location: &StorageLocation) -> Result<()> {
        let id = location
            .id
            .as_deref()
            .ok_or_else(|| Error::general("location has no id"))?;
        if !self.locations.delete(id).await {
            return Err(Error::remote_write("could not delete the location"));
        }
        if self
            .editing
            .as_ref()
            .map_or(false, |editing| editing.id.as_deref() == Some(id))
        {
            self.clear_form();
        }
        self.on_appearing().await;
        Ok(())
    }
}
