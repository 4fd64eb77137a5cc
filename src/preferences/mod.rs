//! Local user settings, last-known fix and usage counters

mod store;

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;
use std::sync::Arc;

use crate::auth::SESSION_KEY;
use crate::models::Coordinates;

pub use store::*;

/// Setting keys
pub mod keys {
    pub const DARK_MODE: &str = "dark_mode";
    pub const AUTO_SCAN: &str = "auto_scan";
    pub const VIBRATE_ON_SCAN: &str = "vibrate_on_scan";
    pub const SOUND_ON_SCAN: &str = "sound_on_scan";
    pub const CAMERA_FLASH: &str = "camera_flash";
    pub const DEFAULT_QUANTITY: &str = "default_quantity";
    pub const LAST_LATITUDE: &str = "last_latitude";
    pub const LAST_LONGITUDE: &str = "last_longitude";
    pub const USER_EMAIL: &str = "user_email";
    pub const USER_NAME: &str = "user_name";
    pub const FIRST_LAUNCH: &str = "first_launch";
    pub const SCAN_COUNT: &str = "scan_count";
    pub const LAST_SYNC_DATE: &str = "last_sync_date";
}

/// Typed accessors with defaults over an injected [`SettingsStore`].
///
/// Write failures are logged and otherwise ignored, the same way the
/// platform preference APIs behave.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn SettingsStore>,
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

impl Preferences {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Preferences that vanish with the process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySettings::new()))
    }

    pub fn store(&self) -> Arc<dyn SettingsStore> {
        self.store.clone()
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.store
            .get(key)
            .and_then(|value| value.as_bool())
            .unwrap_or(default)
    }

    fn int_or(&self, key: &str, default: i64) -> i64 {
        self.store
            .get(key)
            .and_then(|value| value.as_int())
            .unwrap_or(default)
    }

    fn double_or(&self, key: &str, default: f64) -> f64 {
        self.store
            .get(key)
            .and_then(|value| value.as_double())
            .unwrap_or(default)
    }

    fn text_or_empty(&self, key: &str) -> String {
        self.store
            .get(key)
            .and_then(|value| value.as_text().map(str::to_string))
            .unwrap_or_default()
    }

    fn put(&self, key: &str, value: SettingValue) {
        if let Err(e) = self.store.set(key, value) {
            log::warn!("could not save setting {}: {}", key, e);
        }
    }

    pub fn is_dark_mode(&self) -> bool {
        self.bool_or(keys::DARK_MODE, false)
    }

    pub fn set_dark_mode(&self, value: bool) {
        self.put(keys::DARK_MODE, SettingValue::Bool(value));
    }

    pub fn auto_scan_enabled(&self) -> bool {
        self.bool_or(keys::AUTO_SCAN, true)
    }

    pub fn set_auto_scan_enabled(&self, value: bool) {
        self.put(keys::AUTO_SCAN, SettingValue::Bool(value));
    }

    pub fn vibrate_on_scan(&self) -> bool {
        self.bool_or(keys::VIBRATE_ON_SCAN, true)
    }

    pub fn set_vibrate_on_scan(&self, value: bool) {
        self.put(keys::VIBRATE_ON_SCAN, SettingValue::Bool(value));
    }

    pub fn sound_on_scan(&self) -> bool {
        self.bool_or(keys::SOUND_ON_SCAN, true)
    }

    pub fn set_sound_on_scan(&self, value: bool) {
        self.put(keys::SOUND_ON_SCAN, SettingValue::Bool(value));
    }

    pub fn camera_flash_enabled(&self) -> bool {
        self.bool_or(keys::CAMERA_FLASH, false)
    }

    pub fn set_camera_flash_enabled(&self, value: bool) {
        self.put(keys::CAMERA_FLASH, SettingValue::Bool(value));
    }

    /// Quantity pre-filled into new products, never below 1
    pub fn default_quantity(&self) -> u32 {
        u32::try_from(self.int_or(keys::DEFAULT_QUANTITY, 1))
            .unwrap_or(1)
            .max(1)
    }

    pub fn set_default_quantity(&self, value: u32) {
        self.put(keys::DEFAULT_QUANTITY, SettingValue::Int(i64::from(value)));
    }

    pub fn last_latitude(&self) -> f64 {
        self.double_or(keys::LAST_LATITUDE, 0.0)
    }

    pub fn last_longitude(&self) -> f64 {
        self.double_or(keys::LAST_LONGITUDE, 0.0)
    }

    pub fn save_last_location(&self, coordinates: Coordinates) {
        self.put(keys::LAST_LATITUDE, SettingValue::Double(coordinates.latitude));
        self.put(keys::LAST_LONGITUDE, SettingValue::Double(coordinates.longitude));
    }

    /// True when either stored coordinate is non-zero
    pub fn has_saved_location(&self) -> bool {
        self.last_latitude() != 0.0 || self.last_longitude() != 0.0
    }

    pub fn last_location(&self) -> Option<Coordinates> {
        Coordinates::from_stored(self.last_latitude(), self.last_longitude())
    }

    pub fn user_email(&self) -> String {
        self.text_or_empty(keys::USER_EMAIL)
    }

    pub fn user_name(&self) -> String {
        self.text_or_empty(keys::USER_NAME)
    }

    pub fn save_user_info(&self, email: &str, name: &str) {
        self.put(keys::USER_EMAIL, SettingValue::Text(email.to_string()));
        self.put(keys::USER_NAME, SettingValue::Text(name.to_string()));
    }

    pub fn clear_user_info(&self) {
        self.save_user_info("", "");
    }

    pub fn is_first_launch(&self) -> bool {
        self.bool_or(keys::FIRST_LAUNCH, true)
    }

    pub fn set_first_launch(&self, value: bool) {
        self.put(keys::FIRST_LAUNCH, SettingValue::Bool(value));
    }

    pub fn scan_count(&self) -> u64 {
        u64::try_from(self.int_or(keys::SCAN_COUNT, 0)).unwrap_or(0)
    }

    pub fn set_scan_count(&self, value: u64) {
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        self.put(keys::SCAN_COUNT, SettingValue::Int(value));
    }

    /// Bump the scan counter, returning the new value
    pub fn increment_scan_count(&self) -> u64 {
        let count = self.scan_count().saturating_add(1);
        self.set_scan_count(count);
        count
    }

    /// `None` until the first sync; stored as Unix milliseconds, 0 meaning never
    pub fn last_sync_date(&self) -> Option<DateTime<Utc>> {
        match self.int_or(keys::LAST_SYNC_DATE, 0) {
            0 => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        }
    }

    pub fn set_last_sync_date(&self, value: DateTime<Utc>) {
        self.put(keys::LAST_SYNC_DATE, SettingValue::Int(value.timestamp_millis()));
    }

    pub fn touch_last_sync(&self) {
        self.set_last_sync_date(Utc::now());
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            log::warn!("could not remove setting {}: {}", key, e);
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    /// Reset every setting to its default.
    ///
    /// A persisted sign-in sharing the store is kept; signing out is the
    /// session gate's job.
    pub fn clear_all(&self) {
        let session = self.store.get(SESSION_KEY);
        if let Err(e) = self.store.clear() {
            log::warn!("could not clear settings: {}", e);
        }
        if let Some(session) = session {
            if let Err(e) = self.store.set(SESSION_KEY, session) {
                log::warn!("could not keep the session while clearing settings: {}", e);
            }
        }
    }

    /// Restore the appearance settings only
    pub fn reset_appearance(&self) {
        self.set_dark_mode(false);
    }

    pub fn summary(&self) -> SettingsSummary {
        SettingsSummary {
            dark_mode: self.is_dark_mode(),
            scan_count: self.scan_count(),
            last_sync: self.last_sync_date(),
            last_location: self.last_location(),
            user_email: self.user_email(),
            user_name: self.user_name(),
        }
    }
}

/// What the settings page shows
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSummary {
    pub dark_mode: bool,
    pub scan_count: u64,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_location: Option<Coordinates>,
    pub user_email: String,
    pub user_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let prefs = Preferences::in_memory();
        assert!(!prefs.is_dark_mode());
        assert!(prefs.auto_scan_enabled());
        assert!(prefs.vibrate_on_scan());
        assert!(prefs.sound_on_scan());
        assert!(!prefs.camera_flash_enabled());
        assert_eq!(prefs.default_quantity(), 1);
        assert_eq!(prefs.scan_count(), 0);
        assert!(prefs.is_first_launch());
        assert!(prefs.last_sync_date().is_none());
        assert!(!prefs.has_saved_location());
        assert_eq!(prefs.user_email(), "");
    }

    #[test]
    fn saved_location_is_set_when_either_coordinate_is_non_zero() {
        let prefs = Preferences::in_memory();
        prefs.save_last_location(Coordinates::new(0.0, -0.5));
        assert!(prefs.has_saved_location());
        assert_eq!(prefs.last_location(), Some(Coordinates::new(0.0, -0.5)));

        prefs.save_last_location(Coordinates::new(0.0, 0.0));
        assert!(!prefs.has_saved_location());
        assert!(prefs.last_location().is_none());
    }

    #[test]
    fn scan_counter_increments() {
        let prefs = Preferences::in_memory();
        assert_eq!(prefs.increment_scan_count(), 1);
        assert_eq!(prefs.increment_scan_count(), 2);
        assert_eq!(prefs.scan_count(), 2);
    }

    #[test]
    fn last_sync_round_trips_at_millisecond_precision() {
        let prefs = Preferences::in_memory();
        let when = Utc.timestamp_millis_opt(1_700_000_000_123).single().unwrap();
        prefs.set_last_sync_date(when);
        assert_eq!(prefs.last_sync_date(), Some(when));
    }

    #[test]
    fn clear_all_restores_defaults() {
        let prefs = Preferences::in_memory();
        prefs.set_dark_mode(true);
        prefs.set_default_quantity(5);
        prefs.save_user_info("ana@example.com", "ana");
        prefs.clear_all();

        assert!(!prefs.is_dark_mode());
        assert_eq!(prefs.default_quantity(), 1);
        assert!(!prefs.contains_key(keys::USER_EMAIL));
    }

    #[test]
    fn clear_all_keeps_persisted_session() {
        let prefs = Preferences::in_memory();
        prefs
            .store()
            .set(SESSION_KEY, SettingValue::Text("{}".to_string()))
            .unwrap();
        prefs.set_scan_count(4);
        prefs.clear_all();

        assert_eq!(prefs.scan_count(), 0);
        assert!(prefs.contains_key(SESSION_KEY));
    }

    #[test]
    fn clear_user_info_keeps_other_settings() {
        let prefs = Preferences::in_memory();
        prefs.set_dark_mode(true);
        prefs.save_user_info("ana@example.com", "ana");
        prefs.clear_user_info();

        assert_eq!(prefs.user_email(), "");
        assert_eq!(prefs.summary().user_name, "");
        assert!(prefs.is_dark_mode());
    }

    #[test]
    fn zero_default_quantity_reads_as_one() {
        let prefs = Preferences::in_memory();
        prefs.set_default_quantity(0);
        assert_eq!(prefs.default_quantity(), 1);
    }
}
