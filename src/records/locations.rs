use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::{Collection, Record};
use crate::auth::AuthUser;
use crate::models::{ProductScan, StorageLocation};

impl Record for StorageLocation {
    const COLLECTION: &'static str = "locations";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn stamp_owner(&mut self, user: &AuthUser, now: DateTime<Utc>) {
        self.user_id = Some(user.uid.clone());
        self.created_at = now;
    }

    fn claim_owner(&mut self, user: &AuthUser) {
        self.user_id = Some(user.uid.clone());
    }

    /// Name ascending, ignoring case
    fn sort_for_listing(records: &mut [Self]) {
        records.sort_by_cached_key(|location| location.name.to_lowercase());
    }
}

impl Collection<StorageLocation> {
    /// All locations with `product_count` filled from one product read
    pub async fn list_with_counts(&self) -> Vec<StorageLocation> {
        let mut locations = self.list_all().await;
        if locations.is_empty() {
            return locations;
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for product in self.sibling::<ProductScan>().list_all().await {
            if let Some(location_id) = product.location_id {
                *counts.entry(location_id).or_default() += 1;
            }
        }

        for location in &mut locations {
            location.product_count = location
                .id
                .as_ref()
                .and_then(|id| counts.get(id))
                .copied()
                .unwrap_or(0);
        }
        locations
    }
}
