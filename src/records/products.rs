use chrono::{DateTime, Utc};

use super::{contains_ignore_case, Collection, Record};
use crate::auth::AuthUser;
use crate::models::ProductScan;

impl Record for ProductScan {
    const COLLECTION: &'static str = "product_scans";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn stamp_owner(&mut self, user: &AuthUser, now: DateTime<Utc>) {
        self.user_id = Some(user.uid.clone());
        self.user_email = user.email.clone();
        self.scan_date = now;
    }

    fn claim_owner(&mut self, user: &AuthUser) {
        self.user_id = Some(user.uid.clone());
        if self.user_email.is_none() {
            self.user_email = user.email.clone();
        }
    }

    /// Newest scan first
    fn sort_for_listing(records: &mut [Self]) {
        records.sort_by(|a, b| b.scan_date.cmp(&a.scan_date));
    }
}

impl Collection<ProductScan> {
    /// Products whose barcode contains `fragment`, ignoring case
    pub async fn search_by_barcode(&self, fragment: &str) -> Vec<ProductScan> {
        let mut products = self.list_all().await;
        products.retain(|product| contains_ignore_case(&product.barcode, fragment));
        products
    }

    /// Products whose name contains `fragment`, ignoring case
    pub async fn search_by_name(&self, fragment: &str) -> Vec<ProductScan> {
        let mut products = self.list_all().await;
        products.retain(|product| contains_ignore_case(&product.product_name, fragment));
        products
    }

    /// Products referencing `location_id`
    pub async fn list_by_location(&self, location_id: &str) -> Vec<ProductScan> {
        let mut products = self.list_all().await;
        products.retain(|product| product.location_id.as_deref() == Some(location_id));
        products
    }

    /// Recounted from the full collection on every call
    pub async fn count_by_location(&self, location_id: &str) -> usize {
        self.list_by_location(location_id).await.len()
    }
}
