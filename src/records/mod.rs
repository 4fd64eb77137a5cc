//! Owner-partitioned record collections
//!
//! Every record lives at `{collection}/{uid}/{id}` and is only ever read or
//! written inside the signed-in user's partition. Writes report failure to
//! the caller; reads degrade to "nothing found" and log the cause.

mod locations;
mod products;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::auth::{AuthUser, Session, SessionSource};
use crate::database::{Database, Reference};
use crate::error::{Error, Result};

/// A record type stored in its own collection
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Top-level collection name
    const COLLECTION: &'static str;

    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: String);

    /// Owner and timestamp fields written once at creation
    fn stamp_owner(&mut self, user: &AuthUser, now: DateTime<Utc>);

    /// Owner fields re-asserted on every replace
    fn claim_owner(&mut self, user: &AuthUser);

    /// Put records in listing order; equal records keep their key order
    fn sort_for_listing(records: &mut [Self]);
}

/// CRUD over one collection for whoever is signed in
pub struct Collection<T> {
    db: Arc<dyn Database>,
    sessions: Arc<dyn SessionSource>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            sessions: self.sessions.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("collection", &T::COLLECTION)
            .finish_non_exhaustive()
    }
}

impl<T: Record> Collection<T> {
    pub fn new(db: Arc<dyn Database>, sessions: Arc<dyn SessionSource>) -> Self {
        Self {
            db,
            sessions,
            _record: PhantomData,
        }
    }

    /// Another collection over the same database and sessions
    pub fn sibling<U: Record>(&self) -> Collection<U> {
        Collection::new(self.db.clone(), self.sessions.clone())
    }

    fn partition(uid: &str) -> Reference {
        Reference::root().child(T::COLLECTION).child(uid)
    }

    async fn session(&self) -> Option<Session> {
        self.sessions.current_session().await
    }

    /// Stamp owner and timestamps, store under a new key and return the key.
    pub async fn create(&self, record: &T) -> Result<String> {
        let session = self.session().await.ok_or(Error::Unauthenticated)?;

        let mut record = record.clone();
        record.stamp_owner(&session.user, Utc::now());
        let body = serde_json::to_value(&record)?;

        let id = self
            .db
            .push(&Self::partition(session.uid()), body, &session.id_token)
            .await
            .map_err(|e| match e {
                Error::RemoteWrite(_) => e,
                other => Error::remote_write(other),
            })?;
        log::debug!("created {}/{}", T::COLLECTION, id);
        Ok(id)
    }

    /// All of the owner's records in listing order.
    ///
    /// Signed out reads as empty. Read failures also read as empty and are
    /// logged; use [`Collection::try_list_all`] to see them.
    pub async fn list_all(&self) -> Vec<T> {
        match self.try_list_all().await {
            Ok(records) => records,
            Err(e) => {
                log::error!("could not load {}: {}", T::COLLECTION, e);
                Vec::new()
            }
        }
    }

    /// Like [`Collection::list_all`] but read failures are returned.
    ///
    /// Records that fail to decode are skipped.
    pub async fn try_list_all(&self) -> Result<Vec<T>> {
        let session = match self.session().await {
            Some(session) => session,
            None => return Ok(Vec::new()),
        };

        let children = self
            .db
            .children(&Self::partition(session.uid()), &session.id_token)
            .await?;

        let mut records: Vec<T> = children
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<T>(value) {
                Ok(mut record) => {
                    record.set_id(key);
                    Some(record)
                }
                Err(e) => {
                    log::warn!("skipping unreadable {}/{}: {}", T::COLLECTION, key, e);
                    None
                }
            })
            .collect();
        T::sort_for_listing(&mut records);
        Ok(records)
    }

    /// One record, [`Error::NotFound`] on a miss
    pub async fn try_get_by_id(&self, id: &str) -> Result<T> {
        if !is_record_key(id) {
            return Err(Error::not_found(format!("{}/{}", T::COLLECTION, id)));
        }
        let session = self.session().await.ok_or(Error::Unauthenticated)?;
        let at = Self::partition(session.uid()).child(id);

        let value = self
            .db
            .get(&at, &session.id_token)
            .await?
            .ok_or_else(|| Error::not_found(format!("{}/{}", T::COLLECTION, id)))?;

        let mut record: T = serde_json::from_value(value)?;
        record.set_id(id.to_string());
        Ok(record)
    }

    /// One record; absent when missing, unreadable or signed out
    pub async fn get_by_id(&self, id: &str) -> Option<T> {
        match self.try_get_by_id(id).await {
            Ok(record) => Some(record),
            Err(Error::NotFound(_)) | Err(Error::Unauthenticated) => None,
            Err(e) => {
                log::error!("could not load {}/{}: {}", T::COLLECTION, id, e);
                None
            }
        }
    }

    /// Replace the stored record with `record`, `false` on any failure
    pub async fn update(&self, record: &T) -> bool {
        let id = match record.id() {
            Some(id) if is_record_key(id) => id.to_string(),
            _ => {
                log::warn!("refusing to update {} without a valid id", T::COLLECTION);
                return false;
            }
        };
        let session = match self.session().await {
            Some(session) => session,
            None => return false,
        };

        let mut record = record.clone();
        record.claim_owner(&session.user);
        let body = match serde_json::to_value(&record) {
            Ok(body) => body,
            Err(e) => {
                log::error!("could not encode {}/{}: {}", T::COLLECTION, id, e);
                return false;
            }
        };

        let at = Self::partition(session.uid()).child(&id);
        match self.db.put(&at, body, &session.id_token).await {
            Ok(()) => {
                log::debug!("updated {}/{}", T::COLLECTION, id);
                true
            }
            Err(e) => {
                log::error!("could not update {}/{}: {}", T::COLLECTION, id, e);
                false
            }
        }
    }

    /// Remove a record, `false` on any failure
    pub async fn delete(&self, id: &str) -> bool {
        if !is_record_key(id) {
            log::warn!("refusing to delete {} with id {:?}", T::COLLECTION, id);
            return false;
        }
        let session = match self.session().await {
            Some(session) => session,
            None => return false,
        };

        let at = Self::partition(session.uid()).child(id);
        match self.db.delete(&at, &session.id_token).await {
            Ok(()) => {
                log::debug!("deleted {}/{}", T::COLLECTION, id);
                true
            }
            Err(e) => {
                log::error!("could not delete {}/{}: {}", T::COLLECTION, id, e);
                false
            }
        }
    }
}

/// A single database key: non-empty and free of path and reserved characters.
///
/// Anything else would address the partition itself or a field inside a
/// record.
pub fn is_record_key(id: &str) -> bool {
    !id.is_empty() && !id.contains(|c: char| matches!(c, '/' | '.' | '#' | '$' | '[' | ']'))
}

/// Case-insensitive substring match; an empty needle matches everything
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
