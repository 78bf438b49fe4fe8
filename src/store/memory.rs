//! In-process user store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::model::{RecordMeta, User, UserId, UserInput};
use crate::store::{StoreError, UserStore};

/// A thread-safe store keeping records in a [`DashMap`].
///
/// Ids come from a monotonic sequence starting at 1 and are never reused,
/// including after deletion. Soft-deleted records stay in the map, so memory
/// grows without bound under the `memory` driver.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    records: Arc<DashMap<UserId, User>>,
    next_id: Arc<AtomicI64>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-deleted) records.
    pub fn len(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.value().meta.is_deleted())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, input: UserInput) -> Result<User, StoreError> {
        let id = UserId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let user = User::from_input(RecordMeta::new(id, Utc::now()), input);
        self.records.insert(id, user.clone());
        tracing::debug!(user_id = %id, "Stored new user record");
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, StoreError> {
        match self.records.get(&id) {
            Some(r) if !r.value().meta.is_deleted() => Ok(r.value().clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    async fn update_fields(&self, existing: &User, fields: UserInput) -> Result<User, StoreError> {
        let mut entry = self
            .records
            .get_mut(&existing.id())
            .ok_or(StoreError::NotFound)?;
        let user = entry.value_mut();
        if user.meta.is_deleted() {
            return Err(StoreError::NotFound);
        }

        user.apply(fields);
        user.meta.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_by_id(&self, id: UserId) -> Result<(), StoreError> {
        if let Some(mut entry) = self.records.get_mut(&id) {
            let meta = &mut entry.value_mut().meta;
            if meta.deleted_at.is_none() {
                meta.deleted_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
