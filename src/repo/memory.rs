use std::sync::Mutex;

use uuid::Uuid;

use crate::crypto::SubscriptionToken;
use crate::domain::EmailAddress;

use super::{NewPendingSubscription, PendingSubscription, PendingSubscriptionStore, StoreError};

/// Process-local store, for running without a database
#[derive(Debug, Default)]
pub struct InMemoryPendingSubscriptionStore {
    rows: Mutex<Vec<PendingSubscription>>,
}

impl InMemoryPendingSubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored row, expired ones included
    pub fn rows(&self) -> Result<Vec<PendingSubscription>, StoreError> {
        Ok(self.lock()?.clone())
    }

    /// Store a row as-is, e.g. one whose expiry already passed
    pub fn put(&self, row: PendingSubscription) -> Result<(), StoreError> {
        self.lock()?.push(row);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<PendingSubscription>>, StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Unavailable("pending subscription lock poisoned".into()))
    }
}

#[async_trait::async_trait]
impl PendingSubscriptionStore for InMemoryPendingSubscriptionStore {
    async fn insert(&self, new_subscription: &NewPendingSubscription) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.put(PendingSubscription {
            id,
            email: new_subscription.email.to_string(),
            first_name: new_subscription.first_name.as_ref().to_string(),
            last_name: new_subscription.last_name.as_ref().to_string(),
            token: new_subscription.token.to_string(),
            expires_at: new_subscription.expires_at,
        })?;
        Ok(id)
    }

    async fn find_one(
        &self,
        email: &EmailAddress,
        token: &SubscriptionToken,
    ) -> Result<Option<PendingSubscription>, StoreError> {
        let found = self
            .lock()?
            .iter()
            .find(|row| row.email == email.as_ref() && row.token == token.as_ref())
            .cloned();
        Ok(found)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        self.lock()?.retain(|row| row.id != id);
        Ok(())
    }
}
