use uuid::Uuid;

use chrono::{DateTime, Utc};

use sqlx::PgPool;

use crate::crypto::SubscriptionToken;
use crate::domain::{EmailAddress, PersonName};

/// New pending subscription, waiting for its confirmation link to be followed
#[derive(Debug, Clone)]
pub struct NewPendingSubscription {
    pub email: EmailAddress,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub token: SubscriptionToken,
    pub expires_at: DateTime<Utc>,
}

/// Stored pending subscription record
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PendingSubscription {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub token: String,
    /// Checked lazily when the link is followed; expired rows are never removed here
    pub expires_at: DateTime<Utc>,
}

impl PendingSubscription {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Pending subscription store, one implementation per backing datastore.
/// NOTE: Intended to facilitate easier testing/mocking
#[async_trait::async_trait]
pub trait PendingSubscriptionStore: Send + Sync {
    /// Insert a new pending subscription, returning its id
    async fn insert(&self, new_subscription: &NewPendingSubscription) -> Result<Uuid, StoreError>;

    /// Find a pending subscription matching both email and token exactly
    async fn find_one(
        &self,
        email: &EmailAddress,
        token: &SubscriptionToken,
    ) -> Result<Option<PendingSubscription>, StoreError>;

    /// Delete a pending subscription by id
    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Postgres pending subscription repository
#[derive(Debug, Clone)]
pub struct PgPendingSubscriptionRepo {
    pool: PgPool,
}

impl PgPendingSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PendingSubscriptionStore for PgPendingSubscriptionRepo {
    #[tracing::instrument(name = "Insert pending subscription", skip(self, new_subscription), fields(email = %new_subscription.email))]
    async fn insert(&self, new_subscription: &NewPendingSubscription) -> Result<Uuid, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            "insert into pending_subscriptions(email, first_name, last_name, token, expires_at) \
             values ($1, $2, $3, $4, $5) returning id",
        )
        .bind(new_subscription.email.as_ref())
        .bind(new_subscription.first_name.as_ref())
        .bind(new_subscription.last_name.as_ref())
        .bind(new_subscription.token.as_ref())
        .bind(new_subscription.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    #[tracing::instrument(name = "Find pending subscription", skip(self, token))]
    async fn find_one(
        &self,
        email: &EmailAddress,
        token: &SubscriptionToken,
    ) -> Result<Option<PendingSubscription>, StoreError> {
        let subscription = sqlx::query_as::<_, PendingSubscription>(
            "select id, email, first_name, last_name, token, expires_at \
             from pending_subscriptions where email=$1 and token=$2 limit 1",
        )
        .bind(email.as_ref())
        .bind(token.as_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    #[tracing::instrument(name = "Delete pending subscription", skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("delete from pending_subscriptions where id=$1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
