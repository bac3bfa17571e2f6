mod memory;
mod pending_subscriptions;

pub use memory::InMemoryPendingSubscriptionStore;
pub use pending_subscriptions::{
    NewPendingSubscription, PendingSubscription, PendingSubscriptionStore,
    PgPendingSubscriptionRepo, StoreError,
};
