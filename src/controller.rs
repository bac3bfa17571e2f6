/// REST/HTML error responses
pub mod error;
/// Subscription workflow endpoints
pub mod subscriptions;
