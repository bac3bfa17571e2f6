mod check_subscription;
mod health_check;
mod subscriptions;
