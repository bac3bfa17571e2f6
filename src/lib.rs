/// Basic application code
pub mod app;
/// REST clients for the email and audience provider
pub mod client;
/// Controllers for REST endpoints
pub mod controller;
/// Confirmation tokens
pub mod crypto;
/// Domain objects
pub mod domain;
/// Workflow error taxonomy
pub mod error;
/// Pending subscription repositories
pub mod repo;
/// Backoff for rate-limited provider calls
pub mod retry;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
/// Email and page templates
pub mod templates;
/// Double opt-in subscription workflow
pub mod workflow;
