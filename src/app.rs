use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use anyhow::Context;

use sqlx::postgres::PgPoolOptions;

use tracing_actix_web::TracingLogger;

use crate::client::{AudienceClient, EmailClient};
use crate::controller::subscriptions;
use crate::repo::PgPendingSubscriptionRepo;
use crate::settings::Settings;
use crate::workflow::{LinkBuilder, SubscriptionWorkflow, WorkflowConfig};

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().finish()
}

/// Build the subscription workflow from settings, backed by Postgres and the email provider
pub fn build_workflow(settings: &Settings) -> anyhow::Result<SubscriptionWorkflow> {
    let pool = PgPoolOptions::new().connect_lazy_with(settings.database.with_db());
    let store = PgPendingSubscriptionRepo::new(pool);

    let email = &settings.email;
    let email_client = EmailClient::new(
        email.sender()?,
        email.api_timeout(),
        email.api_base_url()?,
        email.api_auth_token(),
    )
    .context("Failed to build email client")?;
    let audience_client = AudienceClient::new(
        email.api_timeout(),
        email.api_base_url()?,
        email.api_auth_token(),
    )
    .context("Failed to build audience client")?;

    let config = WorkflowConfig {
        audience_id: email.audience_id().to_string(),
        links: LinkBuilder::new(settings.app.base_url()?)?,
        retry: settings.retry.policy(),
    };

    Ok(SubscriptionWorkflow::new(
        Arc::new(store),
        Arc::new(audience_client),
        Arc::new(email_client),
        config,
    ))
}

/// Run the application on a specified TCP listener
pub fn run(listener: TcpListener, workflow: SubscriptionWorkflow) -> anyhow::Result<Server> {
    // Wrap application data
    let workflow = web::Data::new(workflow);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(workflow.clone())
            .service(health_check)
            .service(subscriptions::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
