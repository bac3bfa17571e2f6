use std::net::TcpListener;

use anyhow::Context;

use optin::app;
use optin::settings::Settings;
use optin::telemetry::{create_subscriber, set_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    set_subscriber(create_subscriber("info", std::io::stdout))?;

    let settings = Settings::load().context("Failed to load settings")?;

    let workflow = app::build_workflow(&settings)?;

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    app::run(listener, workflow)?.await.context("Failed to run app")
}
