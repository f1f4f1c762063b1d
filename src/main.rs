use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use scribe_gateway::application::services::GatewayService;
use scribe_gateway::infrastructure::auth::SealedSessionCodec;
use scribe_gateway::infrastructure::backend::BackendClientFactory;
use scribe_gateway::infrastructure::observability::{TracingConfig, init_tracing};
use scribe_gateway::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load configuration")?;

    let tracing_config = TracingConfig {
        environment: environment.to_string(),
        json_format: settings.logging.enable_json || TracingConfig::default().json_format,
        level: settings.logging.level.clone(),
    };
    init_tracing(tracing_config, settings.server.port);

    let backend = BackendClientFactory::create(&settings.backend, &settings.scaffold)
        .context("Failed to create backend client")?;

    let secret = session_secret(&settings, environment)?;
    let codec = SealedSessionCodec::new(
        &secret,
        chrono::Duration::minutes(settings.session.ttl_minutes.max(1)),
    )
    .context("Failed to create session codec")?;

    let gateway = Arc::new(GatewayService::new(backend, Arc::new(codec)));
    let state = AppState::new(gateway, settings.session.clone());
    let router = create_router(state);

    let addr = settings
        .socket_addr()
        .context("Invalid server.host/server.port")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, scaffold = settings.scaffold.enabled, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Outside production an unset secret is replaced by a random one, which
/// invalidates all sessions on restart.
fn session_secret(settings: &Settings, environment: Environment) -> anyhow::Result<String> {
    let configured = settings.session.secret.trim();
    if !configured.is_empty() {
        return Ok(configured.to_string());
    }
    if environment == Environment::Prod {
        anyhow::bail!("session.secret must be set in production (APP__SESSION__SECRET)");
    }
    tracing::warn!("session.secret is not set, using an ephemeral secret");
    Ok(format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
