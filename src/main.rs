use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_build_trigger::config::TriggerConfig;
use pr_build_trigger::engine::Orchestrator;
use pr_build_trigger::github::OctocrabClient;
use pr_build_trigger::server::{AppState, build_router};
use pr_build_trigger::worker::Poller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_build_trigger=debug,octocrab=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = TriggerConfig::from_env().context("invalid configuration")?;
    info!(config = ?config, "Loaded configuration");

    let client = OctocrabClient::from_token(config.token.clone(), config.repo.clone(), &config.hosting)
        .context("failed to build GitHub client")?
        .with_dispatch_event(config.build_key.as_str());
    let orchestrator = Orchestrator::new(client.clone(), client, config.orchestrator_config());

    let app_state = AppState::new(config.repo.clone(), config.build_key.clone());
    let poller = Poller::new(orchestrator, config.poll.clone(), app_state.clone());

    let shutdown = CancellationToken::new();
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("listening on {}", config.listen);

    let server = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, build_router(app_state))
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
        })
    };
    let poll_loop = tokio::spawn(poller.run(shutdown.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("Ctrl-C received, shutting down");
    shutdown.cancel();

    poll_loop.await.context("poll loop panicked")?;
    if let Err(e) = server.await.context("status server panicked")? {
        error!(error = %e, "Status server failed");
    }
    Ok(())
}
