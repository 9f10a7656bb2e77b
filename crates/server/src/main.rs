//! Grove server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use grove_core::config::AppConfig;
use grove_server::{AppState, create_router};
use std::net::SocketAddr;
use time::OffsetDateTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Grove - A task and subtask tracking server
#[derive(Parser, Debug)]
#[command(name = "groved")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "GROVE_CONFIG", default_value = "config/server.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("Grove v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration. Every setting has a default, so both the file and
    // the environment are optional.
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("GROVE_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize the store
    let store = grove_store::from_config(&config.store)
        .await
        .context("failed to initialize store")?;

    // Verify the store answers before accepting requests. This catches
    // path and permission problems early, before the server reports healthy.
    store
        .health_check()
        .await
        .context("store health check failed")?;
    tracing::info!("Store connectivity verified");

    // Spawn the expired-session sweeper when sessions actually expire.
    // Login also sweeps opportunistically; this covers idle servers.
    if let Some(ttl_secs) = config.session.ttl_secs {
        let sweep_store = store.clone();
        // Sweep at most hourly and at least once a minute.
        let interval = std::time::Duration::from_secs(ttl_secs.clamp(60, 3600));

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match sweep_store
                    .delete_expired_sessions(OffsetDateTime::now_utc())
                    .await
                {
                    Ok(0) => {}
                    Ok(count) => tracing::info!(count, "swept expired sessions"),
                    Err(e) => tracing::error!(error = %e, "session sweep failed"),
                }
            }
        });
        tracing::info!(interval_secs = interval.as_secs(), "Session sweeper spawned");
    }

    // Create application state
    let state = AppState::new(config.clone(), store);

    // Create router
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
