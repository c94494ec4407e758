use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobly_api::config;
use jobly_api::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "jobly-api")]
#[command(about = "Jobly job board REST API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Apply database migrations before serving")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and SECRET_KEY can live there
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobly_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = config::config();
    tracing::info!("Starting Jobly API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECRET_KEY must be set in {:?} mode", config.environment);
    }

    // Serve even when the database is down; /health reports it as degraded
    let pool = match DatabaseManager::connect(&config.database).await {
        Ok(pool) => {
            if args.migrate || config.database.run_migrations {
                DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
            }
            pool
        }
        Err(e) => {
            tracing::warn!("Database unavailable at startup: {}", e);
            DatabaseManager::connect_lazy(&config.database).context("invalid DATABASE_URL")?
        }
    };

    let port = args.port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Jobly API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, jobly_api::app(pool))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}
