use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use storefront_api::auth::JwtIdentityProvider;
use storefront_api::config::AppConfig;
use storefront_api::database::PgStore;
use storefront_api::hashing::Argon2Hasher;
use storefront_api::messaging::{DisabledTransport, MessagingTransport, TransportError, WhatsAppClient};
use storefront_api::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "storefront-api", version, about = "Storefront backend API server")]
struct Cli {
    /// Bind address (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides STOREFRONT_API_PORT / PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::info!("Starting storefront API in {:?} mode", config.environment);

    let store = Arc::new(PgStore::connect_lazy(&config.database).context("database setup")?);
    let identity = Arc::new(JwtIdentityProvider::new(&config.security.jwt_secret).context("identity setup")?);
    let hasher = Arc::new(Argon2Hasher::from_config(&config.security).context("password hasher setup")?);

    let transport: Arc<dyn MessagingTransport> =
        match WhatsAppClient::new(reqwest::Client::new(), &config.whatsapp) {
            Ok(client) => Arc::new(client),
            Err(TransportError::NotConfigured(missing)) => {
                tracing::warn!("WhatsApp sending disabled: {} not set", missing);
                Arc::new(DisabledTransport::new(missing))
            }
            Err(e) => return Err(e).context("messaging transport setup"),
        };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, identity, hasher, store.clone(), transport);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Storefront API listening on http://{}", bind_addr);

    axum::serve(listener, storefront_api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    store.close().await;
    tracing::info!("Storefront API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
