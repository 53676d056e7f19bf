//! Cameo web backend - Binary entry point

use cameo_web::{Config, serve};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cameo_web=info,cameo_heygen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("CAMEO_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);
    let config = Config { port };

    tracing::info!("Starting Cameo web backend on http://localhost:{}", config.port);

    serve(config).await?;

    Ok(())
}
