//! Cameo web backend
//!
//! HTTP surface for the Cameo avatar chat UI: a thin proxy in front of the
//! HeyGen API (so the browser never holds the API key) plus the webhook
//! receiver that accepts HeyGen's push notifications as the fast path to
//! job completion.

pub mod routes;
pub mod sink;

use axum::Router;
use cameo_heygen::{AvatarCatalog, HeygenClient, JobTracker};
use sink::{JobSink, JobStore, StoreSink};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// HeyGen client; `None` when no API key is configured. Remote-call
    /// routes answer 500 instead of crashing in that case.
    pub client: Option<Arc<HeygenClient>>,
    /// Static avatar catalog
    pub catalog: Arc<AvatarCatalog>,
    /// Poll-loop settings for submissions made through the proxy
    pub tracker: JobTracker,
    /// In-memory job registry shared with the sink
    pub jobs: Arc<RwLock<JobStore>>,
    /// Downstream sink for resolved jobs
    pub sink: Arc<dyn JobSink>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Create the application router with state built from the environment.
pub fn create_app(_config: &Config) -> Router {
    let client = match HeygenClient::from_env() {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            tracing::warn!("HeyGen client unavailable: {}", err);
            None
        }
    };

    let tracker = client
        .as_ref()
        .map(|c| JobTracker::from_config(c.config()))
        .unwrap_or_else(|| JobTracker::new(150, std::time::Duration::from_millis(2000)));

    let jobs = Arc::new(RwLock::new(JobStore::new()));
    let state = AppState {
        client,
        catalog: Arc::new(AvatarCatalog::builtin()),
        tracker,
        jobs: jobs.clone(),
        sink: Arc::new(StoreSink::new(jobs)),
    };

    create_app_with_state(state)
}

/// Create the application router with provided state (for dependency injection)
pub fn create_app_with_state(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::api_routes(state).layer(cors)
}

/// Start the server
pub async fn serve(config: Config) -> Result<(), std::io::Error> {
    let app = create_app(&config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
