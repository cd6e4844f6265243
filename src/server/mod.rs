pub mod error;
pub mod routes;
pub mod session;

use crate::adapters::GooglePlacesClient;
use crate::config::AppConfig;
use crate::utils::error::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use session::{spawn_idle_sweeper, SessionStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub places: Arc<GooglePlacesClient>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let places = Arc::new(GooglePlacesClient::from_config(&config)?);
        let sessions = Arc::new(SessionStore::new(places.clone(), config.default_radius()));

        Ok(Self {
            places,
            sessions,
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/api/geocode", get(routes::geocode))
        .route("/api/restaurants/nearby", get(routes::nearby_restaurants))
        .route("/api/restaurants/photo", get(routes::restaurant_photo))
        .route("/api/key-status", get(routes::key_status))
        .route("/api/sessions", post(routes::create_session))
        .route(
            "/api/sessions/{id}",
            get(routes::get_session).delete(routes::end_session),
        )
        .route("/api/sessions/{id}/location", post(routes::report_location))
        .route("/api/sessions/{id}/radius", put(routes::set_radius))
        .route("/api/sessions/{id}/pick", post(routes::pick))
        .route("/api/sessions/{id}/pick-again", post(routes::pick_again))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: AppConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host(), config.port());
    let idle_timeout = config.session_idle_timeout();

    let state = AppState::new(config)?;
    let key = state.places.key_status();
    if !key.exists {
        tracing::warn!("⚠️ Places API key is not configured; searches will fail");
    }

    let sweeper = spawn_idle_sweeper(state.sessions.clone(), idle_timeout);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
