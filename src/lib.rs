//! MoodTune: map detected emotions to music links.
//!
//! Users register, keep a wishlist of `emotion -> platform -> link`, and upload
//! a photo. An external facial-emotion service labels the photo, the matching
//! link is looked up, the detection is added to the user's history, and the
//! browser is redirected to the link.
//!
//! All account data lives in one JSON file, rewritten whole on every change
//! behind a single lock (see [`user_storage::UserStorage`]).

pub mod auth;
pub mod classifier;
pub mod config;
pub mod error;
pub mod history;
pub mod routes;
pub mod session;
pub mod uploads;
pub mod user_models;
pub mod user_storage;
pub mod views;
pub mod wishlist;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use classifier::{DeepFaceClient, EmotionClassifier};
use config::Config;
use session::SessionStore;
use user_storage::UserStorage;

const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub struct AppState {
    pub config: Config,
    pub storage: UserStorage,
    pub sessions: SessionStore,
    pub classifier: Arc<dyn EmotionClassifier>,
}

impl AppState {
    /// Creates the upload directory if needed and loads the users file.
    pub fn new(config: Config, classifier: Arc<dyn EmotionClassifier>) -> Result<Arc<Self>> {
        uploads::ensure_dir(&config.upload_dir)?;
        let storage = UserStorage::new(&config.users_file);

        Ok(Arc::new(Self {
            config,
            storage,
            sessions: SessionStore::new(),
            classifier,
        }))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/register", get(routes::register_form).post(routes::register))
        .route("/login", get(routes::login_form).post(routes::login))
        .route("/dashboard", get(routes::dashboard).post(routes::add_link))
        .route("/detect", get(routes::detect_form).post(routes::detect))
        .route(
            "/change-password",
            get(routes::change_password_form).post(routes::change_password),
        )
        .route("/history", get(routes::history))
        .route("/logout", get(routes::logout))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    let config = Config::load()?;

    let classifier = DeepFaceClient::new(&config.classifier_url, config.classifier_timeout)
        .context("Failed to build emotion classifier client")?;
    info!("Using emotion service at {}", config.classifier_url);

    let address = config.address();
    let state = AppState::new(config, Arc::new(classifier))?;
    let app = build_router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!("MoodTune running on http://{}", address);
    info!("Endpoints: / /register /login /dashboard /detect /change-password /history /logout");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
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
}
