//! HTTP server for the contacts service.
//!
//! # Routes
//! - `GET /health`: liveness probe, plain `OK`.
//! - `/api/contacts[/{id}]`: JSON CRUD API.
//! - `/contacts`, `/contacts/new`, `/contacts/manage`: HTML pages.
//! - `/css`, `/js`, `/images` and everything else: static files.
//!
//! # Lifecycle
//! Configuration is read from the environment, logging is started, the
//! store is connected once, and then the server runs until Ctrl+C or
//! SIGTERM. The store is closed after the last request drains.

use axum::{extract::Request, routing::get, Router, ServiceExt};
use contacts_core::{core_version, init_logging, StoreGateway};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::normalize_path::NormalizePath;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::Config;
use error::StartupError;
use routes::contacts::{
    create_contact, delete_contact, get_contact, list_contacts, replace_contact,
};
use routes::health_handler;
use routes::pages::page_routes;
use state::AppState;

/// Application service: the router behind trailing-slash trimming.
pub type App = NormalizePath<Router>;

/// Builds the full application router.
pub fn build_router(state: AppState, public_dir: &Path) -> Router {
    let api = Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/:id",
            get(get_contact).put(replace_contact).delete(delete_contact),
        );

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/contacts", api)
        .merge(page_routes(public_dir))
        .with_state(state)
}

/// Wraps [`build_router`] so `/contacts/` and `/api/contacts/` reach the same
/// routes as their slash-less forms.
///
/// Trimming has to run before routing, so it wraps the router rather than
/// being added with `Router::layer`.
pub fn build_app(state: AppState, public_dir: &Path) -> App {
    NormalizePath::trim_trailing_slash(build_router(state, public_dir))
}

/// Loads configuration from the environment and serves until shutdown.
pub async fn start_server() -> Result<(), StartupError> {
    let config = Config::load()?;
    init_logging(&config.log_level, config.log_dir.as_deref()).map_err(StartupError::Logging)?;
    serve(config).await
}

/// Serves with an explicit configuration.
pub async fn serve(config: Config) -> Result<(), StartupError> {
    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;

    let gateway = Arc::new(StoreGateway::new(config.store.clone()));
    gateway.connect()?;

    let app = build_app(AppState::new(Arc::clone(&gateway)), &config.public_dir);
    info!(
        "event=server_start module=server status=ok address={address} version={}",
        core_version()
    );

    let served = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    gateway.close();
    served?;
    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("event=shutdown_signal module=server signal=ctrl_c"),
            Err(err) => {
                error!("event=shutdown_signal module=server status=error error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=shutdown_signal module=server signal=terminate");
            }
            Err(err) => {
                error!("event=shutdown_signal module=server status=error error={err}");
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
