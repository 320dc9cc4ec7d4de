//! HTTP server for filerelay.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::Config;
use crate::file::FileStorage;
use crate::forward::Forwarder;
use crate::{RelayError, Result};

use super::handlers::AppState;
use super::openapi::create_openapi_router;
use super::router::{create_health_router, create_router};

/// Web server for the file transfer API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server from configuration.
    ///
    /// Creates the storage root if it doesn't exist.
    pub fn new(config: &Config) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                RelayError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    config.server.host, config.server.port
                ))
            })?;

        let storage = FileStorage::new(&config.storage.data_dir)?
            .with_max_upload_size(config.storage.max_upload_bytes());
        tracing::info!(
            root = %config.storage.data_dir,
            max_upload_bytes = ?storage.max_upload_size(),
            "File storage initialized"
        );

        let forwarder = Forwarder::new(&config.forward)?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(storage, forwarder)),
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(&self) -> Router {
        create_router(self.app_state.clone(), &self.cors_origins)
            .merge(create_health_router())
            .merge(create_openapi_router())
    }

    /// Run the web server until Ctrl+C or SIGTERM.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Server is running on http://{}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Server is running on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
