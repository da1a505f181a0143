use axum::Router;
use axum_server::Handle;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::auth::{InMemoryTokenStore, StaticCredentials};
use crate::config::ServerConfig;
use crate::error::FileServerError;
use crate::server::routes::build_router;
use crate::server::state::AppState;
use crate::server::tls;
use crate::storage::Storage;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub struct Server {
    config: Arc<ServerConfig>,
    state: AppState,
}

impl Server {
    /// Prepares the served directory and shared state. Nothing is bound yet.
    pub async fn new(config: ServerConfig) -> Result<Self, FileServerError> {
        let root = config.root_path();
        tokio::fs::create_dir_all(&root).await?;
        let root = tokio::fs::canonicalize(&root).await?;
        info!("Server root directory: {}", root.display());

        let credentials = StaticCredentials::from_pair(&config.username, &config.password);
        match &credentials {
            Some(c) => info!("Authentication enabled for user {}", c.username()),
            None if !config.username.is_empty() || !config.password.is_empty() => {
                warn!("Only one of username/password is set; authentication is disabled")
            }
            None => info!("No credentials configured; authentication is disabled"),
        }

        let state = AppState::new(
            Storage::new(root),
            credentials,
            Arc::new(InMemoryTokenStore::new()),
            config.session_policy(),
        );

        Ok(Self {
            config: Arc::new(config),
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.config.max_upload_bytes())
    }

    /// Binds the listener and serves until Ctrl-C.
    pub async fn start(&self) -> Result<(), FileServerError> {
        let addr = self.config.socket_addr()?;
        let app = self.router();

        if self.config.tls_enabled {
            let tls = tls::rustls_config(&self.config).await?;
            let handle = Handle::new();
            tokio::spawn(shutdown_on_ctrl_c(handle.clone()));

            log_access_urls("https", addr);
            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        } else {
            warn!("TLS disabled; credentials and files travel in plain text");
            let listener = TcpListener::bind(addr).await?;
            log_access_urls("http", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Shutdown signal received");
                })
                .await?;
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_on_ctrl_c(handle: Handle) {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}

fn log_access_urls(scheme: &str, addr: SocketAddr) {
    info!("Starting RAX file server on {}", addr);
    if addr.ip().is_unspecified() {
        info!("Local access: {}://localhost:{}", scheme, addr.port());
    } else {
        info!("Access: {}://{}", scheme, addr);
    }
}
