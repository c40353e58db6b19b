pub mod api;
pub mod config;
pub mod core_state;
pub mod db;
pub mod diagnosis;
pub mod models;
pub mod storage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};
use crate::core_state::{CoreError, CoreState};

/// Errors that stop the service before or while it runs.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Initialization failed: {0}")]
    Core(#[from] CoreError),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Signal handler error: {0}")]
    Signal(#[from] std::io::Error),
}

/// Run the service until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServerConfig::from_env()?;
    let bind = config.bind;
    let core = Arc::new(CoreState::open(config)?);

    let mut server = api::start_server(core, bind)
        .await
        .map_err(StartupError::Server)?;
    tracing::info!(addr = %server.session.server_addr, session = %server.session.session_id, "Listening");

    tokio::signal::ctrl_c().await?;

    server.shutdown();
    server.stopped().await;
    Ok(())
}
