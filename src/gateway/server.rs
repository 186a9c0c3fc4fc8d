//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::shutdown::shutdown_signal;
use crate::{Error, Result};

/// API gateway server
pub struct Gateway {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl Gateway {
    /// Create a new gateway from validated configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            addr: config.gateway.socket_addr()?,
            state: Arc::new(AppState::from_config(config)?),
        })
    }

    /// Run the gateway until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let app = create_router(Arc::clone(&self.state));
        let listener = TcpListener::bind(self.addr).await?;

        info!(addr = %self.addr, "API gateway listening");
        info!(origin = ?self.state.cors_origin, "CORS origin");
        for route in self.state.routes.iter() {
            info!(prefix = route.prefix, target = %route.target, "Route");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Gateway shutdown complete");
        Ok(())
    }
}
