//! Login service server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::post};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::handler::{LoginState, login_handler};
use super::password::PasswordVerifier;
use super::store::PgUserStore;
use crate::config::{Config, PasswordScheme};
use crate::shutdown::shutdown_signal;
use crate::token::TokenIssuer;
use crate::{Error, Result};

/// Create the login router
pub fn create_router(state: Arc<LoginState>) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Login service
pub struct LoginService {
    addr: SocketAddr,
    state: Arc<LoginState>,
}

impl LoginService {
    /// Create the service. The database pool connects on first request.
    pub fn new(config: &Config) -> Result<Self> {
        let secret = config.jwt_secret()?;
        let store = PgUserStore::connect_lazy(&config.login)?;

        if config.login.password_scheme == PasswordScheme::Plaintext {
            warn!("password_scheme = plaintext: stored secrets are compared unhashed");
        }

        Ok(Self {
            addr: config.login.socket_addr()?,
            state: Arc::new(LoginState {
                store: Arc::new(store),
                passwords: PasswordVerifier::new(config.login.password_scheme),
                issuer: TokenIssuer::from_config(secret, &config.auth),
            }),
        })
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let app = create_router(Arc::clone(&self.state));
        let listener = TcpListener::bind(self.addr).await?;

        info!(addr = %self.addr, scheme = ?self.state.passwords.scheme(), "Login service listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Login service shutdown complete");
        Ok(())
    }
}
