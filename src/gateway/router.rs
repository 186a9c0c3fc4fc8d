//! HTTP router for the gateway

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::debug;

use super::auth::auth_middleware;
use super::cors::cors_layer;
use super::proxy::ReverseProxy;
use super::routes::RouteTable;
use crate::config::Config;
use crate::token::TokenVerifier;
use crate::{Error, Result};

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Prefix route table
    pub routes: RouteTable,
    /// Backend client
    pub proxy: ReverseProxy,
    /// Token verifier used by the auth middleware
    pub verifier: Arc<TokenVerifier>,
    /// The single allowed CORS origin
    pub cors_origin: HeaderValue,
}

impl AppState {
    /// Build the gateway state, failing fast on incomplete configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let secret = config.jwt_secret()?;
        let routes = RouteTable::from_config(&config.routes)?;
        let cors_origin = HeaderValue::from_str(&config.gateway.cors_origin).map_err(|e| {
            Error::Config(format!(
                "Invalid CORS origin '{}': {e}",
                config.gateway.cors_origin
            ))
        })?;

        Ok(Self {
            routes,
            proxy: ReverseProxy::new()?,
            verifier: Arc::new(TokenVerifier::from_config(secret, &config.auth)),
            cors_origin,
        })
    }
}

/// Create the router.
///
/// Layer order, outermost first: trace, panic guard, CORS, auth, proxy.
pub fn create_router(state: Arc<AppState>) -> Router {
    let verifier = Arc::clone(&state.verifier);
    let cors = cors_layer(state.cors_origin.clone());

    Router::new()
        .fallback(proxy_handler)
        .layer(middleware::from_fn_with_state(verifier, auth_middleware))
        .layer(cors)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the prefix and forward, or 404 when nothing matches
async fn proxy_handler(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_owned();

    let Some((route, suffix)) = state.routes.resolve(&path) else {
        debug!(path = %path, "No route for path");
        return StatusCode::NOT_FOUND.into_response();
    };

    state.proxy.forward(route, suffix, request).await
}
