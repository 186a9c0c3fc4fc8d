//! Reverse proxy to backend services.
//!
//! The request is forwarded as-is apart from `Host` (rewritten to the
//! target's authority) and hop-by-hop headers. Bodies are streamed in both
//! directions and the backend response is relayed verbatim. There are no
//! retries and no timeouts.

use axum::{
    Json,
    body::{Body, HttpBody},
    http::{HeaderMap, HeaderName, Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

use super::routes::Route;
use crate::Result;

/// Headers that apply to a single connection and are never forwarded
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Forwards requests to backends over a shared HTTP client
#[derive(Debug, Clone)]
pub struct ReverseProxy {
    client: reqwest::Client,
}

impl ReverseProxy {
    /// Create a proxy with its own connection pool
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Forward `request` to `route`, appending `suffix` to the target path
    pub async fn forward(&self, route: &Route, suffix: &str, request: Request<Body>) -> Response {
        let url = route.target_url(suffix, request.uri().query());
        let (parts, body) = request.into_parts();

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        // reqwest derives Host from the target URL
        headers.remove(header::HOST);

        debug!(service = route.name, method = %parts.method, target = %url, "Proxying request");

        let mut upstream = self
            .client
            .request(parts.method, url.clone())
            .headers(headers);
        if body.size_hint().exact() != Some(0) {
            upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        match upstream.send().await {
            Ok(response) => relay(response),
            Err(e) => {
                error!(service = route.name, target = %url, error = %e, "Backend request failed");
                proxy_error(&e)
            }
        }
    }
}

/// Convert a backend response into a client response
fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Opaque gateway error for a failed backend call
fn proxy_error(e: &reqwest::Error) -> Response {
    let (status, message) = if e.is_timeout() || e.is_connect() {
        (StatusCode::GATEWAY_TIMEOUT, "Servicio no disponible")
    } else {
        (StatusCode::BAD_GATEWAY, "Error al contactar el servicio")
    };
    (status, Json(json!({ "error": message }))).into_response()
}

/// Remove hop-by-hop headers, including any named in `Connection`
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    for name in &listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
