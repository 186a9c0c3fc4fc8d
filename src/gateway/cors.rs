//! CORS for the single frontend origin

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

/// Credentialed CORS for `origin` only.
///
/// Preflight requests are answered here and never reach authentication.
/// `Access-Control-Allow-Origin` always names `origin`, whatever the request's
/// `Origin`, so browsers refuse responses for any other origin.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;

    const ORIGIN: &str = "http://localhost:5173";

    fn app() -> Router {
        Router::new()
            .route("/reservas", get(|| async { "ok" }))
            .layer(cors_layer(HeaderValue::from_static(ORIGIN)))
    }

    #[tokio::test]
    async fn test_preflight_mirrors_requested_headers() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/reservas")
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), ORIGIN);
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            "authorization"
        );
        assert!(
            headers
                .get(header::ACCESS_CONTROL_ALLOW_METHODS)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("DELETE")
        );
    }

    #[tokio::test]
    async fn test_other_origin_not_allowed() {
        let request = Request::builder()
            .uri("/reservas")
            .header(header::ORIGIN, "https://evil.example")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap();
        assert_ne!(allowed, "https://evil.example");
        assert_eq!(allowed, ORIGIN);
    }
}
