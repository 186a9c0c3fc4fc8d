//! Authentication middleware for the gateway
//!
//! Every request must carry `Authorization: Bearer <token>`. There are no
//! public paths: `/login` is authenticated like everything else.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::token::{Claims, TokenVerifier};

/// Message for requests without a bearer token
pub const MISSING_TOKEN: &str = "Token no proporcionado";
/// Message for requests whose token fails verification
pub const INVALID_TOKEN: &str = "Token inválido o expirado";

/// Identity decoded from a valid token, available to downstream handlers
/// through request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Internal user id
    pub id: i64,
    /// Login identifier
    pub rut: String,
    /// Role
    pub rol: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            rut: claims.rut,
            rol: claims.rol,
        }
    }
}

/// Extract the token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authentication middleware
pub async fn auth_middleware(
    State(verifier): State<Arc<TokenVerifier>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let verified = match bearer_token(request.headers()) {
        Some(token) => verifier.verify(token),
        None => {
            warn!(path = %request.uri().path(), "Missing Authorization header");
            return ApiError::unauthorized(MISSING_TOKEN).into_response();
        }
    };

    match verified {
        Ok(claims) => {
            debug!(path = %request.uri().path(), rol = %claims.rol, "Authenticated request");
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from(claims));
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %request.uri().path(), error = %e, "Invalid token");
            ApiError::unauthorized(INVALID_TOKEN).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{Extension, Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;
    use crate::token::{Subject, TokenIssuer};

    const SECRET: &str = "gateway-test-secret";

    fn app() -> Router {
        let verifier = Arc::new(TokenVerifier::new(SECRET, Duration::ZERO));
        Router::new()
            .route(
                "/whoami",
                get(|Extension(user): Extension<AuthenticatedUser>| async move {
                    format!("{}:{}", user.rut, user.rol)
                }),
            )
            .layer(middleware::from_fn_with_state(verifier, auth_middleware))
    }

    fn token() -> String {
        TokenIssuer::new(SECRET, Duration::from_secs(1800))
            .issue(Subject {
                id: 1,
                rut: "11111111-1",
                rol: "admin",
            })
            .unwrap()
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, "bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let response = app().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], MISSING_TOKEN);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected() {
        let response = app()
            .oneshot(request(Some("Bearer not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], INVALID_TOKEN);
    }

    #[tokio::test]
    async fn test_valid_token_attaches_claims() {
        let response = app()
            .oneshot(request(Some(&format!("Bearer {}", token()))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"11111111-1:admin");
    }
}
