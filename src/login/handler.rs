//! `POST /login`

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::password::PasswordVerifier;
use super::store::UserStore;
use crate::error::ApiError;
use crate::token::TokenIssuer;

/// Either credential is absent
pub const MISSING_CREDENTIALS: &str = "Faltan credenciales";
/// The body is not a JSON object with string fields
pub const MALFORMED_BODY: &str = "Cuerpo de solicitud inválido";
/// No user with that RUT
pub const USER_NOT_FOUND: &str = "Usuario no encontrado";
/// The secret does not match
pub const WRONG_PASSWORD: &str = "Contraseña incorrecta";

/// Shared login state
pub struct LoginState {
    /// User lookup
    pub store: Arc<dyn UserStore>,
    /// Secret comparison
    pub passwords: PasswordVerifier,
    /// Token signer
    pub issuer: TokenIssuer,
}

/// Credentials as submitted by the client
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Login identifier
    #[serde(rename = "RUT", default)]
    pub rut: Option<String>,
    /// Secret
    #[serde(default)]
    pub contrasena: Option<String>,
}

/// Successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed bearer token
    pub token: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Validate credentials and issue a token
pub async fn login_handler(
    State(state): State<Arc<LoginState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        // Without a JSON content type the body is ignored
        Err(JsonRejection::MissingJsonContentType(_)) => LoginRequest::default(),
        Err(e) => {
            debug!(error = %e, "Rejected login body");
            return Err(ApiError::bad_request(MALFORMED_BODY));
        }
    };

    let (Some(rut), Some(contrasena)) = (non_empty(request.rut), non_empty(request.contrasena))
    else {
        return Err(ApiError::bad_request(MISSING_CREDENTIALS));
    };

    let Some(user) = state.store.find_by_rut(&rut).await? else {
        info!("Login failed: unknown user");
        return Err(ApiError::unauthorized(USER_NOT_FOUND));
    };

    if !state.passwords.verify(&contrasena, &user.contrasena).await? {
        info!(rol = %user.rol, "Login failed: wrong password");
        return Err(ApiError::unauthorized(WRONG_PASSWORD));
    }

    let token = state.issuer.issue(user.subject())?;
    info!(id = user.id, rol = %user.rol, "Token issued");

    Ok(Json(LoginResponse { token }))
}
