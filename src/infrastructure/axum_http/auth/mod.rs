use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::config_loader;
use crate::infrastructure::axum_http::error_responses::error_response;

pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub role: String,
    pub email: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: String,
}

/// Same as [`AuthUser`] but only admissible for the `admin` role. Used
/// by the plan-configuration management routes.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug)]
pub struct AuthError(anyhow::Error);

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError(err)
    }
}

// Rejections share the `{"error": "..."}` envelope with the routers.
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> Response {
        error_response(
            StatusCode::UNAUTHORIZED,
            format!("Unauthorized: {}", self.0),
        )
    }
}

pub fn validate_session_token(token: &str) -> Result<SessionClaims, AuthError> {
    let config =
        config_loader::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    let secret = config.session.jwt_secret;

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

    let token_data = decode::<SessionClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("Session token validation failed: {}", e))?;

    Ok(token_data.claims)
}

fn session_claims_from_parts(parts: &Parts) -> Result<SessionClaims, Response> {
    let token_header = parts.headers.get(SESSION_TOKEN_HEADER).ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "Missing session token header")
    })?;

    let token = token_header
        .to_str()
        .map_err(|_| error_response(StatusCode::UNAUTHORIZED, "Invalid session token header"))?;

    validate_session_token(token)
        .map_err(|e| error_response(StatusCode::UNAUTHORIZED, e.0.to_string()))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = session_claims_from_parts(parts)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            error_response(StatusCode::UNAUTHORIZED, "Invalid user ID in token")
        })?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        if auth_user.role != "admin" {
            return Err(error_response(StatusCode::FORBIDDEN, "Admin role required"));
        }

        Ok(AdminUser {
            user_id: auth_user.user_id,
            email: auth_user.email,
        })
    }
}
