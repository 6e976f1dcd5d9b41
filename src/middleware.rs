// ABOUTME: Bearer-token extraction and verification for protected routes
// ABOUTME: Routes opt in by taking an AuthUser argument; role checks hang off it

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::AppState;
use crate::auth::Claims;
use crate::entities::user::Role;
use crate::error::AppError;

// Verified caller identity, decoded from the Authorization header.
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn require_storekeeper(&self) -> crate::error::Result<()> {
        if self.0.role == Role::Storekeeper {
            Ok(())
        } else {
            Err(AppError::Forbidden("Storekeeper role required".to_string()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized("Access denied. No token provided.".to_string())
            })?;

        // Accept both "Bearer <token>" and a bare token.
        let token = header_value.strip_prefix("Bearer ").unwrap_or(header_value);

        let app_state = AppState::from_ref(state);
        let claims = app_state.auth.verify_token(token)?;

        Ok(AuthUser(claims))
    }
}
