use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::state::AppState;

/// Resolves the `Authorization` header to the user holding that session token.
pub struct AuthUser(pub User);

/// [`AuthUser`] that must also be an administrator.
pub struct AdminUser(pub User);

/// Accepts `Bearer <token>` or a bare token.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| {
                warn!("missing Authorization header");
                AppError::Unauthorized
            })?;

        match User::find_by_token(&state.db, token).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                warn!("unknown session token");
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            warn!(user_id = %user.id, "admin route denied");
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
