use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::repo::{Session, User};
use crate::auth::token::AuthKeys;
use crate::error::AppError;
use crate::state::AppState;

/// Resolved identity for a request: the user plus the exact token that
/// authenticated it.
///
/// Rejects with 401 (empty body) when the `x-auth` header is missing, the
/// signature does not verify, or the token is no longer in the live session
/// set.
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("x-auth")
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let keys = AuthKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid auth token");
            AppError::Unauthorized
        })?;

        // Signature validity alone is not enough: membership in the live
        // session set is authoritative for revocation. A store failure here
        // propagates as 500, never as a silent pass or a 401.
        let user = Session::find_user(&state.db, token, claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token not in live session set");
                AppError::Unauthorized
            })?;

        Ok(AuthSession {
            user,
            token: token.to_string(),
        })
    }
}
