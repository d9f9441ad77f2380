use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, HeaderValue},
    routing::{delete, get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        extractors::AuthSession,
        password::{hash_password, verify_password},
        repo::{Session, User},
        token::AuthKeys,
    },
    error::AppError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/me", get(me))
        .route("/users/me/token", delete(logout))
}

const MIN_EMAIL_LEN: usize = 6;
const MIN_PASSWORD_LEN: usize = 6;

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() >= MIN_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Issued tokens travel back in the `x-auth` response header.
fn auth_header(token: &str) -> Result<HeaderMap, AppError> {
    let value =
        HeaderValue::from_str(token).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    let mut headers = HeaderMap::new();
    headers.insert("x-auth", value);
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(HeaderMap, Json<PublicUser>), AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("invalid email".into()));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation(
            "password must be at least 6 characters".into(),
        ));
    }

    let hash = hash_password(&payload.password)?;

    // No pre-check for the email: the unique constraint decides, so two
    // concurrent registrations of one address cannot both win.
    let user = User::create(&state.db, &payload.email, &hash).await?;

    let keys = AuthKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    Session::insert(&state.db, user.id, &token).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        auth_header(&token)?,
        Json(PublicUser {
            id: user.id,
            email: user.email,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<PublicUser>), AppError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            AppError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let keys = AuthKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    // Appends a fresh session; tokens from other devices stay valid.
    Session::insert(&state.db, user.id, &token).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        auth_header(&token)?,
        Json(PublicUser {
            id: user.id,
            email: user.email,
        }),
    ))
}

#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<serde_json::Value>, AppError> {
    Session::revoke(&state.db, session.user.id, &session.token).await?;
    info!(user_id = %session.user.id, "session revoked");
    Ok(Json(serde_json::json!({})))
}

#[instrument(skip(session))]
pub async fn me(session: AuthSession) -> Json<PublicUser> {
    Json(PublicUser {
        id: session.user.id,
        email: session.user.email,
    })
}


#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn public_user_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
        assert!(!json.contains("password"));
    }
}
