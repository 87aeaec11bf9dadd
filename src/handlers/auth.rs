// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CredentialsRequest, SessionResponse, WhoAmIResponse},
    services::credentials::CredentialStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{bearer_user, sign_jwt},
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2, stores it, persists the store and
/// returns a session token for the new account.
pub async fn signup(
    State(users): State<Arc<dyn CredentialStore>>,
    State(config): State<Config>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if users.lookup(&payload.username).await.is_some() {
        return Err(AppError::Conflict("Username exists".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    // Re-checked atomically: a concurrent signup may have taken the name.
    if !users.insert_if_absent(&payload.username, hashed_password).await {
        return Err(AppError::Conflict("Username exists".to_string()));
    }

    users.persist().await.map_err(|e| {
        tracing::error!("Failed to persist credential store: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(username = %payload.username, "User registered");

    let token = sign_jwt(&payload.username, &config.jwt_secret, config.jwt_expiration)?;
    Ok(Json(SessionResponse { ok: true, token }))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown users and wrong passwords get the same 401.
pub async fn login(
    State(users): State<Arc<dyn CredentialStore>>,
    State(config): State<Config>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let stored_hash = users
        .lookup(&payload.username)
        .await
        .ok_or_else(|| AppError::AuthError("Bad credentials".to_string()))?;

    if !verify_password(&payload.password, &stored_hash)? {
        return Err(AppError::AuthError("Bad credentials".to_string()));
    }

    let token = sign_jwt(&payload.username, &config.jwt_secret, config.jwt_expiration)?;
    Ok(Json(SessionResponse { ok: true, token }))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

pub async fn whoami(State(config): State<Config>, headers: HeaderMap) -> impl IntoResponse {
    Json(WhoAmIResponse {
        user: bearer_user(&headers, &config.jwt_secret),
    })
}
