use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::api::middleware::{
    auth::caller_permission,
    session::{AppState, SESSION_KEY_IS_ADMIN},
};
use crate::error::{AppError, Result};

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(alias = "password")]
    pass: String,
}

/// Grants administrator rights to the session when the passphrase matches
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>> {
    if !state.admin_gate.verify(&request.pass) {
        tracing::warn!("Rejected administrator login attempt");
        return Err(AppError::InvalidCredentials);
    }

    // New id on privilege change so a pre-login cookie cannot be reused
    session.cycle_id().await?;
    session.insert(SESSION_KEY_IS_ADMIN, true).await?;

    tracing::info!("Administrator logged in");

    Ok(Json(json!({ "success": true })))
}

async fn check_auth(session: Session) -> Result<Json<Value>> {
    let permission = caller_permission(&session).await?;
    Ok(Json(json!({ "isAdmin": permission.is_admin() })))
}

/// Logs out the user
async fn logout(session: Session) -> Result<Json<Value>> {
    session.flush().await?;
    Ok(Json(json!({ "ok": true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/check-auth", get(check_auth))
        .route("/api/logout", post(logout))
}
