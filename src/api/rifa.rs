use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tower_sessions::Session;

use crate::api::middleware::{auth::caller_permission, session::AppState};
use crate::error::Result;
use crate::models::slot::{SlotId, SlotRecord};

/// Lists every occupied slot keyed by its number. No login required.
async fn list_slots(State(state): State<AppState>) -> Result<Json<BTreeMap<SlotId, SlotRecord>>> {
    let slots = state.ledger.list().await?;
    Ok(Json(slots))
}

/// Claims, updates or releases a slot depending on the caller's permission
async fn write_slot(
    State(state): State<AppState>,
    session: Session,
    Json(change): Json<SlotRecord>,
) -> Result<Json<Value>> {
    let permission = caller_permission(&session).await?;
    state.ledger.write(change, permission).await?;

    Ok(Json(json!({ "ok": true })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/rifa", get(list_slots).post(write_slot))
}
