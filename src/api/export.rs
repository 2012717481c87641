use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::api::middleware::{auth::require_admin, session::AppState};
use crate::error::{AppError, Result};
use crate::models::slot::SlotRecord;
use crate::services::report;

const REPORT_FILENAME: &str = "raffle-report.csv";

/// Downloads the ordered CSV report of occupied slots
async fn export_csv(State(state): State<AppState>, session: Session) -> Result<Response> {
    require_admin(&session, AppError::Forbidden).await?;

    let rows = state.ledger.export_rows().await?;
    let csv = report::render_csv(&rows).map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(rows = rows.len(), "CSV report exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", REPORT_FILENAME),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Raw dump of every stored row, suitable for re-import
async fn export_json(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<SlotRecord>>> {
    require_admin(&session, AppError::Unauthorized).await?;

    let rows = state.ledger.dump().await?;
    Ok(Json(rows))
}

/// Applies an array of slot records in one transaction
async fn import_slots(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    require_admin(&session, AppError::Unauthorized).await?;

    let Value::Array(items) = payload else {
        return Err(AppError::Validation(
            "Import payload must be an array of slot records".to_string(),
        ));
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<SlotRecord>(item)
                .map_err(|e| AppError::Validation(format!("Record {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let count = state.ledger.import(records).await?;

    Ok(Json(json!({ "success": true, "count": count })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/export", get(export_csv))
        .route("/api/export-json", get(export_json))
        .route("/api/import", post(import_slots))
}
