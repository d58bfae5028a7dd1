use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/health — store connectivity probe.
pub async fn health(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    app.store.health_check().await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
