use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use taskboard_core::types::{Action, ActionInput};
use taskboard_core::{validate, BoardError};

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// GET /api/actions — list all actions.
pub async fn list_actions(State(app): State<AppState>) -> Result<Json<Vec<Action>>, AppError> {
    Ok(Json(app.store.list_actions().await?))
}

/// GET /api/actions/:id — one action.
pub async fn get_action(
    State(app): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Action>, AppError> {
    let action = app
        .store
        .get_action(id)
        .await?
        .ok_or(BoardError::ActionNotFound(id))?;
    Ok(Json(action))
}

/// POST /api/actions — create an action under an existing project.
pub async fn create_action(
    State(app): State<AppState>,
    ApiJson(body): ApiJson<ActionInput>,
) -> Result<Json<Action>, AppError> {
    let new = validate::new_action(body)?;
    Ok(Json(app.store.insert_action(&new).await?))
}

/// PUT /api/actions/:id — update an action.
pub async fn update_action(
    State(app): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ActionInput>,
) -> Result<Json<Action>, AppError> {
    let changes = validate::action_changes(body)?;
    Ok(Json(app.store.update_action(id, &changes).await?))
}

/// DELETE /api/actions/:id — delete an action.
pub async fn delete_action(
    State(app): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    app.store.delete_action(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
