use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use taskboard_core::types::{Action, Project, ProjectDetail, ProjectInput};
use taskboard_core::validate;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// GET /api/projects — list all projects.
pub async fn list_projects(State(app): State<AppState>) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(app.store.list_projects().await?))
}

/// GET /api/projects/:id — one project with its actions.
pub async fn get_project(
    State(app): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ProjectDetail>, AppError> {
    Ok(Json(app.store.project_detail(id).await?))
}

/// GET /api/projects/:id/actions (or /api/projects/actions/:id) — actions of
/// one project. Empty when the project has none, 404 when it does not exist.
pub async fn list_project_actions(
    State(app): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<Action>>, AppError> {
    Ok(Json(app.store.project_actions(id).await?))
}

/// POST /api/projects — create a project.
pub async fn create_project(
    State(app): State<AppState>,
    ApiJson(body): ApiJson<ProjectInput>,
) -> Result<Json<Project>, AppError> {
    let fields = validate::project_fields(body)?;
    Ok(Json(app.store.insert_project(&fields).await?))
}

/// PUT /api/projects/:id — replace name and description.
pub async fn update_project(
    State(app): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ProjectInput>,
) -> Result<Json<Project>, AppError> {
    let fields = validate::project_fields(body)?;
    Ok(Json(app.store.update_project(id, &fields).await?))
}

/// DELETE /api/projects/:id — delete a project and its actions.
pub async fn delete_project(
    State(app): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    app.store.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
