use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskboard_core::BoardError;

/// Body returned for every unexpected failure. The real cause is logged.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BoardError::Validation(msg.into()).into())
    }

    fn status(&self) -> StatusCode {
        // Extractor rejections keep axum's status but get the JSON body.
        if let Some(r) = self.0.downcast_ref::<JsonRejection>() {
            return r.status();
        }
        if let Some(r) = self.0.downcast_ref::<PathRejection>() {
            return r.status();
        }
        match self.0.downcast_ref::<BoardError>() {
            Some(BoardError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(BoardError::ProjectNotFound(_) | BoardError::ActionNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Some(
                BoardError::InvalidConfig(_)
                | BoardError::Migrate(_)
                | BoardError::Database(_)
                | BoardError::Io(_)
                | BoardError::Yaml(_),
            )
            | None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "request failed");
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.0.to_string()
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_core::error::DatabaseError;

    #[test]
    fn validation_maps_to_400() {
        let response = AppError::bad_request("name is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn project_not_found_maps_to_404() {
        let err = AppError(BoardError::ProjectNotFound(1).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn action_not_found_maps_to_404() {
        let err = AppError(BoardError::ActionNotFound(1).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_error_maps_to_500() {
        let err = AppError(BoardError::Database(DatabaseError::PoolClosed).into());
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("boom"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
