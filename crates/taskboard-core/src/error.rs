use thiserror::Error;

pub use sqlx::Error as DatabaseError;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{0}")]
    Validation(String),

    #[error("project not found: {0}")]
    ProjectNotFound(i64),

    #[error("action not found: {0}")]
    ActionNotFound(i64),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("schema setup failed: {0}")]
    Migrate(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;
