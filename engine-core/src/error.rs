use thiserror::Error;

/// Error taxonomy shared by every engine operation.
///
/// Validation failures carry the full list of field-scoped messages so a
/// caller can surface them all at once instead of fixing one at a time.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("not found: {0}")]
    NotFound(anyhow::Error),

    #[error("conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("illegal state transition: {current} -> {attempted}")]
    IllegalTransition { current: String, attempted: String },

    #[error("database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Transient errors are safe to retry from the caller's side.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}
