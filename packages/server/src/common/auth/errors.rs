use thiserror::Error;

use super::ErrorCode;

/// Authorization errors for the HR portal gateway
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Admin access required")]
    AdminRequired,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AuthError {
    /// The error-page code this failure surfaces as.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AuthError::AuthenticationRequired | AuthError::InvalidSession => ErrorCode::Auth,
            AuthError::PermissionDenied(_) | AuthError::AdminRequired => ErrorCode::Permission,
            AuthError::DatabaseError(_) | AuthError::InternalError(_) => ErrorCode::Critical,
        }
    }
}
