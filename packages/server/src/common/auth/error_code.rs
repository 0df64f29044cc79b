/// Error codes surfaced to the error pages via the `code` query parameter.
///
/// Each code maps to a fixed, human-readable title/message pair rendered
/// at request time. The pages never echo raw error details back to the
/// browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Session lookup failed at the edge
    Auth,
    /// Unexpected failure inside the gateway
    Critical,
    /// Authenticated but not allowed
    Permission,
    /// Auth callback hit without a one-time code
    NoAuthCode,
    /// Code-for-session exchange failed
    AuthFailed,
    /// Generic sign-in failure
    AuthError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Auth => "auth",
            ErrorCode::Critical => "critical",
            ErrorCode::Permission => "permission",
            ErrorCode::NoAuthCode => "no_auth_code",
            ErrorCode::AuthFailed => "auth_failed",
            ErrorCode::AuthError => "auth_error",
        }
    }

    /// Parse a query-parameter value. Unknown or absent codes render the
    /// generic sign-in failure copy rather than erroring.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("auth") => ErrorCode::Auth,
            Some("critical") => ErrorCode::Critical,
            Some("permission") => ErrorCode::Permission,
            Some("no_auth_code") => ErrorCode::NoAuthCode,
            Some("auth_failed") => ErrorCode::AuthFailed,
            _ => ErrorCode::AuthError,
        }
    }

    /// Title and message shown on the error pages.
    pub fn page_copy(&self) -> (&'static str, &'static str) {
        match self {
            ErrorCode::Auth => (
                "Session problem",
                "We couldn't verify your session. Please sign in again.",
            ),
            ErrorCode::Critical => (
                "Something went wrong",
                "An unexpected error occurred. Please try again, and contact support if it keeps happening.",
            ),
            ErrorCode::Permission => (
                "Access denied",
                "You don't have permission to view this page.",
            ),
            ErrorCode::NoAuthCode => (
                "Sign-in incomplete",
                "The sign-in link was missing its confirmation code. Please request a new one.",
            ),
            ErrorCode::AuthFailed => (
                "Sign-in failed",
                "We couldn't complete your sign-in. Please try again.",
            ),
            ErrorCode::AuthError => (
                "Authentication error",
                "Something went wrong while signing you in. Please try again.",
            ),
        }
    }
}
