use actix_web::{
    http::StatusCode,
    HttpResponse,
    ResponseError,
};

/// Errors returned by `AuthService` operations. Store-level failures never
/// appear here directly; the service translates them into one of these
/// variants, or into a non-error outcome.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Indicates that a user tried to register with an email address which
    /// already belongs to an account.
    #[error("email already registered")]
    AlreadyRegistered,

    /// Indicates that a session was requested for an email address which has
    /// no account.
    #[error("no such user")]
    NotFound,

    /// Indicates that a password reset was requested for an email address
    /// which has no account.
    #[error("unknown email")]
    UnknownEmail,

    /// Indicates that a password update was attempted with a reset token
    /// which no account holds. The token might already have been used, or
    /// it never existed.
    #[error("invalid reset token")]
    InvalidResetToken,

    /// Indicates that the user did not provide a correct email and password
    /// combination when attempting to log in.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Indicates that the request has no session cookie, or the cookie does
    /// not belong to an active session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Internal error which occurs when hashing or verifying a password. This
    /// could indicate, for example, that a hash stored in the database is in
    /// the wrong format, or uses an unsupported algorithm.
    #[error("password hashing failed: {0}")]
    Hasher(password_hash::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AlreadyRegistered => StatusCode::BAD_REQUEST,

            Self::NotFound
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            Self::UnknownEmail
            | Self::InvalidResetToken
            | Self::NotAuthenticated => StatusCode::FORBIDDEN,

            Self::Hasher(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        Error::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        // Don't leak hashing internals to the client.
        let message = match self {
            Self::Hasher(_) => "internal error".to_string(),
            e => e.to_string(),
        };

        HttpResponse::build(Error::status_code(self))
            .json(serde_json::json!({"message": message}))
    }
}
