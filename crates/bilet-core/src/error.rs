use thiserror::Error;

/// Core error types for bilet operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Authentication token is missing")]
    TokenMissing,

    #[error("Authentication token is invalid or expired")]
    InvalidToken,

    #[error("Not authorized to perform this operation")]
    Unauthorized,

    #[error("Login is already taken")]
    LoginTaken,

    #[error("Invalid login")]
    InvalidLogin,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("Ticket type already exists for this event")]
    TicketTypeExists,

    #[error("Invalid data: {0}")]
    Validation(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Create a new NotFound error.
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }

    /// Create a new Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error should surface as an authentication failure (401).
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::TokenMissing
                | Self::InvalidToken
                | Self::Unauthorized
                | Self::InvalidLogin
                | Self::InvalidPassword
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_classified() {
        assert!(CoreError::TokenMissing.is_auth_error());
        assert!(CoreError::InvalidToken.is_auth_error());
        assert!(!CoreError::not_found("Event").is_auth_error());
        assert!(!CoreError::TicketTypeExists.is_auth_error());
    }

    #[test]
    fn not_found_names_the_entity() {
        let err = CoreError::not_found("Ticket");
        assert_eq!(err.to_string(), "Ticket not found");
    }
}
