//! Authentication error types.

use crate::config::ConfigError;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// JWT token is malformed or has an invalid signature.
    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    /// JWT token has expired (exp claim in the past).
    #[error("token has expired")]
    TokenExpired,

    /// No authentication token provided in request.
    #[error("authentication token missing")]
    MissingToken,

    /// JWKS key not found for the token's key ID.
    #[error("signing key not found: {kid}")]
    KeyNotFound { kid: String },

    /// Failed to fetch JWKS from the identity provider.
    #[error("failed to fetch JWKS: {0}")]
    JwksFetchError(String),

    /// Client-credentials token request failed.
    #[error("token request failed: {0}")]
    TokenRequestError(String),

    /// Token carries none of the scopes required for the requested operation.
    #[error("insufficient scope")]
    InsufficientScope,

    /// Configuration error (missing or invalid settings).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AuthError {
    #[must_use]
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            AuthError::invalid_token("bad signature").to_string(),
            "invalid token: bad signature"
        );
        assert_eq!(AuthError::TokenExpired.to_string(), "token has expired");
        assert_eq!(
            AuthError::MissingToken.to_string(),
            "authentication token missing"
        );
        assert_eq!(
            AuthError::key_not_found("abc123").to_string(),
            "signing key not found: abc123"
        );
    }

    #[test]
    fn config_error_conversion() {
        let config_err = ConfigError::MissingEnvVar {
            name: "OIDC_CONFIG".to_string(),
        };
        let auth_err: AuthError = config_err.into();
        assert!(matches!(auth_err, AuthError::Config(_)));
    }
}
