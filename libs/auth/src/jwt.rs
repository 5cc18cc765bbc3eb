//! JWT validation for inbound RPC calls.
//!
//! Validates bearer tokens presented to `Replication.SendDocument` against
//! the configured identity provider's public keys, and exposes the
//! space-separated `scope` claim so the caller can enforce the
//! `doc_admin`/`doc_write` requirement.

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtValidatorConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwks::JwksCache;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: Audience,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub scope: String,
}

impl Claims {
    /// Returns true if any of `wanted` appears in the space-separated
    /// `scope` claim.
    #[must_use]
    pub fn has_any_scope(&self, wanted: &[&str]) -> bool {
        let granted: std::collections::HashSet<&str> = self.scope.split(' ').collect();
        wanted.iter().any(|w| granted.contains(w))
    }
}

/// Audience claim that can be either a single string or array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    #[must_use]
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Self::Single(s) => s == expected,
            Self::Multiple(v) => v.iter().any(|s| s == expected),
        }
    }
}

pub struct JwtValidator {
    jwks: JwksCache,
    config: JwtValidatorConfig,
}

impl JwtValidator {
    #[must_use]
    pub fn new(config: JwtValidatorConfig) -> Self {
        Self {
            jwks: JwksCache::new(config.jwks_url.clone()),
            config,
        }
    }

    /// Validates `token`'s signature, issuer, audience, and expiry (60s
    /// leeway for clock skew), returning its claims on success.
    pub async fn validate(&self, token: &str) -> AuthResult<Claims> {
        let header = decode_header(token)
            .map_err(|e| AuthError::invalid_token(format!("invalid header: {e}")))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid_token("missing kid in token header"))?;

        let key = self.jwks.get_or_refresh_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.leeway = 60;

        let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidIssuer => AuthError::invalid_token(format!(
                    "issuer mismatch: expected {}",
                    self.config.issuer
                )),
                ErrorKind::InvalidAudience => AuthError::invalid_token(format!(
                    "audience mismatch: expected {}",
                    self.config.audience
                )),
                ErrorKind::InvalidAlgorithm => AuthError::invalid_token("algorithm must be RS256"),
                _ => AuthError::invalid_token(format!("validation failed: {e}")),
            }
        })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_single_contains() {
        let aud = Audience::Single("replicator-rpc".to_string());
        assert!(aud.contains("replicator-rpc"));
        assert!(!aud.contains("other"));
    }

    #[test]
    fn audience_multiple_contains() {
        let aud = Audience::Multiple(vec!["replicator-rpc".to_string(), "other".to_string()]);
        assert!(aud.contains("replicator-rpc"));
        assert!(aud.contains("other"));
        assert!(!aud.contains("unknown"));
    }

    #[test]
    fn has_any_scope_matches() {
        let claims = Claims {
            sub: "service-account".to_string(),
            iss: "https://issuer.example.com/".to_string(),
            aud: Audience::Single("replicator-rpc".to_string()),
            exp: 0,
            iat: 0,
            scope: "doc_write other_scope".to_string(),
        };
        assert!(claims.has_any_scope(&["doc_admin", "doc_write"]));
        assert!(!claims.has_any_scope(&["doc_admin"]));
    }

    #[test]
    fn has_any_scope_empty_scope_matches_nothing() {
        let claims = Claims {
            sub: "service-account".to_string(),
            iss: "https://issuer.example.com/".to_string(),
            aud: Audience::Single("replicator-rpc".to_string()),
            exp: 0,
            iat: 0,
            scope: String::new(),
        };
        assert!(!claims.has_any_scope(&["doc_admin", "doc_write"]));
    }
}
