//! OIDC endpoint configuration.
//!
//! Loads the client-credentials settings for the source and target
//! repositories from environment variables, plus the settings for
//! validating inbound bearer tokens on the RPC surface.

use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnvVar { name: String },
}

/// Client-credentials settings for one outbound repository endpoint.
///
/// `oidc_config` is the value of `OIDC_CONFIG`/`TARGET_OIDC_CONFIG`: either
/// a discovery document URL or a bare issuer, in which case the token
/// endpoint is assumed to be `{oidc_config}/oauth/token`.
#[derive(Debug, Clone)]
pub struct ClientCredentialsConfig {
    pub oidc_config: String,
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentialsConfig {
    /// Loads `{prefix}OIDC_CONFIG`, `{prefix}CLIENT_ID`, `{prefix}CLIENT_SECRET`.
    /// `prefix` is `""` for the source repository, `"TARGET_"` for the target.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            oidc_config: get_required_env(&format!("{prefix}OIDC_CONFIG"))?,
            client_id: get_required_env(&format!("{prefix}CLIENT_ID"))?,
            client_secret: get_required_env(&format!("{prefix}CLIENT_SECRET"))?,
        })
    }

    /// The token endpoint to POST the client-credentials grant to.
    #[must_use]
    pub fn token_url(&self) -> String {
        if self.oidc_config.ends_with("/oauth/token") {
            self.oidc_config.clone()
        } else {
            format!("{}/oauth/token", self.oidc_config.trim_end_matches('/'))
        }
    }
}

/// Settings for validating bearer tokens presented to the RPC surface's
/// `Replication.SendDocument` call.
#[derive(Debug, Clone)]
pub struct JwtValidatorConfig {
    pub jwks_url: String,
    pub issuer: String,
    pub audience: String,
}

impl JwtValidatorConfig {
    /// Loads `RPC_JWKS_URL`, `RPC_ISSUER`, `RPC_AUDIENCE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            jwks_url: get_required_env("RPC_JWKS_URL")?,
            issuer: get_required_env("RPC_ISSUER")?,
            audience: get_required_env("RPC_AUDIENCE")?,
        })
    }
}

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_appends_path() {
        let config = ClientCredentialsConfig {
            oidc_config: "https://issuer.example.com".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        assert_eq!(config.token_url(), "https://issuer.example.com/oauth/token");
    }

    #[test]
    fn token_url_left_as_is_when_already_a_token_endpoint() {
        let config = ClientCredentialsConfig {
            oidc_config: "https://issuer.example.com/oauth/token".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        assert_eq!(config.token_url(), "https://issuer.example.com/oauth/token");
    }
}
