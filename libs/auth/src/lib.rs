//! Authentication for the replicator: outbound client-credentials tokens
//! for calling the source/target repositories, and inbound JWT/scope
//! validation for the RPC surface.

pub mod config;
pub mod error;
pub mod jwks;
pub mod jwt;
pub mod oidc;

pub use config::{ClientCredentialsConfig, ConfigError, JwtValidatorConfig};
pub use error::{AuthError, AuthResult};
pub use jwks::JwksCache;
pub use jwt::{Claims, JwtValidator};
pub use oidc::{ClientCredentialsTokenProvider, TokenProviders};
