//! Authentication token generation.

use crate::auth::credentials::CredentialSource;
use crate::error::TokenError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_rds::auth_token::{AuthTokenGenerator, Config as AuthTokenConfig};
use aws_types::region::Region;
use aws_types::SdkConfig;
use std::fmt;
use tracing::debug;

/// Inputs for minting one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub region: String,
    pub credentials: CredentialSource,
}

/// Short-lived password substitute.
///
/// The token is never displayed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(<redacted>)")
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

/// Service that mints authentication tokens.
///
/// Implementations make a single attempt per call and do not retry.
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    /// Mint a token for the given host, port, user, region and credentials.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if credentials cannot be loaded or the token
    /// cannot be signed.
    async fn generate(&self, request: TokenRequest) -> Result<AuthToken, TokenError>;
}

/// [`TokenGenerator`] producing RDS IAM authentication tokens.
///
/// The token is a SigV4 presigned `connect` request, valid for 15 minutes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RdsTokenGenerator;

#[async_trait]
impl TokenGenerator for RdsTokenGenerator {
    async fn generate(&self, request: TokenRequest) -> Result<AuthToken, TokenError> {
        let region = Region::new(request.region);
        let provider = request.credentials.into_provider(&region).await;

        let config = AuthTokenConfig::builder()
            .hostname(request.host.as_str())
            .port(u64::from(request.port))
            .username(request.username.as_str())
            .region(region.clone())
            .credentials(provider.clone())
            .build()
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        let sdk_config = SdkConfig::builder()
            .region(region)
            .credentials_provider(provider)
            .behavior_version(BehaviorVersion::latest())
            .build();

        let token = AuthTokenGenerator::new(config)
            .auth_token(&sdk_config)
            .await
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        debug!(
            host = %request.host,
            port = request.port,
            username = %request.username,
            "Generated RDS IAM auth token"
        );

        Ok(AuthToken::new(token.as_str()))
    }
}
