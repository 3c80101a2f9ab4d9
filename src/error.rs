//! Error types for iam-auth-driver.
//!
//! This module defines domain-specific error types organized by the stage of a
//! connection attempt they belong to.

use std::fmt;
use thiserror::Error;

/// Boxed error used where an external collaborator supplies its own error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error returned through the driver contract.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The wrapper is missing configuration it cannot proceed without
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The delegate driver identifier could not be turned into a driver
    #[error("Unable to load delegate driver '{identifier}': {source}")]
    DriverLoad {
        identifier: String,
        #[source]
        source: LoadError,
    },

    /// Token generation failed and the wrapper is configured to fail closed
    #[error(transparent)]
    TokenGeneration(#[from] TokenError),

    /// The requested capability is not available
    #[error("Feature not supported: {0}")]
    Unsupported(String),

    /// Error raised by a delegate driver
    #[error("Delegate driver error: {0}")]
    Delegate(#[source] BoxError),
}

/// Errors caused by missing or invalid wrapper configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No delegate driver identifier in the properties, URL or wrapper defaults
    #[error("No delegate driver configured")]
    NoDelegateDriver,

    /// A wrapper-scheme URL needs rewriting but no delegate scheme is known
    #[error("No delegate scheme name configured for rewriting the connection URL")]
    MissingDelegateScheme,

    /// The connection URL has no host
    #[error("No database host specified. IAM auth requires that a host be specified in the connection URL")]
    MissingHost,

    /// The connection URL has no port and the wrapper has no default
    #[error("No database port specified. IAM auth requires that a port be specified in the connection URL")]
    MissingPort,

    /// The username property is not set
    #[error("No database user specified in property '{property}'")]
    MissingUsername { property: String },

    /// The connection URL could not be parsed
    #[error("Unable to parse connection URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised while instantiating a delegate driver.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Nothing is registered under the identifier
    #[error("no driver registered under identifier '{0}'")]
    UnknownIdentifier(String),

    /// The registered constructor failed
    #[error("driver construction failed: {0}")]
    Instantiation(#[source] BoxError),
}

/// Errors raised while minting an authentication token.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Host, port or username could not be determined
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// No region could be resolved from any source
    #[error("Unable to resolve an AWS region")]
    NoRegion,

    /// Credentials could not be loaded
    #[error("Unable to load AWS credentials: {0}")]
    Credentials(String),

    /// The token could not be signed
    #[error("Unable to sign authentication token: {0}")]
    Signing(String),
}

/// SQLSTATE classes reported for driver errors.
///
/// These let callers that speak SQLSTATE classify wrapper failures the same way
/// they classify errors from the delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlState {
    /// 08001: unable to establish connection
    ConnectionRejected,
    /// 28000: invalid authorization specification
    InvalidAuthorization,
    /// 0A000: feature not supported
    FeatureNotSupported,
    /// HY000: general error
    General,
}

impl SqlState {
    /// The five character SQLSTATE code.
    pub fn code(&self) -> &'static str {
        match self {
            SqlState::ConnectionRejected => "08001",
            SqlState::InvalidAuthorization => "28000",
            SqlState::FeatureNotSupported => "0A000",
            SqlState::General => "HY000",
        }
    }
}

impl fmt::Display for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl DriverError {
    /// Map to a SQLSTATE class.
    pub fn sql_state(&self) -> SqlState {
        match self {
            DriverError::Configuration(_) | DriverError::DriverLoad { .. } => {
                SqlState::ConnectionRejected
            }
            DriverError::TokenGeneration(_) => SqlState::InvalidAuthorization,
            DriverError::Unsupported(_) => SqlState::FeatureNotSupported,
            DriverError::Delegate(_) => SqlState::General,
        }
    }
}
