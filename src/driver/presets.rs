//! Wrapper configuration and database flavor presets.

use crate::connection::properties::{DEFAULT_PASSWORD_PROPERTY, DEFAULT_USER_PROPERTY};
use serde::{Deserialize, Serialize};

/// Wrapper URL scheme of the MySQL flavor.
pub const MYSQL_SCHEME: &str = "iammysql";
/// URL scheme of the MySQL delegate.
pub const MYSQL_DELEGATE_SCHEME: &str = "mysql";
/// Default MySQL port.
pub const MYSQL_DEFAULT_PORT: u16 = 3306;
/// Registry identifier of the MySQL delegate driver.
pub const MYSQL_DELEGATE_DRIVER: &str = "mysql";

/// Wrapper URL scheme of the PostgreSQL flavor.
pub const POSTGRESQL_SCHEME: &str = "iampostgresql";
/// URL scheme of the PostgreSQL delegate.
pub const POSTGRESQL_DELEGATE_SCHEME: &str = "postgresql";
/// Default PostgreSQL port.
pub const POSTGRESQL_DEFAULT_PORT: u16 = 5432;
/// Registry identifier of the PostgreSQL delegate driver.
pub const POSTGRESQL_DELEGATE_DRIVER: &str = "postgresql";

/// What to do when a token cannot be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenFailurePolicy {
    /// Log a warning and connect with the caller's password property unchanged
    #[default]
    FailOpen,
    /// Abort the connection attempt with the token error
    FailClosed,
}

/// Static configuration of one wrapper instance.
///
/// # Example
///
/// ```
/// use iam_auth_driver::driver::WrapperConfig;
///
/// let config = WrapperConfig::mysql().with_accept_delegate_urls(false);
/// assert_eq!(config.wrapper_scheme.as_deref(), Some("iammysql"));
/// assert_eq!(config.default_port, Some(3306));
/// assert!(!config.accept_delegate_urls);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperConfig {
    /// Scheme owned by the wrapper, e.g. `iammysql`
    pub wrapper_scheme: Option<String>,
    /// Scheme substituted before delegating, e.g. `mysql`
    pub delegate_scheme: Option<String>,
    /// Port used when the URL has none
    pub default_port: Option<u16>,
    /// Delegate driver identifier used when the connection does not name one
    pub delegate_driver: Option<String>,
    /// Property overwritten with the token
    pub password_property: String,
    /// Property holding the database username
    pub user_property: String,
    /// Whether URLs in the delegate's own scheme are accepted and passed through
    pub accept_delegate_urls: bool,
    /// Behavior when token generation fails
    pub token_failure_policy: TokenFailurePolicy,
}

impl WrapperConfig {
    /// Wrapper with no scheme, port or delegate; everything comes from the
    /// connection properties.
    pub fn generic() -> Self {
        Self {
            wrapper_scheme: None,
            delegate_scheme: None,
            default_port: None,
            delegate_driver: None,
            password_property: DEFAULT_PASSWORD_PROPERTY.to_string(),
            user_property: DEFAULT_USER_PROPERTY.to_string(),
            accept_delegate_urls: true,
            token_failure_policy: TokenFailurePolicy::FailOpen,
        }
    }

    /// `jdbc:iammysql://` wrapper around the `mysql` delegate.
    pub fn mysql() -> Self {
        Self::flavor(
            MYSQL_SCHEME,
            MYSQL_DELEGATE_SCHEME,
            MYSQL_DEFAULT_PORT,
            MYSQL_DELEGATE_DRIVER,
        )
    }

    /// `jdbc:iampostgresql://` wrapper around the `postgresql` delegate.
    pub fn postgresql() -> Self {
        Self::flavor(
            POSTGRESQL_SCHEME,
            POSTGRESQL_DELEGATE_SCHEME,
            POSTGRESQL_DEFAULT_PORT,
            POSTGRESQL_DELEGATE_DRIVER,
        )
    }

    /// Wrapper bound to a wrapper scheme and a delegate.
    pub fn flavor(
        wrapper_scheme: &str,
        delegate_scheme: &str,
        default_port: u16,
        delegate_driver: &str,
    ) -> Self {
        Self {
            wrapper_scheme: Some(wrapper_scheme.to_string()),
            delegate_scheme: Some(delegate_scheme.to_string()),
            default_port: Some(default_port),
            delegate_driver: Some(delegate_driver.to_string()),
            ..Self::generic()
        }
    }

    pub fn with_accept_delegate_urls(mut self, accept: bool) -> Self {
        self.accept_delegate_urls = accept;
        self
    }

    pub fn with_password_property(mut self, property: &str) -> Self {
        self.password_property = property.to_string();
        self
    }

    pub fn with_user_property(mut self, property: &str) -> Self {
        self.user_property = property.to_string();
        self
    }

    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = Some(port);
        self
    }

    pub fn with_delegate_driver(mut self, identifier: &str) -> Self {
        self.delegate_driver = Some(identifier.to_string());
        self
    }

    pub fn with_token_failure_policy(mut self, policy: TokenFailurePolicy) -> Self {
        self.token_failure_policy = policy;
        self
    }
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self::generic()
    }
}
