//! Connection property resolution.
//!
//! Caller-supplied properties and URL query parameters are merged into a single
//! [`ResolvedConfig`]. Query parameters take precedence, in line with how
//! drivers such as the PostgreSQL one treat URL parameters.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Caller-supplied connection properties.
pub type Properties = HashMap<String, String>;

/// Property key naming the delegate driver identifier.
pub const DELEGATE_DRIVER_PROPERTY: &str = "delegateJdbcDriverClass";
/// Property key naming the delegate URL scheme, e.g. `mysql` or `postgresql`.
pub const DELEGATE_SCHEME_PROPERTY: &str = "delegateJdbcDriverSchemeName";
/// Optional AWS region. When absent, the profile region or the default region
/// provider chain is used.
pub const AWS_REGION_PROPERTY: &str = "awsRegion";
/// Optional AWS profile to source credentials and region from.
pub const AWS_PROFILE_PROPERTY: &str = "awsProfile";
/// Optional role ARN to assume before requesting a token.
pub const AWS_ROLE_ARN_PROPERTY: &str = "awsStsCredentialProviderRoleArn";
/// Optional session name for the assumed role. Only used together with
/// [`AWS_ROLE_ARN_PROPERTY`]; a random one is generated when absent.
pub const AWS_ROLE_SESSION_NAME_PROPERTY: &str = "awsStsCredentialProviderSessionName";
/// Optional external ID for the assume role call. Only used together with
/// [`AWS_ROLE_ARN_PROPERTY`].
pub const AWS_EXTERNAL_ID_PROPERTY: &str = "awsStsCredentialProviderExternalId";
/// Optional access key. Ignored unless [`AWS_SECRET_ACCESS_KEY_PROPERTY`] is set too.
pub const AWS_ACCESS_KEY_ID_PROPERTY: &str = "awsAccessKeyId";
/// Optional secret key. Ignored unless [`AWS_ACCESS_KEY_ID_PROPERTY`] is set too.
pub const AWS_SECRET_ACCESS_KEY_PROPERTY: &str = "awsSecretAccessKey";

/// Default property overwritten with the generated token.
pub const DEFAULT_PASSWORD_PROPERTY: &str = "password";
/// Default property holding the database username.
pub const DEFAULT_USER_PROPERTY: &str = "user";

/// Two-level lookup over URL query parameters and caller properties.
#[derive(Debug, Clone, Copy)]
pub struct PropertyLookup<'a> {
    properties: &'a Properties,
    query: &'a BTreeMap<String, String>,
}

impl<'a> PropertyLookup<'a> {
    /// Create a lookup over the two sources.
    pub fn new(properties: &'a Properties, query: &'a BTreeMap<String, String>) -> Self {
        Self { properties, query }
    }

    /// Get a property, preferring the URL query parameter.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.query
            .get(key)
            .or_else(|| self.properties.get(key))
            .map(String::as_str)
    }

    fn get_owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

/// Effective configuration for a single connection attempt.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Database username read from the configured user property
    pub username: Option<String>,
    /// Name of the property the token is written to
    pub password_property: String,
    /// Explicit AWS region
    pub region: Option<String>,
    /// AWS profile name
    pub profile: Option<String>,
    /// Static access key
    pub access_key_id: Option<String>,
    /// Static secret key (never displayed)
    pub secret_access_key: Option<String>,
    /// Role to assume
    pub role_arn: Option<String>,
    /// External ID passed to the assume role call
    pub external_id: Option<String>,
    /// Session name for the assumed role
    pub role_session_name: Option<String>,
    /// Delegate driver identifier
    pub delegate_driver: Option<String>,
    /// Delegate URL scheme
    pub delegate_scheme: Option<String>,
}

impl ResolvedConfig {
    /// Resolve the configuration for one call.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Merged view over query parameters and caller properties
    /// * `user_property` - Property holding the username
    /// * `password_property` - Property the token will be written to
    pub fn resolve(
        lookup: &PropertyLookup<'_>,
        user_property: &str,
        password_property: &str,
    ) -> Self {
        Self {
            username: lookup.get_owned(user_property),
            password_property: password_property.to_string(),
            region: lookup.get_owned(AWS_REGION_PROPERTY),
            profile: lookup.get_owned(AWS_PROFILE_PROPERTY),
            access_key_id: lookup.get_owned(AWS_ACCESS_KEY_ID_PROPERTY),
            secret_access_key: lookup.get_owned(AWS_SECRET_ACCESS_KEY_PROPERTY),
            role_arn: lookup.get_owned(AWS_ROLE_ARN_PROPERTY),
            external_id: lookup.get_owned(AWS_EXTERNAL_ID_PROPERTY),
            role_session_name: lookup.get_owned(AWS_ROLE_SESSION_NAME_PROPERTY),
            delegate_driver: lookup.get_owned(DELEGATE_DRIVER_PROPERTY),
            delegate_scheme: lookup.get_owned(DELEGATE_SCHEME_PROPERTY),
        }
    }
}

// Prevent the secret key from being displayed in debug output
impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("username", &self.username)
            .field("password_property", &self.password_property)
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("role_arn", &self.role_arn)
            .field("external_id", &self.external_id)
            .field("role_session_name", &self.role_session_name)
            .field("delegate_driver", &self.delegate_driver)
            .field("delegate_scheme", &self.delegate_scheme)
            .finish()
    }
}
