//! Credential source selection.
//!
//! A [`CredentialSource`] describes where the AWS credentials used to sign a
//! token come from. It is a plain value so the selection can be inspected and
//! tested; [`CredentialSource::into_provider`] turns it into an SDK provider.

use crate::connection::ResolvedConfig;
use aws_config::default_provider::credentials::DefaultCredentialsChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::sts::AssumeRoleProvider;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_types::region::Region;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Prefix of generated role session names.
pub const ROLE_SESSION_NAME_PREFIX: &str = "IAM_RDS_DRIVER_WRAPPER";

const STATIC_PROVIDER_NAME: &str = "IamAuthDriverStatic";

/// Where the base credentials come from.
#[derive(Clone, PartialEq, Eq)]
pub enum BaseCredentials {
    /// Explicit access key and secret key
    Static {
        access_key_id: String,
        secret_access_key: String,
    },
    /// Named profile from the shared config and credentials files
    Profile(String),
    /// Ambient default provider chain
    DefaultChain,
}

impl fmt::Debug for BaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseCredentials::Static { access_key_id, .. } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .finish(),
            BaseCredentials::Profile(name) => f.debug_tuple("Profile").field(name).finish(),
            BaseCredentials::DefaultChain => f.write_str("DefaultChain"),
        }
    }
}

/// Parameters for assuming a role on top of the base credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssumption {
    pub role_arn: String,
    pub external_id: Option<String>,
    pub session_name: String,
}

/// Base credentials, optionally decorated with a role assumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSource {
    base: BaseCredentials,
    role: Option<RoleAssumption>,
}

impl CredentialSource {
    /// Create a credential source from its parts.
    pub fn new(base: BaseCredentials, role: Option<RoleAssumption>) -> Self {
        Self { base, role }
    }

    /// Select the credential source for a resolved configuration.
    ///
    /// Static keys win when both halves are present, then a named profile, then
    /// the default chain. A role ARN wraps whichever was selected.
    pub fn resolve(config: &ResolvedConfig) -> Self {
        let base = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => BaseCredentials::Static {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            },
            _ => match &config.profile {
                Some(profile) => BaseCredentials::Profile(profile.clone()),
                None => BaseCredentials::DefaultChain,
            },
        };

        let role = config.role_arn.as_ref().map(|role_arn| RoleAssumption {
            role_arn: role_arn.clone(),
            external_id: config.external_id.clone(),
            session_name: config
                .role_session_name
                .clone()
                .unwrap_or_else(generate_session_name),
        });

        Self { base, role }
    }

    /// The undecorated credential source.
    pub fn base(&self) -> &BaseCredentials {
        &self.base
    }

    /// The role assumption decorator, if any.
    pub fn role(&self) -> Option<&RoleAssumption> {
        self.role.as_ref()
    }

    /// Build the SDK credentials provider described by this source.
    ///
    /// Nothing is fetched here; providers load lazily when the token is signed.
    pub async fn into_provider(self, region: &Region) -> SharedCredentialsProvider {
        let base = match self.base {
            BaseCredentials::Static {
                access_key_id,
                secret_access_key,
            } => SharedCredentialsProvider::new(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                STATIC_PROVIDER_NAME,
            )),
            BaseCredentials::Profile(name) => SharedCredentialsProvider::new(
                ProfileFileCredentialsProvider::builder()
                    .profile_name(name)
                    .build(),
            ),
            BaseCredentials::DefaultChain => SharedCredentialsProvider::new(
                DefaultCredentialsChain::builder()
                    .region(region.clone())
                    .build()
                    .await,
            ),
        };

        let Some(role) = self.role else {
            return base;
        };

        debug!(
            role_arn = %role.role_arn,
            session_name = %role.session_name,
            "Assuming role for token generation"
        );

        let mut builder = AssumeRoleProvider::builder(role.role_arn)
            .session_name(role.session_name)
            .region(region.clone());
        if let Some(external_id) = role.external_id {
            builder = builder.external_id(external_id);
        }

        SharedCredentialsProvider::new(builder.build_from_provider(base).await)
    }
}

/// Generate a unique role session name.
pub fn generate_session_name() -> String {
    format!("{}{}", ROLE_SESSION_NAME_PREFIX, Uuid::new_v4())
}
