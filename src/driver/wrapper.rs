//! IAM auth wrapper driver.
//!
//! The wrapper accepts connection URLs in its own scheme (for example
//! `jdbc:iammysql://`), mints an RDS IAM auth token, writes it into the
//! password property and hands the request to a delegate driver with the URL
//! rewritten to the delegate's scheme (`jdbc:mysql://`).

use crate::auth::{
    resolve_region, AuthToken, AwsRegionLookup, CredentialSource, RdsTokenGenerator,
    RegionLookup, TokenGenerator, TokenRequest,
};
use crate::connection::params::rewrite_scheme;
use crate::connection::{ParsedUrl, Properties, PropertyLookup, ResolvedConfig};
use crate::driver::{
    Connection, Driver, DriverManager, DriverRegistry, PropertyInfo, TokenFailurePolicy,
    WrapperConfig, UNKNOWN_VERSION,
};
use crate::error::{ConfigurationError, DriverError, TokenError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Whether a wrapper has bound its delegate driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No delegate resolved yet
    Unbound,
    /// Delegate resolved; final for the wrapper's lifetime
    Bound,
}

/// Driver wrapper authenticating connections with RDS IAM tokens.
///
/// The delegate driver is resolved lazily on first use and kept for the
/// lifetime of the wrapper. A new token is generated on every connection
/// attempt.
///
/// # Example
///
/// ```no_run
/// use iam_auth_driver::connection::Properties;
/// use iam_auth_driver::driver::{Driver, DriverRegistry, IamAuthDriver, WrapperConfig};
/// use std::sync::Arc;
///
/// # async fn example(registry: Arc<DriverRegistry>) -> Result<(), Box<dyn std::error::Error>> {
/// let driver = IamAuthDriver::new(WrapperConfig::mysql(), registry);
///
/// let mut properties = Properties::new();
/// properties.insert("user".to_string(), "app_user".to_string());
///
/// let connection = driver
///     .connect("jdbc:iammysql://db.example:3306/app?awsRegion=us-east-1", &mut properties)
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct IamAuthDriver {
    config: WrapperConfig,
    registry: Arc<DriverRegistry>,
    manager: Arc<DriverManager>,
    token_generator: Arc<dyn TokenGenerator>,
    region_lookup: Arc<dyn RegionLookup>,
    delegate: OnceLock<Arc<dyn Driver>>,
    delegate_scheme: OnceLock<String>,
}

impl IamAuthDriver {
    /// Create a wrapper using the AWS SDK for regions and tokens.
    ///
    /// Resolved delegates are registered with [`DriverManager::global`].
    pub fn new(config: WrapperConfig, registry: Arc<DriverRegistry>) -> Self {
        Self {
            config,
            registry,
            manager: DriverManager::global(),
            token_generator: Arc::new(RdsTokenGenerator),
            region_lookup: Arc::new(AwsRegionLookup),
            delegate: OnceLock::new(),
            delegate_scheme: OnceLock::new(),
        }
    }

    /// Register resolved delegates with `manager` instead of the global one.
    pub fn with_driver_manager(mut self, manager: Arc<DriverManager>) -> Self {
        self.manager = manager;
        self
    }

    /// Mint tokens with `generator` instead of the RDS signer.
    pub fn with_token_generator(mut self, generator: Arc<dyn TokenGenerator>) -> Self {
        self.token_generator = generator;
        self
    }

    /// Look up fallback regions with `lookup` instead of the AWS SDK.
    pub fn with_region_lookup(mut self, lookup: Arc<dyn RegionLookup>) -> Self {
        self.region_lookup = lookup;
        self
    }

    /// Static configuration of this wrapper.
    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    /// Whether the delegate driver has been bound yet.
    pub fn state(&self) -> DriverState {
        if self.delegate.get().is_some() {
            DriverState::Bound
        } else {
            DriverState::Unbound
        }
    }

    /// The bound delegate driver, if any.
    pub fn delegate(&self) -> Option<Arc<dyn Driver>> {
        self.delegate.get().cloned()
    }

    /// Generate a token for a connection URL without connecting.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the URL cannot be parsed, host, port or user
    /// are missing, or the token service fails.
    pub async fn generate_auth_token(
        &self,
        url: &str,
        properties: &Properties,
    ) -> Result<AuthToken, TokenError> {
        let parsed = ParsedUrl::parse(url)
            .ok_or_else(|| ConfigurationError::InvalidUrl(url.to_string()))?;
        let config = self.resolve_config(properties, parsed.query());
        self.generate_token(&parsed, &config).await
    }

    fn resolve_config(
        &self,
        properties: &Properties,
        query: &BTreeMap<String, String>,
    ) -> ResolvedConfig {
        ResolvedConfig::resolve(
            &PropertyLookup::new(properties, query),
            &self.config.user_property,
            &self.config.password_property,
        )
    }

    fn is_wrapper_scheme(&self, parsed: &ParsedUrl) -> bool {
        self.config.wrapper_scheme.as_deref() == Some(parsed.scheme())
    }

    /// Resolve the delegate driver, binding it on first success.
    ///
    /// Once bound, later calls return the bound delegate whatever they are
    /// passed.
    fn resolve_delegate(&self, config: &ResolvedConfig) -> Result<Arc<dyn Driver>, DriverError> {
        if let Some(delegate) = self.delegate.get() {
            return Ok(Arc::clone(delegate));
        }

        let identifier = config
            .delegate_driver
            .as_deref()
            .or(self.config.delegate_driver.as_deref())
            .ok_or(ConfigurationError::NoDelegateDriver)?;

        let candidate =
            self.registry
                .instantiate(identifier)
                .map_err(|source| DriverError::DriverLoad {
                    identifier: identifier.to_string(),
                    source,
                })?;

        // Concurrent first callers may each build a candidate; only one is kept
        let delegate = Arc::clone(self.delegate.get_or_init(|| candidate));
        if self.manager.register(Arc::clone(&delegate)) {
            debug!(identifier = %identifier, "Bound delegate driver");
        }
        Ok(delegate)
    }

    /// Resolution for capability probes, where failures are not errors.
    fn probe_delegate(&self, config: &ResolvedConfig) -> Option<Arc<dyn Driver>> {
        match self.resolve_delegate(config) {
            Ok(delegate) => Some(delegate),
            Err(DriverError::Configuration(e)) => {
                debug!(error = %e, "Delegate driver not resolvable yet");
                None
            }
            Err(e) => {
                warn!(error = %e, "Ignoring delegate driver resolution failure");
                None
            }
        }
    }

    fn resolve_delegate_scheme(&self, config: &ResolvedConfig) -> Option<String> {
        if let Some(scheme) = &self.config.delegate_scheme {
            return Some(scheme.clone());
        }
        if let Some(scheme) = self.delegate_scheme.get() {
            return Some(scheme.clone());
        }
        let resolved = config.delegate_scheme.as_ref()?;
        Some(self.delegate_scheme.get_or_init(|| resolved.clone()).clone())
    }

    /// The URL handed to the delegate.
    fn delegate_url(
        &self,
        url: &str,
        parsed: &ParsedUrl,
        config: &ResolvedConfig,
    ) -> Result<String, ConfigurationError> {
        match &self.config.wrapper_scheme {
            Some(wrapper_scheme) if self.is_wrapper_scheme(parsed) => {
                let delegate_scheme = self
                    .resolve_delegate_scheme(config)
                    .ok_or(ConfigurationError::MissingDelegateScheme)?;
                Ok(rewrite_scheme(url, wrapper_scheme, &delegate_scheme))
            }
            _ => Ok(url.to_string()),
        }
    }

    /// Acceptance check against an already merged configuration.
    ///
    /// Delegate resolution is attempted first but never fails the check.
    fn accepts_parsed(
        &self,
        url: &str,
        parsed: &ParsedUrl,
        config: &ResolvedConfig,
    ) -> Result<bool, DriverError> {
        self.probe_delegate(config);

        if self.is_wrapper_scheme(parsed) {
            return Ok(true);
        }

        match self.delegate.get() {
            Some(delegate) if self.config.accept_delegate_urls => delegate.accepts_url(url),
            _ => Ok(false),
        }
    }

    async fn generate_token(
        &self,
        parsed: &ParsedUrl,
        config: &ResolvedConfig,
    ) -> Result<AuthToken, TokenError> {
        let host = parsed.host().ok_or(ConfigurationError::MissingHost)?;
        let port = parsed
            .port()
            .or(self.config.default_port)
            .ok_or(ConfigurationError::MissingPort)?;
        let username =
            config
                .username
                .clone()
                .ok_or_else(|| ConfigurationError::MissingUsername {
                    property: self.config.user_property.clone(),
                })?;
        let region = resolve_region(config, self.region_lookup.as_ref()).await?;

        let request = TokenRequest {
            host: host.to_string(),
            port,
            username,
            region,
            credentials: CredentialSource::resolve(config),
        };
        debug!(
            host = %request.host,
            port = request.port,
            region = %request.region,
            "Requesting IAM auth token"
        );
        self.token_generator.generate(request).await
    }
}

#[async_trait]
impl Driver for IamAuthDriver {
    fn accepts_url(&self, url: &str) -> Result<bool, DriverError> {
        let Some(parsed) = ParsedUrl::parse(url) else {
            return Ok(false);
        };
        let config = self.resolve_config(&Properties::new(), parsed.query());
        self.accepts_parsed(url, &parsed, &config)
    }

    async fn connect(
        &self,
        url: &str,
        properties: &mut Properties,
    ) -> Result<Option<Box<dyn Connection>>, DriverError> {
        let Some(parsed) = ParsedUrl::parse(url) else {
            return Ok(None);
        };
        let config = self.resolve_config(properties, parsed.query());

        if !self.accepts_parsed(url, &parsed, &config)? {
            return Ok(None);
        }

        let delegate = self.resolve_delegate(&config)?;
        let delegate_url = self.delegate_url(url, &parsed, &config)?;

        match self.generate_token(&parsed, &config).await {
            Ok(token) => {
                properties.insert(config.password_property.clone(), token.into_string());
            }
            Err(e) => match self.config.token_failure_policy {
                TokenFailurePolicy::FailOpen => {
                    warn!(
                        error = %e,
                        "Unable to generate IAM auth token, connecting with the configured password"
                    );
                }
                TokenFailurePolicy::FailClosed => return Err(e.into()),
            },
        }

        delegate.connect(&delegate_url, properties).await
    }

    fn property_info(
        &self,
        url: &str,
        properties: &Properties,
    ) -> Result<Vec<PropertyInfo>, DriverError> {
        let parsed = ParsedUrl::parse(url);
        let config = match &parsed {
            Some(parsed) => self.resolve_config(properties, parsed.query()),
            None => self.resolve_config(properties, &BTreeMap::new()),
        };

        let delegate = self
            .probe_delegate(&config)
            .ok_or(ConfigurationError::NoDelegateDriver)?;

        let delegate_url = match &parsed {
            Some(parsed) => self
                .delegate_url(url, parsed, &config)
                .unwrap_or_else(|_| url.to_string()),
            None => url.to_string(),
        };
        delegate.property_info(&delegate_url, properties)
    }

    fn major_version(&self) -> i32 {
        match self.delegate.get() {
            Some(delegate) => delegate.major_version(),
            None => {
                warn!("Major version requested before a delegate driver was resolved");
                UNKNOWN_VERSION
            }
        }
    }

    fn minor_version(&self) -> i32 {
        match self.delegate.get() {
            Some(delegate) => delegate.minor_version(),
            None => {
                warn!("Minor version requested before a delegate driver was resolved");
                UNKNOWN_VERSION
            }
        }
    }

    fn is_compliant(&self) -> bool {
        match self.delegate.get() {
            Some(delegate) => delegate.is_compliant(),
            None => {
                warn!("Compliance requested before a delegate driver was resolved");
                false
            }
        }
    }

    fn parent_logger(&self) -> Result<String, DriverError> {
        match self.delegate.get() {
            Some(delegate) => delegate.parent_logger(),
            None => Err(DriverError::Unsupported(
                "parent logger is unavailable until a delegate driver is resolved".to_string(),
            )),
        }
    }
}

impl fmt::Debug for IamAuthDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthDriver")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("delegate_scheme", &self.delegate_scheme.get())
            .finish()
    }
}

impl fmt::Display for IamAuthDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IamAuthDriver({} -> {}, {:?})",
            self.config.wrapper_scheme.as_deref().unwrap_or("*"),
            self.config
                .delegate_scheme
                .as_deref()
                .or(self.delegate_scheme.get().map(String::as_str))
                .unwrap_or("?"),
            self.state()
        )
    }
}
