//! Common test utilities for iam-auth-driver integration tests.
//!
//! The tests run fully in process. Delegate drivers are recording fakes and
//! token generation goes through [`FixedTokenGenerator`] or
//! [`FailingTokenGenerator`], so no AWS account or database is needed.
//!
//! # Configuration
//!
//! | Default Constant | Value                  |
//! |------------------|------------------------|
//! | `TEST_HOST`      | "db.example"           |
//! | `TEST_USER`      | "svc"                  |
//! | `TEST_REGION`    | "us-east-1"            |
//! | `TEST_TOKEN`     | "generated-iam-token"  |

#![allow(dead_code)]

use async_trait::async_trait;
use iam_auth_driver::auth::{AuthToken, RegionLookup, TokenGenerator, TokenRequest};
use iam_auth_driver::driver::{Connection, Driver, DriverManager, PropertyInfo};
use iam_auth_driver::{
    DriverError, DriverRegistry, IamAuthDriver, Properties, TokenError, WrapperConfig,
};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Constants
// ============================================================================

/// Database host used in test URLs.
pub const TEST_HOST: &str = "db.example";

/// Database user set in the `user` property.
pub const TEST_USER: &str = "svc";

/// Region passed through the `awsRegion` query parameter.
pub const TEST_REGION: &str = "us-east-1";

/// Token returned by [`FixedTokenGenerator`].
pub const TEST_TOKEN: &str = "generated-iam-token";

// ============================================================================
// Recording Delegate Driver
// ============================================================================

/// Connection returned by [`RecordingDriver`], capturing what it was given.
#[derive(Debug, Clone)]
pub struct RecordedConnection {
    pub driver: &'static str,
    pub url: String,
    pub properties: Properties,
}

impl Connection for RecordedConnection {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Delegate driver accepting `jdbc:<scheme>:` URLs.
#[derive(Debug)]
pub struct RecordingDriver {
    pub scheme: &'static str,
    pub connects: Mutex<Vec<RecordedConnection>>,
}

impl RecordingDriver {
    pub fn new(scheme: &'static str) -> Self {
        Self {
            scheme,
            connects: Mutex::new(Vec::new()),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    fn accepts_url(&self, url: &str) -> Result<bool, DriverError> {
        Ok(url.starts_with(&format!("jdbc:{}:", self.scheme)))
    }

    async fn connect(
        &self,
        url: &str,
        properties: &mut Properties,
    ) -> Result<Option<Box<dyn Connection>>, DriverError> {
        if !self.accepts_url(url)? {
            return Ok(None);
        }
        let connection = RecordedConnection {
            driver: self.scheme,
            url: url.to_string(),
            properties: properties.clone(),
        };
        self.connects.lock().unwrap().push(connection.clone());
        Ok(Some(Box::new(connection)))
    }

    fn property_info(
        &self,
        url: &str,
        _properties: &Properties,
    ) -> Result<Vec<PropertyInfo>, DriverError> {
        Ok(vec![PropertyInfo {
            value: Some(url.to_string()),
            required: true,
            ..PropertyInfo::new("url")
        }])
    }

    fn major_version(&self) -> i32 {
        9
    }

    fn minor_version(&self) -> i32 {
        1
    }

    fn is_compliant(&self) -> bool {
        true
    }

    fn parent_logger(&self) -> Result<String, DriverError> {
        Ok(format!("{}_driver", self.scheme))
    }
}

/// Downcast a connection produced by a [`RecordingDriver`].
pub fn recorded(connection: &dyn Connection) -> &RecordedConnection {
    connection
        .as_any()
        .downcast_ref::<RecordedConnection>()
        .expect("connection was not produced by a RecordingDriver")
}

// ============================================================================
// Token Generators and Region Lookups
// ============================================================================

/// Generator returning [`TEST_TOKEN`] and remembering each request.
#[derive(Debug, Default)]
pub struct FixedTokenGenerator {
    pub requests: Mutex<Vec<TokenRequest>>,
}

#[async_trait]
impl TokenGenerator for FixedTokenGenerator {
    async fn generate(&self, request: TokenRequest) -> Result<AuthToken, TokenError> {
        self.requests.lock().unwrap().push(request);
        Ok(AuthToken::new(TEST_TOKEN))
    }
}

/// Generator failing every request as if credentials had expired.
#[derive(Debug, Default)]
pub struct FailingTokenGenerator {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl TokenGenerator for FailingTokenGenerator {
    async fn generate(&self, _request: TokenRequest) -> Result<AuthToken, TokenError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TokenError::Credentials("security token expired".to_string()))
    }
}

/// Region lookup with nothing configured in the environment.
#[derive(Debug, Default)]
pub struct EmptyRegionLookup;

#[async_trait]
impl RegionLookup for EmptyRegionLookup {
    async fn profile_region(&self, _profile: &str) -> Option<String> {
        None
    }

    async fn default_region(&self) -> Option<String> {
        None
    }
}

// ============================================================================
// Wrapper Helpers
// ============================================================================

/// Test fixture bundling a wrapper with its collaborators.
pub struct Fixture {
    pub driver: Arc<IamAuthDriver>,
    pub manager: Arc<DriverManager>,
    pub mysql: Arc<RecordingDriver>,
    pub postgresql: Arc<RecordingDriver>,
    pub instantiations: Arc<AtomicUsize>,
}

/// Registry offering shared `mysql` and `postgresql` recording drivers.
pub fn test_registry(
    mysql: &Arc<RecordingDriver>,
    postgresql: &Arc<RecordingDriver>,
    instantiations: &Arc<AtomicUsize>,
) -> Arc<DriverRegistry> {
    let registry = DriverRegistry::new();

    let (driver, counter) = (Arc::clone(mysql), Arc::clone(instantiations));
    registry.register("mysql", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&driver) as Arc<dyn Driver>)
    });

    let (driver, counter) = (Arc::clone(postgresql), Arc::clone(instantiations));
    registry.register("postgresql", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&driver) as Arc<dyn Driver>)
    });

    registry.register("com.example.Broken", || {
        Err("native client library not found".into())
    });

    Arc::new(registry)
}

/// Build a wrapper with its own manager and the given token generator.
pub fn fixture(config: WrapperConfig, generator: Arc<dyn TokenGenerator>) -> Fixture {
    let mysql = Arc::new(RecordingDriver::new("mysql"));
    let postgresql = Arc::new(RecordingDriver::new("postgresql"));
    let instantiations = Arc::new(AtomicUsize::new(0));
    let manager = Arc::new(DriverManager::new());

    let driver = IamAuthDriver::new(config, test_registry(&mysql, &postgresql, &instantiations))
        .with_driver_manager(Arc::clone(&manager))
        .with_token_generator(generator)
        .with_region_lookup(Arc::new(EmptyRegionLookup));

    Fixture {
        driver: Arc::new(driver),
        manager,
        mysql,
        postgresql,
        instantiations,
    }
}

/// Properties carrying only the test user.
pub fn user_properties() -> Properties {
    let mut properties = Properties::new();
    properties.insert("user".to_string(), TEST_USER.to_string());
    properties
}
