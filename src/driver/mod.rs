//! Driver contract, delegate registry and the IAM auth wrapper.
//!
//! # Architecture
//!
//! - [`Driver`] - Capability contract shared by the wrapper and its delegates
//! - [`DriverRegistry`] - Identifier to constructor mapping for delegate drivers
//! - [`DriverManager`] - Process-wide list of registered drivers
//! - [`IamAuthDriver`] - Wrapper injecting IAM tokens before delegating
//!
//! # Example
//!
//! ```no_run
//! use iam_auth_driver::connection::Properties;
//! use iam_auth_driver::driver::{self, DriverRegistry};
//! # use std::sync::Arc;
//!
//! # async fn example(registry: DriverRegistry) -> Result<(), Box<dyn std::error::Error>> {
//! // Register the wrapper flavors once at startup
//! let manager = driver::initialise(Arc::new(registry));
//!
//! let mut properties = Properties::new();
//! properties.insert("user".to_string(), "app_user".to_string());
//!
//! let connection = manager
//!     .connect("jdbc:iampostgresql://db.example:5432/app", &mut properties)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod manager;
pub mod presets;
pub mod registry;
pub mod wrapper;

pub use manager::DriverManager;
pub use presets::{TokenFailurePolicy, WrapperConfig};
pub use registry::{DriverConstructor, DriverRegistry};
pub use wrapper::{DriverState, IamAuthDriver};

use crate::connection::Properties;
use crate::error::DriverError;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Version reported while no delegate is bound.
pub const UNKNOWN_VERSION: i32 = -1;

/// An open connection produced by a driver.
pub trait Connection: Send + Sync + fmt::Debug {
    /// Access the concrete connection type.
    fn as_any(&self) -> &dyn Any;
}

/// Description of a connection property understood by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub choices: Vec<String>,
}

impl PropertyInfo {
    /// Create an optional property with no value or choices.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            description: None,
            required: false,
            choices: Vec::new(),
        }
    }
}

/// Capabilities every database driver exposes.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Whether this driver can open connections for `url`.
    fn accepts_url(&self, url: &str) -> Result<bool, DriverError>;

    /// Open a connection.
    ///
    /// Returns `Ok(None)` when the driver does not handle `url`. Drivers may
    /// modify `properties`.
    async fn connect(
        &self,
        url: &str,
        properties: &mut Properties,
    ) -> Result<Option<Box<dyn Connection>>, DriverError>;

    /// Properties the driver understands for `url`.
    fn property_info(
        &self,
        url: &str,
        properties: &Properties,
    ) -> Result<Vec<PropertyInfo>, DriverError>;

    fn major_version(&self) -> i32;

    fn minor_version(&self) -> i32;

    /// Whether the driver passes the compliance suite of its API.
    fn is_compliant(&self) -> bool;

    /// Name of the logging target the driver writes to.
    fn parent_logger(&self) -> Result<String, DriverError>;
}

/// Register the IAM auth wrapper flavors with the process-wide manager.
///
/// Registers the generic wrapper, the MySQL wrapper (not accepting plain
/// `mysql` URLs, so the real MySQL driver keeps them) and the PostgreSQL
/// wrapper. Only the first call registers anything; later calls return the
/// same manager.
pub fn initialise(registry: Arc<DriverRegistry>) -> Arc<DriverManager> {
    static REGISTERED: OnceLock<()> = OnceLock::new();

    let manager = DriverManager::global();
    REGISTERED.get_or_init(|| {
        let flavors = [
            WrapperConfig::generic(),
            WrapperConfig::mysql().with_accept_delegate_urls(false),
            WrapperConfig::postgresql(),
        ];
        for config in flavors {
            let driver = IamAuthDriver::new(config, Arc::clone(&registry))
                .with_driver_manager(Arc::clone(&manager));
            manager.register(Arc::new(driver));
        }
    });
    manager
}
