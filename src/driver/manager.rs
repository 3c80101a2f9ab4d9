//! Process-wide driver manager.

use crate::connection::Properties;
use crate::driver::{Connection, Driver};
use crate::error::{ConfigurationError, DriverError};
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, warn};

/// Ordered list of registered drivers.
///
/// Connection requests are offered to drivers in registration order.
#[derive(Default)]
pub struct DriverManager {
    drivers: RwLock<Vec<Arc<dyn Driver>>>,
}

impl DriverManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide manager.
    pub fn global() -> Arc<DriverManager> {
        static GLOBAL: OnceLock<Arc<DriverManager>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(DriverManager::new())))
    }

    /// Register a driver.
    ///
    /// Returns `false` if this exact driver instance is already registered.
    pub fn register(&self, driver: Arc<dyn Driver>) -> bool {
        let mut drivers = self.drivers.write().unwrap_or_else(PoisonError::into_inner);
        if drivers.iter().any(|existing| same_driver(existing, &driver)) {
            return false;
        }
        debug!(registered = drivers.len() + 1, "Registering driver");
        drivers.push(driver);
        true
    }

    /// Remove a driver. Returns `false` if it was not registered.
    pub fn deregister(&self, driver: &Arc<dyn Driver>) -> bool {
        let mut drivers = self.drivers.write().unwrap_or_else(PoisonError::into_inner);
        let before = drivers.len();
        drivers.retain(|existing| !same_driver(existing, driver));
        drivers.len() != before
    }

    /// Whether this exact driver instance is registered.
    pub fn is_registered(&self, driver: &Arc<dyn Driver>) -> bool {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|existing| same_driver(existing, driver))
    }

    /// Snapshot of the registered drivers.
    pub fn drivers(&self) -> Vec<Arc<dyn Driver>> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// First registered driver accepting `url`.
    ///
    /// Drivers that fail the acceptance check are skipped.
    pub fn driver_for(&self, url: &str) -> Option<Arc<dyn Driver>> {
        self.drivers().into_iter().find(|driver| match driver.accepts_url(url) {
            Ok(accepted) => accepted,
            Err(e) => {
                debug!(error = %e, "Driver failed URL acceptance check");
                false
            }
        })
    }

    /// Open a connection with the first driver that produces one.
    ///
    /// # Errors
    ///
    /// Returns the first driver error if no driver connected, or
    /// `ConfigurationError::InvalidUrl` if no driver handles the URL at all.
    pub async fn connect(
        &self,
        url: &str,
        properties: &mut Properties,
    ) -> Result<Box<dyn Connection>, DriverError> {
        let mut first_error = None;

        for driver in self.drivers() {
            match driver.connect(url, properties).await {
                Ok(Some(connection)) => return Ok(connection),
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "Driver failed to connect");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        Err(first_error.unwrap_or_else(|| {
            ConfigurationError::InvalidUrl(format!("no suitable driver found for {}", url)).into()
        }))
    }
}

impl fmt::Debug for DriverManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverManager")
            .field("drivers", &self.drivers().len())
            .finish()
    }
}

fn same_driver(a: &Arc<dyn Driver>, b: &Arc<dyn Driver>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
