//! Delegate driver registry.
//!
//! Delegate drivers are looked up by a string identifier and built by a
//! constructor registered by the application. The set of identifiers is up to
//! the application; the wrapper presets only assume `mysql` and `postgresql`.

use crate::driver::Driver;
use crate::error::{BoxError, LoadError};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Constructor building a fresh delegate driver.
pub type DriverConstructor =
    Arc<dyn Fn() -> Result<Arc<dyn Driver>, BoxError> + Send + Sync + 'static>;

/// Identifier to constructor mapping for delegate drivers.
///
/// # Example
///
/// ```no_run
/// use iam_auth_driver::driver::{Driver, DriverRegistry};
/// use std::sync::Arc;
///
/// # fn example(build_mysql: fn() -> Arc<dyn Driver>) {
/// let registry = DriverRegistry::new();
/// registry.register("mysql", move || Ok(build_mysql()));
/// assert!(registry.contains("mysql"));
/// # }
/// ```
#[derive(Default)]
pub struct DriverRegistry {
    constructors: RwLock<HashMap<String, DriverConstructor>>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor, replacing any previous one for `identifier`.
    pub fn register<F>(&self, identifier: impl Into<String>, constructor: F)
    where
        F: Fn() -> Result<Arc<dyn Driver>, BoxError> + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        debug!(identifier = %identifier, "Registering delegate driver constructor");
        self.constructors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier, Arc::new(constructor));
    }

    /// Whether a constructor is registered for `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(identifier)
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self
            .constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        identifiers.sort();
        identifiers
    }

    /// Build a new driver for `identifier`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::UnknownIdentifier` if nothing is registered and
    /// `LoadError::Instantiation` if the constructor fails.
    pub fn instantiate(&self, identifier: &str) -> Result<Arc<dyn Driver>, LoadError> {
        // Release the lock before running the constructor
        let constructor = self
            .constructors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .cloned()
            .ok_or_else(|| LoadError::UnknownIdentifier(identifier.to_string()))?;

        constructor().map_err(LoadError::Instantiation)
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}
