//! # iam-auth-driver
//!
//! Database driver wrapper that authenticates connections with AWS RDS IAM
//! auth tokens.
//!
//! The wrapper sits in front of a real database driver. It accepts URLs in its
//! own scheme (`jdbc:iammysql://`, `jdbc:iampostgresql://`), generates a
//! short-lived token for the target host, port and user, writes it into the
//! password property and forwards the request to the delegate driver with the
//! scheme rewritten (`jdbc:mysql://`, `jdbc:postgresql://`).
//!
//! ## Example
//!
//! ```no_run
//! # use iam_auth_driver::*;
//! # use std::sync::Arc;
//! # async fn example(mysql: Arc<dyn Driver>) -> Result<(), Box<dyn std::error::Error>> {
//! // Make the real driver available under its identifier
//! let registry = DriverRegistry::new();
//! registry.register("mysql", move || Ok(Arc::clone(&mysql)));
//!
//! // Register the wrapper flavors
//! let manager = initialise(Arc::new(registry));
//!
//! let mut properties = Properties::new();
//! properties.insert("user".to_string(), "app_user".to_string());
//!
//! // Connect; the password property now holds a fresh token
//! let connection = manager
//!     .connect(
//!         "jdbc:iammysql://db.example:3306/app?awsRegion=us-east-1",
//!         &mut properties,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod auth;
pub mod connection;
pub mod driver;
pub mod error;

// Re-export public API
pub use auth::{AuthToken, TokenGenerator};
pub use connection::{ParsedUrl, Properties};
pub use driver::{
    initialise, Connection, Driver, DriverManager, DriverRegistry, IamAuthDriver,
    TokenFailurePolicy, WrapperConfig,
};
pub use error::{ConfigurationError, DriverError, LoadError, SqlState, TokenError};
