//! Connection URL parsing and property resolution.
//!
//! # Example
//!
//! ```
//! use iam_auth_driver::connection::{ParsedUrl, Properties, PropertyLookup, ResolvedConfig};
//!
//! let parsed = ParsedUrl::parse("jdbc:iammysql://db.example:3306/app?awsRegion=us-east-1").unwrap();
//!
//! let mut properties = Properties::new();
//! properties.insert("user".to_string(), "svc".to_string());
//! properties.insert("awsRegion".to_string(), "eu-west-1".to_string());
//!
//! let config = ResolvedConfig::resolve(
//!     &PropertyLookup::new(&properties, parsed.query()),
//!     "user",
//!     "password",
//! );
//! assert_eq!(config.username.as_deref(), Some("svc"));
//! // URL parameters win over caller-supplied properties
//! assert_eq!(config.region.as_deref(), Some("us-east-1"));
//! ```

pub mod params;
pub mod properties;

pub use params::{parse_query_string, ParsedUrl, URL_PREFIX};
pub use properties::{Properties, PropertyLookup, ResolvedConfig};
