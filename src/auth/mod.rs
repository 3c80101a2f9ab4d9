//! AWS identity: credential selection, region resolution and token minting.
//!
//! The three steps run once per connection attempt and nothing here is
//! cached. Both the region lookup and the token generator sit behind traits so
//! the wrapper can be exercised without AWS access.

pub mod credentials;
pub mod region;
pub mod token;

pub use credentials::{BaseCredentials, CredentialSource, RoleAssumption};
pub use region::{resolve_region, AwsRegionLookup, RegionLookup};
pub use token::{AuthToken, RdsTokenGenerator, TokenGenerator, TokenRequest};
