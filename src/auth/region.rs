//! AWS region resolution.

use crate::connection::ResolvedConfig;
use crate::error::TokenError;
use async_trait::async_trait;
use aws_config::meta::region::{ProvideRegion, RegionProviderChain};
use aws_config::profile::ProfileFileRegionProvider;
use tracing::debug;

/// Source of region information outside the connection properties.
#[async_trait]
pub trait RegionLookup: Send + Sync {
    /// Region configured for a named profile, if it defines one.
    async fn profile_region(&self, profile: &str) -> Option<String>;

    /// Region from the ambient default provider chain.
    async fn default_region(&self) -> Option<String>;
}

/// [`RegionLookup`] backed by the AWS SDK.
///
/// The default chain reads the environment, the shared config file and
/// instance metadata, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsRegionLookup;

#[async_trait]
impl RegionLookup for AwsRegionLookup {
    async fn profile_region(&self, profile: &str) -> Option<String> {
        ProfileFileRegionProvider::builder()
            .profile_name(profile)
            .build()
            .region()
            .await
            .map(|region| region.to_string())
    }

    async fn default_region(&self) -> Option<String> {
        RegionProviderChain::default_provider()
            .region()
            .await
            .map(|region| region.to_string())
    }
}

/// Resolve the region to sign the token for.
///
/// An explicit region wins, then the profile's region when it has one, then
/// the default chain.
pub async fn resolve_region(
    config: &ResolvedConfig,
    lookup: &dyn RegionLookup,
) -> Result<String, TokenError> {
    if let Some(region) = &config.region {
        return Ok(region.clone());
    }

    if let Some(profile) = &config.profile {
        if let Some(region) = lookup.profile_region(profile).await {
            debug!(profile = %profile, region = %region, "Using region from profile");
            return Ok(region);
        }
    }

    lookup.default_region().await.ok_or(TokenError::NoRegion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        pub Lookup {}

        #[async_trait]
        impl RegionLookup for Lookup {
            async fn profile_region(&self, profile: &str) -> Option<String>;
            async fn default_region(&self) -> Option<String>;
        }
    }

    fn config(region: Option<&str>, profile: Option<&str>) -> ResolvedConfig {
        ResolvedConfig {
            region: region.map(str::to_string),
            profile: profile.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_explicit_region_wins() {
        let mut lookup = MockLookup::new();
        lookup.expect_profile_region().never();
        lookup.expect_default_region().never();

        let region = resolve_region(&config(Some("us-east-1"), Some("dev")), &lookup)
            .await
            .unwrap();
        assert_eq!(region, "us-east-1");
    }

    #[tokio::test]
    async fn test_profile_region_wins_over_default_chain() {
        let mut lookup = MockLookup::new();
        lookup
            .expect_profile_region()
            .with(eq("dev"))
            .times(1)
            .returning(|_| Some("eu-west-1".to_string()));
        lookup.expect_default_region().never();

        let region = resolve_region(&config(None, Some("dev")), &lookup)
            .await
            .unwrap();
        assert_eq!(region, "eu-west-1");
    }

    #[tokio::test]
    async fn test_profile_without_region_falls_back() {
        let mut lookup = MockLookup::new();
        lookup.expect_profile_region().times(1).returning(|_| None);
        lookup
            .expect_default_region()
            .times(1)
            .returning(|| Some("ap-southeast-2".to_string()));

        let region = resolve_region(&config(None, Some("dev")), &lookup)
            .await
            .unwrap();
        assert_eq!(region, "ap-southeast-2");
    }

    #[tokio::test]
    async fn test_default_chain_without_profile() {
        let mut lookup = MockLookup::new();
        lookup.expect_profile_region().never();
        lookup
            .expect_default_region()
            .times(1)
            .returning(|| Some("us-west-2".to_string()));

        let region = resolve_region(&config(None, None), &lookup).await.unwrap();
        assert_eq!(region, "us-west-2");
    }

    #[tokio::test]
    async fn test_no_region_anywhere() {
        let mut lookup = MockLookup::new();
        lookup.expect_profile_region().returning(|_| None);
        lookup.expect_default_region().returning(|| None);

        let result = resolve_region(&config(None, Some("dev")), &lookup).await;
        assert!(matches!(result, Err(TokenError::NoRegion)));
    }
}
