//! Locates the cloud image to migrate and decides whether it needs changing.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::errors::{MigrationError, MigrationResult};
use crate::domain::models::{CloudImage, CloudProfile, FeatureStore, MigrationRequest};
use crate::domain::ports::TeamCityApi;
use crate::infrastructure::teamcity::decode_project_features;

/// Root project features listing; cloud profiles and images live here.
pub const PROJECT_FEATURES_PATH: &str = "/app/rest/projects/id:_Root/projectFeatures";

/// Where the requested image stands relative to what the server has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub cloud_profile: CloudProfile,
    pub cloud_image: CloudImage,
    /// Image reference stored on the server right now.
    pub current_image: String,
    /// Requested image in the form the server would store it.
    pub target_image: String,
    pub needs_update: bool,
}

pub struct MigrationResolver {
    api: Arc<dyn TeamCityApi>,
}

impl MigrationResolver {
    pub fn new(api: Arc<dyn TeamCityApi>) -> Self {
        Self { api }
    }

    /// Fetch the root project's features once.
    pub async fn fetch_features(&self) -> MigrationResult<FeatureStore> {
        let value = self
            .api
            .get_json(PROJECT_FEATURES_PATH)
            .await
            .map_err(MigrationError::ListFeatures)?;
        let features = decode_project_features(value).map_err(MigrationError::ListFeatures)?;
        Ok(FeatureStore::new(features))
    }

    #[instrument(skip(self, request), fields(profile = %request.cloud_profile, agent_prefix = %request.agent_prefix))]
    pub async fn resolve(&self, request: &MigrationRequest) -> MigrationResult<Resolution> {
        let store = self.fetch_features().await?;
        Self::resolve_in(&store, request)
    }

    /// Resolve against an already fetched snapshot.
    pub fn resolve_in(store: &FeatureStore, request: &MigrationRequest) -> MigrationResult<Resolution> {
        let cloud_profile = store.find_cloud_profile(&request.cloud_profile)?;
        let cloud_image = store.find_cloud_image(&cloud_profile, &request.agent_prefix)?;
        let current_image = cloud_image.image_reference()?.to_string();
        let target_image = cloud_profile
            .platform()
            .normalize_target_image(&request.image);
        let needs_update = current_image != target_image;

        info!(
            "For cloud profile '{}', agents with prefix '{}' are currently set to use image '{}'",
            cloud_profile.name(),
            request.agent_prefix,
            current_image
        );

        Ok(Resolution {
            cloud_profile,
            cloud_image,
            current_image,
            target_image,
            needs_update,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ApiError;
    use crate::domain::models::CloudPlatform;
    use crate::services::test_support::{project_features, FakeTeamCity};

    const AZURE_STORED: &str =
        "/subscriptions/s/resourceGroups/IMAGES/providers/Microsoft.Compute/images/win-2024.09";

    fn resolver(fake: FakeTeamCity) -> MigrationResolver {
        MigrationResolver::new(Arc::new(fake))
    }

    fn fake() -> FakeTeamCity {
        FakeTeamCity::new().with_get(
            PROJECT_FEATURES_PATH,
            project_features("ami-111", AZURE_STORED),
        )
    }

    #[tokio::test]
    async fn test_resolve_amazon_change() {
        let request = MigrationRequest::new("ami-222", "AWS-Pool", "build-");
        let resolution = resolver(fake()).resolve(&request).await.unwrap();

        assert_eq!(resolution.cloud_profile.id(), "amazon-1");
        assert_eq!(resolution.cloud_profile.platform(), CloudPlatform::Amazon);
        assert_eq!(resolution.cloud_image.id(), "PROJECT_EXT_2");
        assert_eq!(resolution.current_image, "ami-111");
        assert_eq!(resolution.target_image, "ami-222");
        assert!(resolution.needs_update);
    }

    #[tokio::test]
    async fn test_resolve_amazon_already_current() {
        let request = MigrationRequest::new("ami-111", "AWS-Pool", "build-");
        let resolution = resolver(fake()).resolve(&request).await.unwrap();
        assert!(!resolution.needs_update);
    }

    #[tokio::test]
    async fn test_resolve_azure_compares_normalized_group() {
        let request = MigrationRequest::new(
            "/subscriptions/s/resourceGroups/images/providers/Microsoft.Compute/images/win-2024.09",
            "Azure-Pool",
            "win-",
        );
        let resolution = resolver(fake()).resolve(&request).await.unwrap();
        assert_eq!(resolution.target_image, AZURE_STORED);
        assert!(!resolution.needs_update);
    }

    #[tokio::test]
    async fn test_resolve_azure_change() {
        let request = MigrationRequest::new(
            "/subscriptions/s/resourceGroups/images/providers/Microsoft.Compute/images/win-2024.10",
            "Azure-Pool",
            "win-",
        );
        let resolution = resolver(fake()).resolve(&request).await.unwrap();
        assert_eq!(
            resolution.target_image,
            "/subscriptions/s/resourceGroups/IMAGES/providers/Microsoft.Compute/images/win-2024.10"
        );
        assert!(resolution.needs_update);
    }

    #[tokio::test]
    async fn test_resolve_unknown_profile() {
        let request = MigrationRequest::new("ami-222", "DoesNotExist", "build-");
        let err = resolver(fake()).resolve(&request).await.unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[tokio::test]
    async fn test_resolve_unknown_prefix() {
        let request = MigrationRequest::new("ami-222", "AWS-Pool", "deploy-");
        let err = resolver(fake()).resolve(&request).await.unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[tokio::test]
    async fn test_feature_listing_rejected() {
        let fake = FakeTeamCity::new().with_get_error(
            PROJECT_FEATURES_PATH,
            ApiError::Status {
                status: 401,
                body: "Authentication required".to_string(),
            },
        );
        let request = MigrationRequest::new("ami-222", "AWS-Pool", "build-");
        let err = resolver(fake).resolve(&request).await.unwrap_err();
        assert!(matches!(err, MigrationError::ListFeatures(ApiError::Status { status: 401, .. })));
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_feature_listing_malformed() {
        let fake = FakeTeamCity::new()
            .with_get(PROJECT_FEATURES_PATH, serde_json::json!({"projectFeature": 3}));
        let request = MigrationRequest::new("ami-222", "AWS-Pool", "build-");
        let err = resolver(fake).resolve(&request).await.unwrap_err();
        assert!(matches!(err, MigrationError::ListFeatures(ApiError::Decode(_))));
    }
}
