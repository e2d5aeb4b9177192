//! Pushes a new image reference onto a cloud image.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::errors::{MigrationError, MigrationResult};
use crate::domain::models::{CloudImage, CloudProfile};
use crate::domain::ports::{TeamCityApi, CONTENT_TYPE_TEXT};

/// Characters escaped in a path segment. Locator syntax (`,():`) stays literal.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Encode one locator dimension value.
///
/// Values holding locator delimiters are wrapped in parentheses, which the
/// server reads as a single value.
pub fn locator_value(value: &str) -> String {
    let encoded = utf8_percent_encode(value, PATH_SEGMENT).to_string();
    if value.contains([',', '(', ')', ':']) {
        format!("({encoded})")
    } else {
        encoded
    }
}

/// Path of one property of the `CloudImage` feature whose `prefix_property`
/// equals `agent_prefix`.
pub fn cloud_image_property_path(
    prefix_property: &str,
    agent_prefix: &str,
    image_property: &str,
) -> String {
    format!(
        "/app/rest/projects/id:_Root/projectFeatures/type:CloudImage,property(name:{},value:{})/properties/{}",
        locator_value(prefix_property),
        locator_value(agent_prefix),
        utf8_percent_encode(image_property, PATH_SEGMENT)
    )
}

pub struct ImageMutator {
    api: Arc<dyn TeamCityApi>,
}

impl ImageMutator {
    pub fn new(api: Arc<dyn TeamCityApi>) -> Self {
        Self { api }
    }

    /// Issue the single PUT that stores `target_image`, then record it on
    /// `cloud_image`. A failed PUT leaves `cloud_image` unchanged and is fatal.
    #[instrument(skip_all, fields(profile = %cloud_profile.name(), image = %cloud_image.id()))]
    pub async fn apply(
        &self,
        cloud_profile: &CloudProfile,
        cloud_image: &mut CloudImage,
        target_image: &str,
    ) -> MigrationResult<()> {
        let platform = cloud_profile.platform();
        let agent_prefix = cloud_image.agent_prefix()?.to_string();

        let path = cloud_image_property_path(
            platform.agent_prefix_property(),
            &agent_prefix,
            platform.image_reference_property(),
        );

        info!(
            "Updating cloud profile '{}' so that agents with prefix '{}' will use image '{}'",
            cloud_profile.name(),
            agent_prefix,
            target_image
        );

        self.api
            .put(&path, target_image.to_string(), CONTENT_TYPE_TEXT)
            .await
            .map_err(MigrationError::UpdateImage)?;

        cloud_image.set_image_reference(target_image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ApiError;
    use crate::domain::models::{FeatureStore, MigrationRequest};
    use crate::infrastructure::teamcity::decode_project_features;
    use crate::services::migration_resolver::MigrationResolver;
    use crate::services::test_support::{project_features, FakeTeamCity};

    const AMAZON_PATH: &str = "/app/rest/projects/id:_Root/projectFeatures/type:CloudImage,property(name:image-name-prefix,value:build-)/properties/amazon-id";

    fn store() -> FeatureStore {
        let features =
            project_features("ami-111", "/subscriptions/s/resourceGroups/RG/images/a");
        FeatureStore::new(decode_project_features(features).unwrap())
    }

    #[test]
    fn test_property_paths_per_platform() {
        assert_eq!(
            cloud_image_property_path("image-name-prefix", "build-", "amazon-id"),
            AMAZON_PATH
        );
        assert_eq!(
            cloud_image_property_path("source-id", "win-", "imageId"),
            "/app/rest/projects/id:_Root/projectFeatures/type:CloudImage,property(name:source-id,value:win-)/properties/imageId"
        );
    }

    #[tokio::test]
    async fn test_apply_puts_raw_value() {
        let store = store();
        let mut resolution = MigrationResolver::resolve_in(
            &store,
            &MigrationRequest::new("ami-222", "AWS-Pool", "build-"),
        )
        .unwrap();

        let fake = Arc::new(FakeTeamCity::new());
        let mutator = ImageMutator::new(fake.clone());
        mutator
            .apply(&resolution.cloud_profile, &mut resolution.cloud_image, "ami-222")
            .await
            .unwrap();

        let puts = fake.puts();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].path, AMAZON_PATH);
        assert_eq!(puts[0].body, "ami-222");
        assert_eq!(puts[0].content_type, "text/plain");
        assert_eq!(resolution.cloud_image.image_reference().unwrap(), "ami-222");
    }

    #[tokio::test]
    async fn test_apply_failure_maps_to_update_error() {
        let store = store();
        let mut resolution = MigrationResolver::resolve_in(
            &store,
            &MigrationRequest::new("ami-222", "AWS-Pool", "build-"),
        )
        .unwrap();

        let fake = Arc::new(FakeTeamCity::new().with_put_error(AMAZON_PATH, ApiError::Timeout));
        let err = ImageMutator::new(fake)
            .apply(&resolution.cloud_profile, &mut resolution.cloud_image, "ami-222")
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::UpdateImage(ApiError::Timeout)));
        assert_eq!(err.exit_code(), 10);
        assert_eq!(resolution.cloud_image.image_reference().unwrap(), "ami-111");
    }

    #[test]
    fn test_reserved_characters_stay_inside_the_locator() {
        assert_eq!(
            cloud_image_property_path("image-name-prefix", "ci#1", "amazon-id"),
            "/app/rest/projects/id:_Root/projectFeatures/type:CloudImage,property(name:image-name-prefix,value:ci%231)/properties/amazon-id"
        );
        assert_eq!(locator_value("a/b?c d"), "a%2Fb%3Fc%20d");
        assert_eq!(locator_value("pool,a"), "(pool,a)");
    }
}
