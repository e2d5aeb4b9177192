//! Typed view over TeamCity project features.
//!
//! The server exposes cloud profiles and cloud images as entries in one flat,
//! loosely typed `projectFeature` collection. [`FeatureStore`] indexes that
//! snapshot by `(type, id)` and hands out [`CloudProfile`] and [`CloudImage`]
//! values; nothing outside this module touches the raw property bags.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use super::platform::CloudPlatform;
use crate::domain::errors::{MigrationError, MigrationResult};

/// Feature type of a cloud profile record.
pub const CLOUD_PROFILE_TYPE: &str = "CloudProfile";
/// Feature type of a cloud image record.
pub const CLOUD_IMAGE_TYPE: &str = "CloudImage";

const NAME_PROPERTY: &str = "name";
const CLOUD_CODE_PROPERTY: &str = "cloud-code";
const PROFILE_ID_PROPERTY: &str = "profileId";

/// Name/value properties of a feature or agent. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag(BTreeMap<String, String>);

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// One configuration record from the `projectFeatures` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFeature {
    pub id: String,
    pub kind: String,
    properties: PropertyBag,
}

impl ProjectFeature {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, properties: PropertyBag) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            properties,
        }
    }

    /// Read a required property.
    pub fn property(&self, name: &str) -> MigrationResult<&str> {
        self.properties
            .get(name)
            .ok_or_else(|| MigrationError::MissingProperty {
                feature_id: self.id.clone(),
                property: name.to_string(),
            })
    }

    /// Read a property that may legitimately be absent.
    pub fn optional_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name)
    }

    /// Change a property locally. The server is not contacted.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.set(name, value);
    }

    fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// A `CloudProfile` feature with its platform resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudProfile {
    feature: ProjectFeature,
    name: String,
    platform: CloudPlatform,
}

impl CloudProfile {
    fn from_feature(feature: ProjectFeature) -> MigrationResult<Self> {
        let name = feature.property(NAME_PROPERTY)?.to_string();
        let cloud_code = feature.property(CLOUD_CODE_PROPERTY)?;
        let platform = CloudPlatform::from_code(cloud_code).ok_or_else(|| {
            MigrationError::UnsupportedPlatform {
                profile: name.clone(),
                cloud_code: cloud_code.to_string(),
            }
        })?;

        Ok(Self {
            feature,
            name,
            platform,
        })
    }

    pub fn id(&self) -> &str {
        &self.feature.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn platform(&self) -> CloudPlatform {
        self.platform
    }
}

/// A `CloudImage` feature owned by a cloud profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudImage {
    feature: ProjectFeature,
    platform: CloudPlatform,
}

impl CloudImage {
    pub fn id(&self) -> &str {
        &self.feature.id
    }

    pub fn profile_id(&self) -> MigrationResult<&str> {
        self.feature.property(PROFILE_ID_PROPERTY)
    }

    /// Agent name prefix this image provisions.
    pub fn agent_prefix(&self) -> MigrationResult<&str> {
        self.feature.property(self.platform.agent_prefix_property())
    }

    /// Machine image reference currently stored on the server.
    pub fn image_reference(&self) -> MigrationResult<&str> {
        self.feature
            .property(self.platform.image_reference_property())
    }

    /// Record the image reference the server now holds.
    pub fn set_image_reference(&mut self, image: impl Into<String>) {
        self.feature
            .set_property(self.platform.image_reference_property(), image);
    }
}

/// Immutable snapshot of the root project's features, indexed by `(type, id)`.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    features: Vec<ProjectFeature>,
    index: HashMap<(String, String), usize>,
}

impl FeatureStore {
    pub fn new(features: Vec<ProjectFeature>) -> Self {
        let index = features
            .iter()
            .enumerate()
            .map(|(position, feature)| ((feature.kind.clone(), feature.id.clone()), position))
            .collect();
        Self { features, index }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Look up a feature by type and id.
    pub fn get(&self, kind: &str, id: &str) -> Option<&ProjectFeature> {
        self.index
            .get(&(kind.to_string(), id.to_string()))
            .map(|&position| &self.features[position])
    }

    fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ProjectFeature> + 'a {
        self.features.iter().filter(move |feature| feature.is(kind))
    }

    /// Find the cloud profile whose `name` property equals `name` exactly.
    ///
    /// The first match wins; extra matches are reported as a warning.
    pub fn find_cloud_profile(&self, name: &str) -> MigrationResult<CloudProfile> {
        let matches: Vec<&ProjectFeature> = self
            .of_kind(CLOUD_PROFILE_TYPE)
            .filter(|feature| feature.optional_property(NAME_PROPERTY) == Some(name))
            .collect();

        let Some(first) = matches.first() else {
            return Err(MigrationError::CloudProfileNotFound(name.to_string()));
        };

        if matches.len() > 1 {
            let ids: Vec<&str> = matches.iter().map(|feature| feature.id.as_str()).collect();
            warn!(
                profile = %name,
                candidates = ?ids,
                chosen = %first.id,
                "multiple cloud profiles share this name, using the first"
            );
        }

        CloudProfile::from_feature((*first).clone())
    }

    /// Find the image of `profile` whose agent prefix equals `agent_prefix`.
    pub fn find_cloud_image(
        &self,
        profile: &CloudProfile,
        agent_prefix: &str,
    ) -> MigrationResult<CloudImage> {
        let prefix_property = profile.platform().agent_prefix_property();
        let matches: Vec<&ProjectFeature> = self
            .of_kind(CLOUD_IMAGE_TYPE)
            .filter(|feature| feature.optional_property(PROFILE_ID_PROPERTY) == Some(profile.id()))
            .filter(|feature| feature.optional_property(prefix_property) == Some(agent_prefix))
            .collect();

        let Some(first) = matches.first() else {
            return Err(MigrationError::CloudImageNotFound {
                profile: profile.name().to_string(),
                agent_prefix: agent_prefix.to_string(),
            });
        };

        if matches.len() > 1 {
            let ids: Vec<&str> = matches.iter().map(|feature| feature.id.as_str()).collect();
            warn!(
                profile = %profile.name(),
                agent_prefix = %agent_prefix,
                candidates = ?ids,
                chosen = %first.id,
                "multiple cloud images share this agent prefix, using the first"
            );
        }

        Ok(CloudImage {
            feature: (*first).clone(),
            platform: profile.platform(),
        })
    }
}
