//! Cloud platform property naming.
//!
//! TeamCity's Amazon and Azure cloud plugins store the same concepts under
//! different property names, and the Azure plugin rewrites image references
//! on save. Every call site asks [`CloudPlatform`] instead of branching on the
//! raw `cloud-code` string.

use std::fmt;

/// Resource-identifier path segment that precedes the resource group name.
const RESOURCE_GROUPS_SEGMENT: &str = "resourceGroups";

/// Cloud backend of a cloud profile, derived from its `cloud-code` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudPlatform {
    /// Amazon EC2 (`cloud-code = amazon`).
    Amazon,
    /// Azure Resource Manager (`cloud-code = arm`).
    AzureArm,
}

impl CloudPlatform {
    /// Resolve a `cloud-code` value. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "amazon" => Some(Self::Amazon),
            "arm" => Some(Self::AzureArm),
            _ => None,
        }
    }

    /// The `cloud-code` value TeamCity uses for this platform.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Amazon => "amazon",
            Self::AzureArm => "arm",
        }
    }

    /// Cloud image property holding the agent name prefix.
    pub const fn agent_prefix_property(self) -> &'static str {
        match self {
            Self::Amazon => "image-name-prefix",
            Self::AzureArm => "source-id",
        }
    }

    /// Cloud image property holding the machine image reference.
    pub const fn image_reference_property(self) -> &'static str {
        match self {
            Self::Amazon => "amazon-id",
            Self::AzureArm => "imageId",
        }
    }

    /// Rewrite a requested image reference into the form the server stores.
    ///
    /// The Azure plugin persists the resource group name upper-cased no matter
    /// how it was submitted, so the target has to be compared in that form or
    /// every run would detect a change. Amazon AMI ids pass through untouched.
    pub fn normalize_target_image(self, image: &str) -> String {
        match self {
            Self::Amazon => image.to_string(),
            Self::AzureArm => upper_case_resource_group(image),
        }
    }
}

impl fmt::Display for CloudPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Upper-case the segment after `resourceGroups`, leaving every other byte as is.
fn upper_case_resource_group(image: &str) -> String {
    let mut segments: Vec<String> = image.split('/').map(str::to_owned).collect();
    let group_index = segments
        .iter()
        .position(|segment| segment.eq_ignore_ascii_case(RESOURCE_GROUPS_SEGMENT))
        .map(|index| index + 1);

    if let Some(group) = group_index.and_then(|index| segments.get_mut(index)) {
        *group = group.to_uppercase();
    }

    segments.join("/")
}
