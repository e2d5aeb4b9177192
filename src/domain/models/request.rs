/// What the operator asked for: put `image` on the cloud image of
/// `cloud_profile` that provisions agents named `agent_prefix*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    pub image: String,
    pub cloud_profile: String,
    pub agent_prefix: String,
}

impl MigrationRequest {
    pub fn new(
        image: impl Into<String>,
        cloud_profile: impl Into<String>,
        agent_prefix: impl Into<String>,
    ) -> Self {
        Self {
            image: image.into(),
            cloud_profile: cloud_profile.into(),
            agent_prefix: agent_prefix.into(),
        }
    }
}
