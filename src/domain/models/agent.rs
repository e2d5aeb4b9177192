use super::feature::PropertyBag;

/// Agent property reporting the AMI an Amazon-backed agent was started from.
pub const AMAZON_AMI_ID_PROPERTY: &str = "system.ec2.ami-id";

/// Entry of the authorized agent listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRef {
    pub id: String,
    /// Server-relative resource locator, e.g. `/app/rest/agents/id:12`.
    pub href: String,
    pub name: Option<String>,
}

/// Full agent detail as fetched from the agent's `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub href: String,
    pub name: Option<String>,
    pub properties: PropertyBag,
}

impl Agent {
    /// Image the agent reports it is running.
    ///
    /// Only the Amazon AMI id is interpreted; Azure agents report nothing here.
    pub fn reported_image(&self) -> Option<&str> {
        self.properties.get(AMAZON_AMI_ID_PROPERTY)
    }

    /// Name for log output, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
