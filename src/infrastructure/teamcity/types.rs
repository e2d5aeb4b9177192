//! Wire types for the TeamCity REST JSON representations.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::errors::ApiError;
use crate::domain::models::{Agent, AgentRef, ProjectFeature, PropertyBag};

/// `GET /app/rest/projects/id:_Root/projectFeatures`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFeaturesResponse {
    #[serde(default, rename = "projectFeature")]
    pub project_feature: Vec<ProjectFeatureDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectFeatureDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: PropertiesDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertiesDto {
    #[serde(default)]
    pub property: Vec<PropertyDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDto {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// `GET /app/rest/agents?locator=authorized:true`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentsResponse {
    #[serde(default)]
    pub agent: Vec<AgentRefDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentRefDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub href: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET <agent.href>`
#[derive(Debug, Clone, Deserialize)]
pub struct AgentDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub href: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: PropertiesDto,
}

/// TeamCity renders numeric ids as JSON numbers; everything here treats them as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

impl From<PropertiesDto> for PropertyBag {
    fn from(dto: PropertiesDto) -> Self {
        dto.property
            .into_iter()
            .map(|property| (property.name, property.value))
            .collect()
    }
}

impl From<ProjectFeatureDto> for ProjectFeature {
    fn from(dto: ProjectFeatureDto) -> Self {
        Self::new(dto.id, dto.kind, dto.properties.into())
    }
}

impl From<AgentRefDto> for AgentRef {
    fn from(dto: AgentRefDto) -> Self {
        Self {
            id: dto.id,
            href: dto.href,
            name: dto.name,
        }
    }
}

impl From<AgentDto> for Agent {
    fn from(dto: AgentDto) -> Self {
        Self {
            id: dto.id,
            href: dto.href,
            name: dto.name,
            properties: dto.properties.into(),
        }
    }
}

/// Decode a project features listing.
pub fn decode_project_features(value: Value) -> Result<Vec<ProjectFeature>, ApiError> {
    let response: ProjectFeaturesResponse = serde_json::from_value(value)?;
    Ok(response
        .project_feature
        .into_iter()
        .map(ProjectFeature::from)
        .collect())
}

/// Decode an agent listing.
pub fn decode_agent_refs(value: Value) -> Result<Vec<AgentRef>, ApiError> {
    let response: AgentsResponse = serde_json::from_value(value)?;
    Ok(response.agent.into_iter().map(AgentRef::from).collect())
}

/// Decode a single agent's detail.
pub fn decode_agent(value: Value) -> Result<Agent, ApiError> {
    let dto: AgentDto = serde_json::from_value(value)?;
    Ok(dto.into())
}
