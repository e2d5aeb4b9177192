//! In-memory [`TeamCityApi`] for service unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::errors::ApiError;
use crate::domain::ports::TeamCityApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    pub path: String,
    pub body: String,
    pub content_type: String,
}

/// Serves canned GET responses by path and records every PUT.
#[derive(Default)]
pub struct FakeTeamCity {
    gets: Mutex<HashMap<String, Result<Value, ApiError>>>,
    put_failures: Mutex<HashMap<String, ApiError>>,
    puts: Mutex<Vec<RecordedPut>>,
}

impl FakeTeamCity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(self, path: &str, response: Value) -> Self {
        self.gets
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(response));
        self
    }

    pub fn with_get_error(self, path: &str, error: ApiError) -> Self {
        self.gets
            .lock()
            .unwrap()
            .insert(path.to_string(), Err(error));
        self
    }

    pub fn with_put_error(self, path: &str, error: ApiError) -> Self {
        self.put_failures
            .lock()
            .unwrap()
            .insert(path.to_string(), error);
        self
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TeamCityApi for FakeTeamCity {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.gets
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| {
                Err(ApiError::Status {
                    status: 404,
                    body: format!("no fixture for {path}"),
                })
            })
    }

    async fn put(
        &self,
        path: &str,
        body: String,
        content_type: &str,
    ) -> Result<Option<Value>, ApiError> {
        self.puts.lock().unwrap().push(RecordedPut {
            path: path.to_string(),
            body: body.clone(),
            content_type: content_type.to_string(),
        });

        match self.put_failures.lock().unwrap().get(path) {
            Some(error) => Err(error.clone()),
            None => Ok(Some(Value::String(body))),
        }
    }
}

/// `projectFeatures` listing with one Amazon and one Azure profile.
pub fn project_features(amazon_image: &str, azure_image: &str) -> Value {
    json!({
        "count": 5,
        "projectFeature": [
            {
                "id": "amazon-1",
                "type": "CloudProfile",
                "properties": {"property": [
                    {"name": "name", "value": "AWS-Pool"},
                    {"name": "cloud-code", "value": "amazon"}
                ]}
            },
            {
                "id": "PROJECT_EXT_2",
                "type": "CloudImage",
                "properties": {"property": [
                    {"name": "profileId", "value": "amazon-1"},
                    {"name": "image-name-prefix", "value": "build-"},
                    {"name": "amazon-id", "value": amazon_image}
                ]}
            },
            {
                "id": "arm-3",
                "type": "CloudProfile",
                "properties": {"property": [
                    {"name": "name", "value": "Azure-Pool"},
                    {"name": "cloud-code", "value": "arm"}
                ]}
            },
            {
                "id": "PROJECT_EXT_4",
                "type": "CloudImage",
                "properties": {"property": [
                    {"name": "profileId", "value": "arm-3"},
                    {"name": "source-id", "value": "win-"},
                    {"name": "imageId", "value": azure_image}
                ]}
            },
            {"id": "PROJECT_EXT_5", "type": "VersionedSettings"}
        ]
    })
}

/// Agent detail document reporting `ami`.
pub fn agent_detail(id: u32, ami: Option<&str>) -> Value {
    let properties: Vec<Value> = ami
        .map(|ami| vec![json!({"name": "system.ec2.ami-id", "value": ami})])
        .unwrap_or_default();
    json!({
        "id": id,
        "name": format!("build-{id}"),
        "href": agent_href(id),
        "properties": {"count": properties.len(), "property": properties}
    })
}

pub fn agent_href(id: u32) -> String {
    format!("/app/rest/agents/id:{id}")
}

/// Authorized agent listing for the given ids.
pub fn agent_listing(ids: &[u32]) -> Value {
    let agents: Vec<Value> = ids
        .iter()
        .map(|&id| json!({"id": id, "name": format!("build-{id}"), "href": agent_href(id)}))
        .collect();
    json!({"count": agents.len(), "agent": agents})
}
