use async_trait::async_trait;
use serde_json::Value;

use super::errors::ApiError;

/// Content type of a raw property value body.
pub const CONTENT_TYPE_TEXT: &str = "text/plain";
/// Content type of an XML document body.
pub const CONTENT_TYPE_XML: &str = "application/xml";

/// Authenticated access to the TeamCity REST API.
///
/// Paths are relative to the server root and may carry a query string.
/// Any status outside 2xx is returned as [`ApiError::Status`]; implementations
/// never retry.
#[async_trait]
pub trait TeamCityApi: Send + Sync {
    /// Fetch `path` and decode the body as JSON.
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    /// Replace the resource at `path` with `body`.
    ///
    /// # Returns
    /// * `Ok(None)` when the server answered with an empty body
    /// * `Ok(Some(value))` with the decoded JSON, or the raw text as a JSON
    ///   string when the server answered in plain text
    async fn put(
        &self,
        path: &str,
        body: String,
        content_type: &str,
    ) -> Result<Option<Value>, ApiError>;
}
