//! Domain errors for the image migration workflow.

use thiserror::Error;

/// Failure of a single REST call against the TeamCity server.
///
/// Kept independent of the HTTP library so the services can be exercised
/// against any [`TeamCityApi`](crate::domain::ports::TeamCityApi) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a status outside the 2xx range.
    #[error("server responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection refused, DNS failure, TLS failure and the like.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The body could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns true for failures that never reached an HTTP status line.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }

    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Every way a migration run can terminate unsuccessfully.
///
/// Each variant maps to a distinct process exit code through
/// [`MigrationError::exit_code`], so operators can tell a mistyped profile
/// name apart from a mistyped agent prefix straight from CI logs.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Option \"{0}\" was not supplied.")]
    MissingArgument(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to disable agent {agent_id}: {source}")]
    DisableAgent {
        agent_id: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to list project features: {0}")]
    ListFeatures(#[source] ApiError),

    #[error("Required property '{property}' is missing on feature '{feature_id}'")]
    MissingProperty { feature_id: String, property: String },

    #[error("Cloud profile '{profile}' uses unsupported cloud-code '{cloud_code}'")]
    UnsupportedPlatform { profile: String, cloud_code: String },

    #[error("Unable to find cloud profile '{0}'")]
    CloudProfileNotFound(String),

    #[error("Unable to find cloud image with agent prefix '{agent_prefix}' in cloud profile '{profile}'")]
    CloudImageNotFound { profile: String, agent_prefix: String },

    #[error("Failed to update cloud image: {0}")]
    UpdateImage(#[source] ApiError),

    #[error("Failed to list authorized agents: {0}")]
    ListAgents(#[source] ApiError),
}

impl MigrationError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingArgument(_) | Self::InvalidConfiguration(_) => 1,
            Self::DisableAgent { source, .. } => {
                if source.is_transport() {
                    3
                } else {
                    2
                }
            }
            Self::ListFeatures(source) => {
                if source.is_transport() {
                    11
                } else {
                    4
                }
            }
            Self::MissingProperty { .. } | Self::UnsupportedPlatform { .. } => 5,
            Self::CloudProfileNotFound(_) => 6,
            Self::CloudImageNotFound { .. } => 7,
            Self::UpdateImage(source) => match source {
                ApiError::Timeout => 10,
                ApiError::Transport(_) => 9,
                ApiError::Status { .. } | ApiError::Decode(_) => 8,
            },
            Self::ListAgents(_) => 12,
        }
    }
}

pub type MigrationResult<T> = Result<T, MigrationError>;
