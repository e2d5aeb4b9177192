//! CLI type definitions
//!
//! This module contains the clap structure that defines the CLI interface.

use clap::Parser;
use std::path::PathBuf;

use crate::domain::errors::{MigrationError, MigrationResult};
use crate::domain::models::MigrationRequest;

#[derive(Parser, Debug, Clone)]
#[command(name = "tc-image-migrate")]
#[command(
    about = "Point a TeamCity cloud image at a new machine image and disable agents still on the old one",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// TeamCity access token
    #[arg(long, env = "TEAMCITY_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// The url of the TeamCity server, eg "http://teamcity.example.com"
    #[arg(long, env = "TEAMCITY_SERVER")]
    pub server: Option<String>,

    /// The AMI id (for AWS), or the image resource id / VHD url (for Azure)
    #[arg(long, env = "TEAMCITY_IMAGE")]
    pub image: Option<String>,

    /// The name of the TeamCity cloud profile to modify
    #[arg(long = "cloudprofile", env = "TEAMCITY_CLOUD_PROFILE")]
    pub cloud_profile: Option<String>,

    /// The agent prefix of the cloud profile image that should be updated
    #[arg(long = "agentprefix", env = "TEAMCITY_AGENT_PREFIX")]
    pub agent_prefix: Option<String>,

    /// Configuration file (defaults to ./tc-image-migrate.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Resolve and report without changing anything on the server
    #[arg(long)]
    pub dry_run: bool,

    /// Output in JSON format
    #[arg(short, long)]
    pub json: bool,
}

/// Required inputs after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedArgs {
    pub server: String,
    pub token: String,
    pub request: MigrationRequest,
}

/// Blank counts as missing; anything else is passed through verbatim.
fn required(value: Option<&String>, name: &'static str) -> MigrationResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(MigrationError::MissingArgument(name)),
    }
}

/// Exit code for a command line clap rejected. Help and version output is a success.
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

impl Cli {
    /// Check that every required option is present and non-empty.
    ///
    /// Runs before any network I/O.
    pub fn validate(&self) -> MigrationResult<ValidatedArgs> {
        let token = required(self.token.as_ref(), "token")?;
        let server = required(self.server.as_ref(), "server")?;
        let image = required(self.image.as_ref(), "image")?;
        let cloud_profile = required(self.cloud_profile.as_ref(), "cloudprofile")?;
        let agent_prefix = required(self.agent_prefix.as_ref(), "agentprefix")?;

        Ok(ValidatedArgs {
            server,
            token,
            request: MigrationRequest::new(image, cloud_profile, agent_prefix),
        })
    }
}
