//! tc-image-migrate - TeamCity cloud image migration
//!
//! Points one cloud image of a TeamCity cloud profile at a new machine image
//! and disables every authorized agent still running the image it replaced.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): cloud profile and image models, platform rules, errors
//! - **Service Layer** (`services`): resolve, mutate, sweep, and the workflow that sequences them
//! - **Infrastructure Layer** (`infrastructure`): TeamCity REST client, config loading, logging
//! - **CLI Layer** (`cli`): argument parsing and output
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tc_image_migrate::{Config, MigrationRequest, MigrationWorkflow};
//! use tc_image_migrate::infrastructure::teamcity::{TeamCityClient, TeamCityClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let client = TeamCityClient::new(TeamCityClientConfig::new(
//!         "https://teamcity.example.com",
//!         "token",
//!         &config.http,
//!     ))?;
//!     let workflow = MigrationWorkflow::new(Arc::new(client), &config.sweep);
//!     workflow
//!         .run(&MigrationRequest::new("ami-222", "AWS-Pool", "build-"), false)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{ApiError, MigrationError, MigrationResult};
pub use domain::models::{
    CloudImage, CloudPlatform, CloudProfile, Config, FeatureStore, MigrationRequest,
};
pub use domain::ports::TeamCityApi;
pub use services::{MigrationOutcome, MigrationWorkflow, Resolution, SweepReport};
