//! Domain models for cloud profiles, cloud images and build agents.

pub mod agent;
pub mod config;
pub mod feature;
pub mod platform;
pub mod request;

pub use agent::{Agent, AgentRef, AMAZON_AMI_ID_PROPERTY};
pub use config::{Config, HttpConfig, LoggingConfig, SweepConfig};
pub use feature::{
    CloudImage, CloudProfile, FeatureStore, ProjectFeature, PropertyBag, CLOUD_IMAGE_TYPE,
    CLOUD_PROFILE_TYPE,
};
pub use platform::CloudPlatform;
pub use request::MigrationRequest;
