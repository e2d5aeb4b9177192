pub mod client;
pub mod types;

pub use client::{TeamCityClient, TeamCityClientConfig, PUT_ACCEPT};
pub use types::{decode_agent, decode_agent_refs, decode_project_features};
