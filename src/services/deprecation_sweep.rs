//! Disables authorized agents still running a replaced image.
//!
//! Agents are inspected concurrently (bounded by the configured fan-out) and
//! every per-agent outcome is collected before [`DeprecationSweep::deprecate`]
//! returns, so no disable request is left in flight when the process exits.
//! A single agent whose detail cannot be fetched is skipped with a warning;
//! a rejected disable request fails the run once all agents have been seen.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::errors::{ApiError, MigrationError, MigrationResult};
use crate::domain::models::AgentRef;
use crate::domain::ports::{TeamCityApi, CONTENT_TYPE_XML};
use crate::infrastructure::teamcity::{decode_agent, decode_agent_refs};

/// Listing of agents approved to receive work.
pub const AUTHORIZED_AGENTS_PATH: &str = "/app/rest/agents?locator=authorized:true";

/// What happened to one agent during the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    Disabled { agent_id: String },
    NotMatching { agent_id: String },
    Skipped { agent_id: String, reason: ApiError },
    DisableFailed { agent_id: String, error: ApiError },
}

/// Tally of a finished sweep, by agent id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub disabled: Vec<String>,
    pub not_matching: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl SweepReport {
    fn record(&mut self, outcome: &AgentOutcome) {
        match outcome {
            AgentOutcome::Disabled { agent_id } => self.disabled.push(agent_id.clone()),
            AgentOutcome::NotMatching { agent_id } => self.not_matching.push(agent_id.clone()),
            AgentOutcome::Skipped { agent_id, .. } => self.skipped.push(agent_id.clone()),
            AgentOutcome::DisableFailed { agent_id, .. } => self.failed.push(agent_id.clone()),
        }
    }

    /// Agents that reported the stale image, whether or not disabling worked.
    pub fn matched(&self) -> usize {
        self.disabled.len() + self.failed.len()
    }

    pub fn inspected(&self) -> usize {
        self.matched() + self.not_matching.len() + self.skipped.len()
    }

    /// True when no agent reported the stale image.
    pub fn nothing_to_disable(&self) -> bool {
        self.matched() == 0
    }
}

/// Last path segment of an image reference, for readable comments.
pub fn short_image_name(image: &str) -> &str {
    image
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(image)
}

/// Comment attached to the agent's disabled state.
pub fn disable_comment(stale_image: &str, new_image: &str) -> String {
    format!(
        "Disabled as agent is running image '{}'. Cloud profile now uses image '{}'.",
        short_image_name(stale_image),
        short_image_name(new_image)
    )
}

/// `enabledInfo` document that disables an agent with `comment`.
pub fn enabled_info_body(comment: &str) -> String {
    format!(
        "<enabledInfo status='false'><comment><text>{}</text></comment></enabledInfo>",
        escape_xml(comment)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub struct DeprecationSweep {
    api: Arc<dyn TeamCityApi>,
    concurrency: usize,
}

impl DeprecationSweep {
    pub fn new(api: Arc<dyn TeamCityApi>, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
        }
    }

    /// Disable every authorized agent reporting `stale_image`.
    #[instrument(skip(self))]
    pub async fn deprecate(&self, stale_image: &str, new_image: &str) -> MigrationResult<SweepReport> {
        let agents = self.authorized_agents().await?;
        let comment = disable_comment(stale_image, new_image);
        debug!(count = agents.len(), "inspecting authorized agents");

        let outcomes: Vec<AgentOutcome> = stream::iter(agents)
            .map(|agent| self.inspect(agent, stale_image, &comment))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = SweepReport::default();
        let mut first_failure = None;
        for outcome in outcomes {
            report.record(&outcome);
            if let AgentOutcome::DisableFailed { agent_id, error } = outcome {
                first_failure.get_or_insert(MigrationError::DisableAgent {
                    agent_id,
                    source: error,
                });
            }
        }

        if report.nothing_to_disable() {
            info!(
                "No authorized agents are running image '{}'. Nothing to disable.",
                stale_image
            );
        } else {
            info!(
                disabled = report.disabled.len(),
                failed = report.failed.len(),
                skipped = report.skipped.len(),
                "agent sweep complete"
            );
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    async fn authorized_agents(&self) -> MigrationResult<Vec<AgentRef>> {
        let value = self
            .api
            .get_json(AUTHORIZED_AGENTS_PATH)
            .await
            .map_err(MigrationError::ListAgents)?;
        decode_agent_refs(value).map_err(MigrationError::ListAgents)
    }

    async fn inspect(&self, agent: AgentRef, stale_image: &str, comment: &str) -> AgentOutcome {
        let detail = match self.api.get_json(&agent.href).await.and_then(decode_agent) {
            Ok(detail) => detail,
            Err(reason) => {
                warn!(
                    "Unable to fetch details for agent {} ({}): {}. Skipping.",
                    agent.id, agent.href, reason
                );
                return AgentOutcome::Skipped {
                    agent_id: agent.id,
                    reason,
                };
            }
        };

        if detail.reported_image() != Some(stale_image) {
            debug!(agent = %detail.display_name(), image = ?detail.reported_image(), "agent not on stale image");
            return AgentOutcome::NotMatching {
                agent_id: detail.id,
            };
        }

        let path = format!("{}/enabledInfo", detail.href.trim_end_matches('/'));
        match self
            .api
            .put(&path, enabled_info_body(comment), CONTENT_TYPE_XML)
            .await
        {
            Ok(_) => {
                info!(
                    "Disabled agent '{}' as it is running image '{}'",
                    detail.display_name(),
                    stale_image
                );
                AgentOutcome::Disabled {
                    agent_id: detail.id,
                }
            }
            Err(error) => {
                error!(
                    "Failed to disable agent '{}': {}",
                    detail.display_name(),
                    error
                );
                AgentOutcome::DisableFailed {
                    agent_id: detail.id,
                    error,
                }
            }
        }
    }
}
