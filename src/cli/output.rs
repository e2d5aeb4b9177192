//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::domain::errors::MigrationError;
use crate::services::{MigrationOutcome, SweepReport};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    AlreadyCurrent,
    DryRun,
    Migrated,
}

/// What a successful run did, for humans or scripts.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationSummary {
    pub status: SummaryStatus,
    pub cloud_profile: String,
    pub cloud_image: String,
    pub platform: String,
    pub previous_image: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<SweepReport>,
}

impl From<&MigrationOutcome> for MigrationSummary {
    fn from(outcome: &MigrationOutcome) -> Self {
        let resolution = outcome.resolution();
        let (status, sweep) = match outcome {
            MigrationOutcome::AlreadyCurrent { .. } => (SummaryStatus::AlreadyCurrent, None),
            MigrationOutcome::DryRun { .. } => (SummaryStatus::DryRun, None),
            MigrationOutcome::Migrated { sweep, .. } => (SummaryStatus::Migrated, Some(sweep.clone())),
        };

        Self {
            status,
            cloud_profile: resolution.cloud_profile.name().to_string(),
            cloud_image: resolution.cloud_image.id().to_string(),
            platform: resolution.cloud_profile.platform().to_string(),
            previous_image: resolution.current_image.clone(),
            image: resolution.target_image.clone(),
            sweep,
        }
    }
}

fn sweep_table(report: &SweepReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["OUTCOME", "COUNT", "AGENTS"]
                .iter()
                .map(|h| Cell::new(h).set_alignment(CellAlignment::Left)),
        );

    let rows = [
        ("disabled", &report.disabled),
        ("not matching", &report.not_matching),
        ("skipped", &report.skipped),
        ("failed", &report.failed),
    ];
    for (label, ids) in rows {
        if ids.is_empty() {
            continue;
        }
        table.add_row(vec![
            Cell::new(label),
            Cell::new(ids.len()),
            Cell::new(ids.join(", ")),
        ]);
    }
    table
}

impl CommandOutput for MigrationSummary {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        match self.status {
            SummaryStatus::AlreadyCurrent => lines.push(format!(
                "{} Cloud profile '{}' already uses image '{}'",
                style("✓").green(),
                self.cloud_profile,
                self.image
            )),
            SummaryStatus::DryRun => lines.push(format!(
                "{} Cloud image '{}' in '{}' would change from '{}' to '{}'",
                style("dry run").yellow().bold(),
                self.cloud_image,
                self.cloud_profile,
                self.previous_image,
                self.image
            )),
            SummaryStatus::Migrated => lines.push(format!(
                "{} Cloud image '{}' in '{}' now uses '{}' (was '{}')",
                style("✓").green(),
                self.cloud_image,
                self.cloud_profile,
                self.image,
                self.previous_image
            )),
        }

        if let Some(report) = &self.sweep {
            if report.nothing_to_disable() {
                lines.push(format!(
                    "No agents running '{}' ({} inspected)",
                    self.previous_image,
                    report.inspected()
                ));
            } else {
                lines.push(String::new());
                lines.push(sweep_table(report).to_string());
            }
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(map) = value.as_object_mut() {
            map.insert("success".to_string(), serde_json::Value::Bool(true));
        }
        value
    }
}

/// Failure shape for `--json` runs.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub error: String,
    pub exit_code: i32,
}

impl From<&MigrationError> for ErrorOutput {
    fn from(err: &MigrationError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            exit_code: err.exit_code(),
        }
    }
}

impl CommandOutput for ErrorOutput {
    fn to_human(&self) -> String {
        format!("{} {}", style("Error:").red().bold(), self.error)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
