//! Command-line surface: argument parsing, the single migrate command, output.

pub mod output;
pub mod types;

use std::sync::Arc;
use tracing::{error, info};

use crate::domain::errors::{MigrationError, MigrationResult};
use crate::domain::models::Config;
use crate::infrastructure::teamcity::{TeamCityClient, TeamCityClientConfig};
use crate::services::{MigrationOutcome, MigrationWorkflow};

pub use output::{output, CommandOutput, ErrorOutput, MigrationSummary};
pub use types::{usage_exit_code, Cli, ValidatedArgs};

/// Validate arguments, connect, and run one migration.
pub async fn execute(cli: &Cli, config: &Config) -> MigrationResult<MigrationOutcome> {
    let args = cli.validate()?;

    let client = TeamCityClient::new(TeamCityClientConfig::new(
        args.server.as_str(),
        args.token.as_str(),
        &config.http,
    ))
    .map_err(|err| MigrationError::InvalidConfiguration(format!("{err:#}")))?;

    info!(server = %client.server_url(), dry_run = cli.dry_run, "Starting image migration");

    let workflow = MigrationWorkflow::new(Arc::new(client), &config.sweep);
    workflow.run(&args.request, cli.dry_run).await
}

/// Print the result of a successful run.
pub fn report(outcome: &MigrationOutcome, json: bool) {
    output(&MigrationSummary::from(outcome), json);
}

/// Log a failure and return the process exit code for it.
pub fn handle_error(err: &MigrationError, json: bool) -> i32 {
    let code = err.exit_code();
    error!(exit_code = code, "{err}");
    if json {
        output(&ErrorOutput::from(err), true);
    }
    code
}
