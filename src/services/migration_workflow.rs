//! Resolve, compare, mutate, deprecate.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::errors::MigrationResult;
use crate::domain::models::{CloudPlatform, MigrationRequest, SweepConfig};
use crate::domain::ports::TeamCityApi;
use crate::services::deprecation_sweep::{DeprecationSweep, SweepReport};
use crate::services::image_mutator::ImageMutator;
use crate::services::migration_resolver::{MigrationResolver, Resolution};

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The cloud image already uses the requested image; nothing was sent.
    AlreadyCurrent { resolution: Resolution },
    /// A change was detected but `dry_run` suppressed it.
    DryRun { resolution: Resolution },
    /// The image was replaced and agents on the old image were swept.
    Migrated {
        resolution: Resolution,
        sweep: SweepReport,
    },
}

impl MigrationOutcome {
    pub const fn resolution(&self) -> &Resolution {
        match self {
            Self::AlreadyCurrent { resolution }
            | Self::DryRun { resolution }
            | Self::Migrated { resolution, .. } => resolution,
        }
    }
}

/// Sequences the migration stages. Stages never overlap.
pub struct MigrationWorkflow {
    resolver: MigrationResolver,
    mutator: ImageMutator,
    sweep: DeprecationSweep,
}

impl MigrationWorkflow {
    pub fn new(api: Arc<dyn TeamCityApi>, sweep_config: &SweepConfig) -> Self {
        Self {
            resolver: MigrationResolver::new(api.clone()),
            mutator: ImageMutator::new(api.clone()),
            sweep: DeprecationSweep::new(api, sweep_config.concurrency),
        }
    }

    pub async fn run(
        &self,
        request: &MigrationRequest,
        dry_run: bool,
    ) -> MigrationResult<MigrationOutcome> {
        let resolution = self.resolver.resolve(request).await?;

        if !resolution.needs_update {
            info!("Cloud profile is already using correct image. Nothing to do.");
            return Ok(MigrationOutcome::AlreadyCurrent { resolution });
        }

        if dry_run {
            info!(
                current = %resolution.current_image,
                target = %resolution.target_image,
                "dry run: cloud image would be updated"
            );
            return Ok(MigrationOutcome::DryRun { resolution });
        }

        let mut resolution = resolution;
        let stale_image = resolution.current_image.clone();
        self.mutator
            .apply(
                &resolution.cloud_profile,
                &mut resolution.cloud_image,
                &resolution.target_image,
            )
            .await?;

        if resolution.cloud_profile.platform() == CloudPlatform::AzureArm {
            warn!("Agent matching only inspects the Amazon AMI id; Azure agents will not be disabled");
        }

        let sweep = self
            .sweep
            .deprecate(&stale_image, &resolution.target_image)
            .await?;

        Ok(MigrationOutcome::Migrated { resolution, sweep })
    }
}
