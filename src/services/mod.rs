//! Service layer: the migration stages and their orchestration.

pub mod deprecation_sweep;
pub mod image_mutator;
pub mod migration_resolver;
pub mod migration_workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use deprecation_sweep::{AgentOutcome, DeprecationSweep, SweepReport};
pub use image_mutator::ImageMutator;
pub use migration_resolver::{MigrationResolver, Resolution};
pub use migration_workflow::{MigrationOutcome, MigrationWorkflow};
