use async_trait::async_trait;
use engine_logging::{engine_info, engine_warn};
use thiserror::Error;

use crate::{Decision, Interaction, ProgressTree, UpgradePacing};

/// Depth 0: version step, 1: main work, 2: sub work.
pub const UPGRADE_PROGRESS_DEPTHS: usize = 3;

pub const UPGRADE_CONFIRM_TITLE: &str = "Database Upgrade";
pub const UPGRADE_CONFIRM_MESSAGE: &str = "This database was created with an older version and \
    must be upgraded before it can be opened. The upgrade cannot be undone. Do you want to proceed?";

pub type StepError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum UpgradeError {
    /// The database may be left half-upgraded.
    #[error("schema upgrade step {step_index} failed: {source}")]
    Step {
        step_index: usize,
        #[source]
        source: StepError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeState {
    Confirm,
    Upgrading { step_index: usize, total_steps: usize },
    Done,
    Aborted,
}

/// Progress handle given to a running step.
pub struct UpgradeReporter<'a> {
    progress: &'a mut ProgressTree,
}

impl UpgradeReporter<'_> {
    pub fn main_work(&mut self, message: impl Into<String>, finished: u64, total: u64) {
        self.progress.update(1, message, finished, total);
    }

    pub fn sub_work(&mut self, message: impl Into<String>, finished: u64, total: u64) {
        self.progress.update(2, message, finished, total);
    }
}

/// One schema version transition.
#[async_trait]
pub trait UpgradeStep: Send {
    async fn upgrade(&mut self, reporter: &mut UpgradeReporter<'_>) -> Result<(), StepError>;
}

/// Runs a fixed list of version steps after the user agreed to upgrade.
///
/// Step errors are not handled here; they end the run and there is no rollback.
pub struct SchemaUpgradeCoordinator<'a> {
    interaction: &'a dyn Interaction,
    pacing: UpgradePacing,
    state: UpgradeState,
}

impl<'a> SchemaUpgradeCoordinator<'a> {
    pub fn new(interaction: &'a dyn Interaction, pacing: UpgradePacing) -> Self {
        Self {
            interaction,
            pacing,
            state: UpgradeState::Confirm,
        }
    }

    pub fn state(&self) -> UpgradeState {
        self.state
    }

    /// `progress` must have at least [`UPGRADE_PROGRESS_DEPTHS`] levels.
    pub async fn run(
        &mut self,
        steps: Vec<Box<dyn UpgradeStep>>,
        progress: &mut ProgressTree,
    ) -> Result<UpgradeState, UpgradeError> {
        self.state = UpgradeState::Confirm;
        let decision = self
            .interaction
            .confirm(UPGRADE_CONFIRM_TITLE, UPGRADE_CONFIRM_MESSAGE)
            .await;
        if decision == Decision::No {
            engine_info!("Schema upgrade declined");
            self.state = UpgradeState::Aborted;
            return Ok(self.state);
        }

        let total_steps = steps.len();
        for (step_index, mut step) in steps.into_iter().enumerate() {
            self.state = UpgradeState::Upgrading {
                step_index,
                total_steps,
            };
            engine_info!("Schema upgrade step {}/{}", step_index + 1, total_steps);
            progress.update(
                0,
                "Upgrading schema version...",
                step_index as u64,
                total_steps as u64,
            );
            progress.hide_below(0);
            tokio::time::sleep(self.pacing.before_step).await;

            let mut reporter = UpgradeReporter {
                progress: &mut *progress,
            };
            if let Err(source) = step.upgrade(&mut reporter).await {
                engine_warn!("Schema upgrade step {} failed: {}", step_index, source);
                return Err(UpgradeError::Step { step_index, source });
            }

            tokio::time::sleep(self.pacing.after_step).await;
        }

        self.state = UpgradeState::Done;
        Ok(self.state)
    }
}
