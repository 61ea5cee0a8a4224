use std::time::Duration;

/// Pauses around each schema upgrade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradePacing {
    pub before_step: Duration,
    pub after_step: Duration,
}

impl UpgradePacing {
    pub fn none() -> Self {
        Self {
            before_step: Duration::ZERO,
            after_step: Duration::ZERO,
        }
    }
}

impl Default for UpgradePacing {
    fn default() -> Self {
        Self {
            before_step: Duration::from_millis(800),
            after_step: Duration::from_millis(600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub upgrade_pacing: UpgradePacing,
    /// Messages examined between cancellation checks while counting.
    pub count_page_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            upgrade_pacing: UpgradePacing::default(),
            count_page_size: 1000,
        }
    }
}
