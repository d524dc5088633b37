pub mod days;
pub mod weeks;

pub use days::DaysStrategy;
pub use weeks::WeeksStrategy;

use crate::config::{StrategyConfig, StrategyProvider};
use crate::sources::BackupFile;
use crate::targets::{TargetError, TargetStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

/// Everything a rotation policy works on during one run
#[derive(Clone)]
pub struct StrategyContext {
    pub target: Arc<dyn TargetStore>,
    pub config: StrategyConfig,
    pub timestamp: DateTime<Utc>,
}

/// Result of the best-effort cleanup step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// Retention is unlimited (or the window reaches before the calendar)
    Skipped,
    Deleted { bucket: String },
    Failed { bucket: String, error: String },
}

/// Outcome of a successful save; cleanup failures live in `prune`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub bucket: String,
    pub prune: PruneOutcome,
}

/// Trait for rotation policies
pub trait RetentionStrategy {
    /// Store the run's files and prune the bucket that just left the window
    ///
    /// Only a failed save is an error; a failed prune is reported in the outcome.
    fn save(&self, files: &[BackupFile]) -> Result<SaveOutcome, TargetError>;

    /// Get strategy name (for logging)
    fn name(&self) -> &'static str;
}

/// Create the strategy configured for a source
pub fn create_strategy(context: StrategyContext) -> Box<dyn RetentionStrategy> {
    match context.config.provider {
        StrategyProvider::Days => Box::new(DaysStrategy::new(context)),
        StrategyProvider::Weeks => Box::new(WeeksStrategy::new(context)),
    }
}

/// Shared save-then-prune sequence
///
/// Only one expired bucket is removed per run, which assumes one run per
/// bucket period. Skipped runs leave their expired bucket behind.
fn rotate(
    context: &StrategyContext,
    strategy: &str,
    bucket: String,
    expired: Option<String>,
    files: &[BackupFile],
) -> Result<SaveOutcome, TargetError> {
    context.target.save(&bucket, files)?;

    info!(
        store = context.target.name(),
        "Applying strategy with {}.", strategy
    );

    let prune = match expired {
        None => PruneOutcome::Skipped,
        Some(expired) => match context.target.delete_directory(&expired) {
            Ok(()) => PruneOutcome::Deleted { bucket: expired },
            Err(e) => {
                error!(
                    store = context.target.name(),
                    "Could not delete old revision. Bucket: {}, Error: {}.", expired, e
                );
                PruneOutcome::Failed {
                    bucket: expired,
                    error: e.to_string(),
                }
            }
        },
    };

    Ok(SaveOutcome { bucket, prune })
}
