//! Daily rotation
//!
//! Each run stores its files under the run's calendar day (`%Y-%m-%d`, UTC).
//! With `revisions = R > 0` the day `R` days before the run is deleted.

use super::{rotate, RetentionStrategy, SaveOutcome, StrategyContext};
use crate::sources::BackupFile;
use crate::targets::TargetError;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

const BUCKET_FORMAT: &str = "%Y-%m-%d";

pub struct DaysStrategy {
    context: StrategyContext,
}

impl DaysStrategy {
    pub fn new(context: StrategyContext) -> Self {
        Self { context }
    }

    pub fn bucket_for(timestamp: DateTime<Utc>) -> String {
        timestamp.format(BUCKET_FORMAT).to_string()
    }

    /// Bucket of this run
    pub fn current_bucket(&self) -> String {
        Self::bucket_for(self.context.timestamp)
    }

    /// Bucket leaving the window with this run, if any
    pub fn expired_bucket(&self) -> Option<String> {
        let revisions = self.context.config.revisions;
        if revisions <= 0 {
            return None;
        }

        let expired = Duration::try_days(revisions)
            .and_then(|window| self.context.timestamp.checked_sub_signed(window));

        match expired {
            Some(date) => Some(Self::bucket_for(date)),
            None => {
                warn!("Revision window of {} days is out of range, not pruning", revisions);
                None
            }
        }
    }
}

impl RetentionStrategy for DaysStrategy {
    fn save(&self, files: &[BackupFile]) -> Result<SaveOutcome, TargetError> {
        rotate(
            &self.context,
            self.name(),
            self.current_bucket(),
            self.expired_bucket(),
            files,
        )
    }

    fn name(&self) -> &'static str {
        "days"
    }
}
