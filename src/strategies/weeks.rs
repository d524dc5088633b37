//! Weekly rotation keyed by ISO week (`%G-W%V`, e.g. `2024-W10`)

use super::{rotate, RetentionStrategy, SaveOutcome, StrategyContext};
use crate::sources::BackupFile;
use crate::targets::TargetError;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

const BUCKET_FORMAT: &str = "%G-W%V";

pub struct WeeksStrategy {
    context: StrategyContext,
}

impl WeeksStrategy {
    pub fn new(context: StrategyContext) -> Self {
        Self { context }
    }

    pub fn bucket_for(timestamp: DateTime<Utc>) -> String {
        timestamp.format(BUCKET_FORMAT).to_string()
    }

    pub fn current_bucket(&self) -> String {
        Self::bucket_for(self.context.timestamp)
    }

    pub fn expired_bucket(&self) -> Option<String> {
        let revisions = self.context.config.revisions;
        if revisions <= 0 {
            return None;
        }

        let expired = Duration::try_weeks(revisions)
            .and_then(|window| self.context.timestamp.checked_sub_signed(window));

        match expired {
            Some(date) => Some(Self::bucket_for(date)),
            None => {
                warn!("Revision window of {} weeks is out of range, not pruning", revisions);
                None
            }
        }
    }
}

impl RetentionStrategy for WeeksStrategy {
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
        "weeks"
    }
}
