//! Per-run state shared by every pipeline stage

use chrono::{DateTime, Utc};

/// Captured once when a source run starts and passed down explicitly, so
/// every stage of that run sees the same clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub timestamp: DateTime<Utc>,
}

impl RunContext {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }
}
