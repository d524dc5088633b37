//! DB Backup Manager Library
//!
//! Scheduled backups of MySQL and PostgreSQL servers: enumerate the
//! databases of a source, dump each with the engine's own tool, and keep a
//! rolling window of dated buckets on a target.

pub mod config;
pub mod context;
pub mod managers;
pub mod sources;
pub mod strategies;
pub mod targets;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, resolve_all_sources, Config, ResolvedSourceConfig};
pub use context::RunContext;
pub use managers::backup::{run_pipeline, BackupManager, RunReport};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
