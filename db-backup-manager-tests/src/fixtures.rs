//! Test fixtures and sample data
//!
//! Provides pre-built configs, timestamps and sources for testing.

use chrono::{DateTime, TimeZone, Utc};
use db_backup_manager::config::ResolvedSourceConfig;
use db_backup_manager::context::RunContext;
use db_backup_manager::sources::mock::MockEngine;
use db_backup_manager::sources::DatabaseSource;
use db_backup_manager::utils::executor::DumpExecutor;
use std::sync::Arc;

/// Run timestamp used throughout the retention scenarios (2024-03-10, 02:30 UTC)
pub fn run_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 2, 30, 0).unwrap()
}

/// Run context at [`run_timestamp`]
pub fn run_context() -> RunContext {
    RunContext::at(run_timestamp())
}

/// Run context one second before midnight UTC on the given day
pub fn run_context_on(year: i32, month: u32, day: u32) -> RunContext {
    RunContext::at(Utc.with_ymd_and_hms(year, month, day, 23, 59, 59).unwrap())
}

/// Source bound to a mock engine listing `databases`
pub fn mock_source(
    config: ResolvedSourceConfig,
    databases: &[&str],
    executor: Arc<dyn DumpExecutor>,
) -> DatabaseSource {
    DatabaseSource::new(config, Box::new(MockEngine::with_databases(databases)), executor)
        .expect("Invalid filter rules")
}

/// Minimal valid config TOML; `{root}` is replaced with a writable directory
pub fn minimal_config_toml() -> &'static str {
    r#"
[global]
staging_directory = "{root}/staging"
lock_directory = "{root}/locks"
log_directory = "{root}/logs"

[targets.local]
type = "local"
path = "{root}/backups"

[sources.main]
engine = "mysql"
host = "127.0.0.1"
port = 1
target = "local"
strategy = { provider = "days", revisions = 7 }
"#
}

/// Config with one source per engine and filters
pub fn multi_source_config_toml() -> &'static str {
    r#"
[global]
staging_directory = "{root}/staging"
lock_directory = "{root}/locks"
log_directory = "{root}/logs"
default_timeout_seconds = 120

[targets.local]
type = "local"
path = "{root}/backups"

[sources.shop]
engine = "mariadb"
host = "db1.internal"
user = "backup"
password = "secret"
exclude = ["test_*", "tmp?"]
target = "local"
strategy = { provider = "days", revisions = 14 }

[sources.analytics]
engine = "postgresql"
host = "db2.internal"
port = 5433
timeout_seconds = 900
include = ["warehouse*"]
target = "local"
strategy = { provider = "weeks", revisions = 8 }

[sources.legacy]
enabled = false
engine = "mysql"
host = "db3.internal"
target = "local"
"#
}

/// Substitute `{root}` in a config template
pub fn render_config(template: &str, root: &std::path::Path) -> String {
    // Forward slashes keep Windows paths valid inside TOML strings
    let root = root.to_string_lossy().replace('\\', "/");
    template.replace("{root}", &root)
}
