use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub global: GlobalConfig,
    pub targets: HashMap<String, TargetConfig>,
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

/// Global configuration settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Directory where dumps are written before being handed to a target
    #[serde(default = "default_staging_directory")]
    pub staging_directory: PathBuf,

    /// Default dump timeout for sources that don't set one
    #[serde(default = "default_timeout")]
    pub default_timeout_seconds: u64,

    /// Directory holding per-source lock files
    #[serde(default = "default_lock_directory")]
    pub lock_directory: PathBuf,

    /// Logging configuration
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,

    /// Explicit paths for dump binaries, keyed by binary name (e.g. "pg_dump")
    #[serde(default)]
    pub binaries: HashMap<String, PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            staging_directory: default_staging_directory(),
            default_timeout_seconds: default_timeout(),
            lock_directory: default_lock_directory(),
            log_directory: default_log_directory(),
            log_level: default_log_level(),
            log_max_files: default_log_max_files(),
            binaries: HashMap::new(),
        }
    }
}

/// Backup target configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub path: PathBuf,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Local,
}

/// Database engine of a source
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngineKind {
    #[serde(alias = "mariadb")]
    Mysql,
    #[serde(alias = "postgresql", alias = "pgsql")]
    Postgres,
}

impl std::fmt::Display for DatabaseEngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseEngineKind::Mysql => write!(f, "mysql"),
            DatabaseEngineKind::Postgres => write!(f, "postgres"),
        }
    }
}

/// Rotation policy
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StrategyConfig {
    #[serde(default)]
    pub provider: StrategyProvider,

    /// Number of buckets to keep; zero or negative keeps everything
    #[serde(default)]
    pub revisions: i64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            provider: StrategyProvider::Days,
            revisions: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyProvider {
    #[default]
    Days,
    Weeks,
}

impl std::fmt::Display for StrategyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyProvider::Days => write!(f, "days"),
            StrategyProvider::Weeks => write!(f, "weeks"),
        }
    }
}

/// Source configuration (raw, before global defaults are applied)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub engine: DatabaseEngineKind,

    #[serde(default)]
    pub description: String,

    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,

    /// Database to open for enumeration (PostgreSQL defaults to `postgres`)
    #[serde(default)]
    pub connect_database: Option<String>,

    /// Timeout override, applies to enumeration and to each dump
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Wildcard patterns; empty means every database
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Keep engine bookkeeping schemas such as `mysql` or `sys`
    #[serde(default)]
    pub include_system_databases: bool,

    /// Target name
    pub target: String,

    #[serde(default)]
    pub strategy: StrategyConfig,
}

/// Resolved source configuration (after global defaults are applied)
#[derive(Clone)]
pub struct ResolvedSourceConfig {
    pub name: String,
    pub enabled: bool,
    pub engine: DatabaseEngineKind,
    pub description: String,
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    pub connect_database: Option<String>,
    pub timeout_seconds: u64,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub include_system_databases: bool,
    pub target: String,
    pub strategy: StrategyConfig,
}

impl ResolvedSourceConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

// Hand-written so the password never ends up in debug output
impl std::fmt::Debug for ResolvedSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSourceConfig")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connect_database", &self.connect_database)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("include_system_databases", &self.include_system_databases)
            .field("target", &self.target)
            .field("strategy", &self.strategy)
            .finish()
    }
}

// Default value functions

fn default_timeout() -> u64 { 3600 }
fn default_staging_directory() -> PathBuf {
    std::env::temp_dir().join("db-backup-manager")
}
fn default_lock_directory() -> PathBuf { std::env::temp_dir() }
fn default_log_directory() -> PathBuf { PathBuf::from("~/logs") }
fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
fn default_enabled() -> bool { true }
