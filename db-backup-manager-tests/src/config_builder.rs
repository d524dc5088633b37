//! Fluent API for building test configurations
//!
//! Provides a builder pattern for creating test configurations with sensible defaults.

use db_backup_manager::config::{
    Config, DatabaseEngineKind, GlobalConfig, SourceConfig, StrategyConfig, StrategyProvider,
    TargetConfig, TargetType,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for creating test configurations
///
/// Every directory the config points at lives in the builder's temp dir.
pub struct ConfigBuilder {
    temp_dir: TempDir,
    global: GlobalConfig,
    targets: HashMap<String, TargetConfig>,
    sources: HashMap<String, SourceConfig>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder without targets or sources
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let dir = |name: &str| {
            let path = temp_dir.path().join(name);
            fs::create_dir_all(&path).expect("Failed to create test directory");
            path
        };

        let global = GlobalConfig {
            staging_directory: dir("staging"),
            default_timeout_seconds: 300,
            lock_directory: dir("locks"),
            log_directory: dir("logs"),
            log_level: "debug".to_string(),
            log_max_files: 5,
            binaries: HashMap::new(),
        };

        Self {
            temp_dir,
            global,
            targets: HashMap::new(),
            sources: HashMap::new(),
        }
    }

    /// Create a minimal config with a local target named `local`
    pub fn minimal() -> Self {
        let builder = Self::new();
        let backup_path = builder.temp_dir.path().join("backups");
        fs::create_dir_all(&backup_path).expect("Failed to create backup dir");
        builder.add_local_target("local", &backup_path)
    }

    /// Path of the `local` target created by [`ConfigBuilder::minimal`]
    pub fn backup_dir(&self) -> PathBuf {
        self.temp_dir.path().join("backups")
    }

    /// Set the default timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.global.default_timeout_seconds = seconds;
        self
    }

    /// Set the log directory
    pub fn with_log_dir(mut self, path: &Path) -> Self {
        self.global.log_directory = path.to_path_buf();
        self
    }

    /// Override the path of a dump binary
    pub fn with_binary(mut self, name: &str, path: &Path) -> Self {
        self.global.binaries.insert(name.to_string(), path.to_path_buf());
        self
    }

    /// Add a local target
    pub fn add_local_target(mut self, name: &str, path: &Path) -> Self {
        self.targets.insert(
            name.to_string(),
            TargetConfig {
                target_type: TargetType::Local,
                path: path.to_path_buf(),
                description: format!("Local target: {}", name),
            },
        );
        self
    }

    /// Add an enabled MySQL source on the `local` target
    pub fn add_source(self, name: &str) -> Self {
        self.add_source_config(name, source_config(DatabaseEngineKind::Mysql))
    }

    /// Add an enabled PostgreSQL source on the `local` target
    pub fn add_postgres_source(self, name: &str) -> Self {
        self.add_source_config(name, source_config(DatabaseEngineKind::Postgres))
    }

    /// Add a disabled MySQL source
    pub fn add_disabled_source(self, name: &str) -> Self {
        let mut source = source_config(DatabaseEngineKind::Mysql);
        source.enabled = false;
        self.add_source_config(name, source)
    }

    /// Add a source with a fully custom configuration
    pub fn add_source_config(mut self, name: &str, source: SourceConfig) -> Self {
        self.sources.insert(name.to_string(), source);
        self
    }

    /// Set include/exclude rules on an existing source
    pub fn with_filters(mut self, source: &str, include: &[&str], exclude: &[&str]) -> Self {
        if let Some(s) = self.sources.get_mut(source) {
            s.include = include.iter().map(|p| p.to_string()).collect();
            s.exclude = exclude.iter().map(|p| p.to_string()).collect();
        }
        self
    }

    /// Set the retention strategy of an existing source
    pub fn with_strategy(mut self, source: &str, provider: StrategyProvider, revisions: i64) -> Self {
        if let Some(s) = self.sources.get_mut(source) {
            s.strategy = StrategyConfig {
                provider,
                revisions,
            };
        }
        self
    }

    /// Build the config, dropping the temp dir
    ///
    /// Only useful for tests that never touch the filesystem.
    pub fn build(self) -> Config {
        self.persist().0
    }

    /// Build the config and hand over the temp dir that backs it
    pub fn persist(self) -> (Config, TempDir) {
        let config = Config {
            global: self.global,
            targets: self.targets,
            sources: self.sources,
        };
        (config, self.temp_dir)
    }

    /// Serialize the config to `config.toml` inside its temp dir
    pub fn write(self) -> (PathBuf, TempDir) {
        let (config, temp_dir) = self.persist();
        let path = temp_dir.path().join("config.toml");
        let contents = toml::to_string_pretty(&config).expect("Failed to serialize config");
        fs::write(&path, contents).expect("Failed to write config");
        (path, temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn source_config(engine: DatabaseEngineKind) -> SourceConfig {
    SourceConfig {
        enabled: true,
        engine,
        description: format!("Test {} source", engine),
        host: "127.0.0.1".to_string(),
        // Nothing listens here, so enumeration fails fast
        port: Some(1),
        user: "backup".to_string(),
        password: "test-password".to_string(),
        connect_database: None,
        timeout_seconds: Some(5),
        include: vec![],
        exclude: vec![],
        include_system_databases: false,
        target: "local".to_string(),
        strategy: StrategyConfig {
            provider: StrategyProvider::Days,
            revisions: 7,
        },
    }
}
