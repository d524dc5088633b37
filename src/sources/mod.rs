//! Database sources
//!
//! A source is one database server. Engine-specific behaviour (how to list
//! databases, which dump tool to run and how to pass it arguments) lives
//! behind [`DatabaseEngine`]; [`DatabaseSource`] drives any engine through
//! list → filter → dump-each.

mod backup_file;
pub mod filter;
pub mod mysql;
pub mod postgres;

pub use backup_file::BackupFile;
pub use mysql::MySqlEngine;
pub use postgres::PostgresEngine;

use crate::config::{DatabaseEngineKind, ResolvedSourceConfig};
use crate::context::RunContext;
use crate::utils::command::DumpCommand;
use crate::utils::executor::{DumpError, DumpExecutor, DumpRequest};
use filter::{DatabaseFilter, FilterError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Enumeration failures; the source run treats all of them as "no databases"
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Could not connect to {engine} server at {host}: {reason}")]
    Connect {
        engine: &'static str,
        host: String,
        reason: String,
    },

    #[error("Listing databases failed: {0}")]
    Query(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// What a database engine has to provide so the backup pipeline can drive it
pub trait DatabaseEngine: Send + Sync {
    /// Engine name (for logging)
    fn name(&self) -> &'static str;

    /// Executable of the dump tool
    fn dump_binary_name(&self) -> &'static str;

    /// File extension of produced dumps, without the dot
    fn output_file_suffix(&self) -> &'static str;

    /// Whether the dump tool writes to stdout instead of a `--file` argument
    fn output_via_stdout(&self) -> bool;

    /// Schemas skipped unless the source asks for them
    fn system_databases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Connect, list databases in server order, disconnect
    fn list_databases(&self, source: &ResolvedSourceConfig) -> Result<Vec<String>, SourceError>;

    /// Dump invocation for one database
    fn build_dump_command(
        &self,
        source: &ResolvedSourceConfig,
        database: &str,
        output: &Path,
    ) -> DumpCommand;
}

/// Create the engine for a configured engine kind
pub fn create_engine(kind: DatabaseEngineKind) -> Box<dyn DatabaseEngine> {
    match kind {
        DatabaseEngineKind::Mysql => Box::new(MySqlEngine::new()),
        DatabaseEngineKind::Postgres => Box::new(PostgresEngine::new()),
    }
}

/// One configured source bound to its engine and a dump executor
pub struct DatabaseSource {
    config: ResolvedSourceConfig,
    engine: Box<dyn DatabaseEngine>,
    executor: Arc<dyn DumpExecutor>,
    filter: DatabaseFilter,
}

impl DatabaseSource {
    pub fn new(
        config: ResolvedSourceConfig,
        engine: Box<dyn DatabaseEngine>,
        executor: Arc<dyn DumpExecutor>,
    ) -> Result<Self, FilterError> {
        let filter = DatabaseFilter::new(&config.include, &config.exclude)?;
        Ok(Self {
            config,
            engine,
            executor,
            filter,
        })
    }

    /// Build a source using the engine named in its configuration
    pub fn from_config(
        config: ResolvedSourceConfig,
        executor: Arc<dyn DumpExecutor>,
    ) -> Result<Self, FilterError> {
        let engine = create_engine(config.engine);
        Self::new(config, engine, executor)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ResolvedSourceConfig {
        &self.config
    }

    /// All databases on the server, or `None` if the server could not be queried
    pub fn list_databases(&self) -> Option<Vec<String>> {
        match self.engine.list_databases(&self.config) {
            Ok(databases) => {
                let total = databases.len();
                let databases: Vec<String> =
                    databases.into_iter().filter(|db| !db.is_empty()).collect();
                if databases.len() != total {
                    warn!(
                        source = %self.config.name,
                        "Ignoring {} database(s) with an empty name",
                        total - databases.len()
                    );
                }
                debug!(
                    source = %self.config.name,
                    "Found {} database(s) on {} server",
                    databases.len(),
                    self.engine.name()
                );
                Some(databases)
            }
            Err(e) => {
                error!(
                    source = %self.config.name,
                    "Could not connect to server. Error: {}", e
                );
                None
            }
        }
    }

    /// Databases that survive system-schema exclusion and the include/exclude rules
    pub fn filtered_databases(&self) -> Vec<String> {
        let Some(databases) = self.list_databases() else {
            return Vec::new();
        };

        let system = self.engine.system_databases();
        let candidates: Vec<String> = databases
            .into_iter()
            .filter(|db| self.config.include_system_databases || !system.contains(&db.as_str()))
            .collect();

        self.filter.apply(candidates)
    }

    /// Dump every filtered database into `directory`
    ///
    /// Returns `None` when there is nothing to back up. A failed dump is
    /// logged and skipped; only confirmed dumps are returned.
    pub fn load(&self, directory: &Path, context: &RunContext) -> Option<Vec<BackupFile>> {
        let databases = self.filtered_databases();

        if databases.is_empty() {
            info!(source = %self.config.name, "No databases found.");
            return None;
        }

        let mut files = Vec::with_capacity(databases.len());

        for database in &databases {
            if !is_safe_file_stem(database) {
                error!(
                    source = %self.config.name,
                    database = %database,
                    "Skipping database '{}': name cannot be used as a file name", database
                );
                continue;
            }

            let mut file = BackupFile::new(
                directory,
                format!("{}.{}", database, self.engine.output_file_suffix()),
            );
            let output = file.path();

            let request = DumpRequest {
                database: database.clone(),
                command: self.engine.build_dump_command(&self.config, database, &output),
                output,
                capture_stdout: self.engine.output_via_stdout(),
                timeout: self.config.timeout(),
            };

            match self.dump(&request) {
                Ok(()) => {
                    file.mark_created(context.timestamp);
                    files.push(file);
                }
                Err(e) => {
                    error!(
                        source = %self.config.name,
                        database = %database,
                        "Backup of database '{}' failed: {}", database, e
                    );
                }
            }
        }

        info!(
            source = %self.config.name,
            "Created {} backup{}.",
            files.len(),
            plural_suffix(files.len())
        );

        Some(files)
    }

    fn dump(&self, request: &DumpRequest) -> Result<(), DumpError> {
        debug!(
            source = %self.config.name,
            "Dumping '{}' with {}",
            request.database,
            request.command.program()
        );

        self.executor.execute(request)?;

        if !request.output.exists() {
            return Err(DumpError::MissingOutput {
                program: request.command.program().to_string(),
                path: request.output.clone(),
            });
        }

        Ok(())
    }
}

fn plural_suffix(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Database names become file names; refuse anything that could leave the directory
fn is_safe_file_stem(name: &str) -> bool {
    !name.contains(['/', '\\', '\0']) && name != "." && name != ".."
}

/// Mock engine for testing
/// Available for use in external test crates
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine that returns a fixed database list (or a connection error)
    pub struct MockEngine {
        databases: Result<Vec<String>, String>,
        system: &'static [&'static str],
        output_via_stdout: bool,
        suffix: &'static str,
        list_calls: Arc<AtomicUsize>,
    }

    impl MockEngine {
        pub fn with_databases(databases: &[&str]) -> Self {
            Self {
                databases: Ok(databases.iter().map(|s| s.to_string()).collect()),
                system: &[],
                output_via_stdout: true,
                suffix: "sql",
                list_calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn unreachable(reason: &str) -> Self {
            Self {
                databases: Err(reason.to_string()),
                ..Self::with_databases(&[])
            }
        }

        pub fn with_system_databases(mut self, system: &'static [&'static str]) -> Self {
            self.system = system;
            self
        }

        pub fn with_suffix(mut self, suffix: &'static str) -> Self {
            self.suffix = suffix;
            self
        }

        /// Shared counter of `list_databases` calls
        pub fn list_calls(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.list_calls)
        }
    }

    impl DatabaseEngine for MockEngine {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn dump_binary_name(&self) -> &'static str {
            "mock-dump"
        }

        fn output_file_suffix(&self) -> &'static str {
            self.suffix
        }

        fn output_via_stdout(&self) -> bool {
            self.output_via_stdout
        }

        fn system_databases(&self) -> &'static [&'static str] {
            self.system
        }

        fn list_databases(&self, source: &ResolvedSourceConfig) -> Result<Vec<String>, SourceError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.databases.clone().map_err(|reason| SourceError::Connect {
                engine: "mock",
                host: source.host.clone(),
                reason,
            })
        }

        fn build_dump_command(
            &self,
            _source: &ResolvedSourceConfig,
            database: &str,
            output: &Path,
        ) -> DumpCommand {
            DumpCommand::new(self.dump_binary_name())
                .arg(database)
                .arg(output.display().to_string())
        }
    }
}
