//! Backup manager - orchestrates backup runs
//!
//! One run handles one source: enumerate and dump into a staging directory,
//! hand the dumps to the source's retention strategy, then clear staging.

use crate::config::{Config, ResolvedSourceConfig};
use crate::context::RunContext;
use crate::sources::{BackupFile, DatabaseSource};
use crate::strategies::{create_strategy, PruneOutcome, StrategyContext};
use crate::targets::{create_target, TargetStore};
use crate::utils::executor::{DumpExecutor, RealExecutor};
use crate::utils::locker::BackupLock;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// What a single source run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub source: String,
    pub context: RunContext,
    /// Bucket the files were stored under; `None` when nothing was stored
    pub bucket: Option<String>,
    pub files: Vec<BackupFile>,
    /// Cleanup result; `None` when the strategy did not run
    pub prune: Option<PruneOutcome>,
}

impl RunReport {
    fn empty(source: &str, context: RunContext) -> Self {
        Self {
            source: source.to_string(),
            context,
            bucket: None,
            files: Vec::new(),
            prune: None,
        }
    }
}

/// Run the pipeline for one source
///
/// Dumps go to `staging_dir`, which is emptied first. A target save failure
/// is returned as an error; dump failures and prune failures are not.
pub fn run_pipeline(
    source: &DatabaseSource,
    target: Arc<dyn TargetStore>,
    staging_dir: &Path,
    context: RunContext,
) -> Result<RunReport> {
    reset_staging(staging_dir)?;

    let files = match source.load(staging_dir, &context) {
        Some(files) => files,
        None => return Ok(RunReport::empty(source.name(), context)),
    };

    if files.is_empty() {
        warn!(
            source = %source.name(),
            "No backup succeeded, storing an empty bucket"
        );
    }

    let strategy = create_strategy(StrategyContext {
        target,
        config: source.config().strategy.clone(),
        timestamp: context.timestamp,
    });

    let outcome = strategy
        .save(&files)
        .with_context(|| format!("Failed to store backups of source '{}'", source.name()))?;

    if let Err(e) = fs::remove_dir_all(staging_dir) {
        warn!("Failed to cleanup staging directory {:?}: {}", staging_dir, e);
    }

    Ok(RunReport {
        source: source.name().to_string(),
        context,
        bucket: Some(outcome.bucket),
        files,
        prune: Some(outcome.prune),
    })
}

fn reset_staging(staging_dir: &Path) -> Result<()> {
    if staging_dir.exists() {
        fs::remove_dir_all(staging_dir)
            .with_context(|| format!("Failed to clear staging directory {:?}", staging_dir))?;
    }
    fs::create_dir_all(staging_dir)
        .with_context(|| format!("Failed to create staging directory {:?}", staging_dir))?;
    Ok(())
}

pub struct BackupManager {
    config: Config,
    resolved_sources: HashMap<String, ResolvedSourceConfig>,
    executor: Arc<dyn DumpExecutor>,
}

impl BackupManager {
    /// Create new backup manager running the real dump binaries
    pub fn new(config: Config, resolved_sources: HashMap<String, ResolvedSourceConfig>) -> Self {
        let executor = Arc::new(RealExecutor::with_binaries(config.global.binaries.clone()));
        Self::with_executor(config, resolved_sources, executor)
    }

    /// Create backup manager with a specific dump executor
    pub fn with_executor(
        config: Config,
        resolved_sources: HashMap<String, ResolvedSourceConfig>,
        executor: Arc<dyn DumpExecutor>,
    ) -> Self {
        Self {
            config,
            resolved_sources,
            executor,
        }
    }

    fn source(&self, source_name: &str) -> Result<DatabaseSource> {
        let config = self
            .resolved_sources
            .get(source_name)
            .context(format!("Source not found: {}", source_name))?;

        DatabaseSource::from_config(config.clone(), Arc::clone(&self.executor))
            .context(format!("Invalid filter rules for source '{}'", source_name))
    }

    fn target_for(&self, source: &ResolvedSourceConfig) -> Result<Arc<dyn TargetStore>> {
        let target_config = self
            .config
            .targets
            .get(&source.target)
            .context(format!("Target not found: {}", source.target))?;

        Ok(Arc::from(create_target(&source.target, target_config)))
    }

    /// Run backup for a specific source
    pub fn backup_source(&self, source_name: &str) -> Result<RunReport> {
        let source = self.source(source_name)?;

        if !source.config().enabled {
            info!("Source '{}' is disabled, skipping", source_name);
            return Ok(RunReport::empty(source_name, RunContext::now()));
        }

        let _lock = BackupLock::acquire(&self.config.global.lock_directory, source_name)
            .context(format!("Failed to acquire lock for source '{}'", source_name))?;

        let target = self.target_for(source.config())?;
        let staging_dir = self.config.global.staging_directory.join(source_name);

        let start_time = Instant::now();
        info!(
            "Starting backup for source '{}' ({} at {})",
            source_name,
            source.config().engine,
            source.config().host
        );

        let report = run_pipeline(&source, target, &staging_dir, RunContext::now())?;

        info!(
            "Backup for source '{}' completed in {:.2}s",
            source_name,
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }

    /// Run backups for all enabled sources
    pub fn backup_all(&self) -> Result<()> {
        info!("Starting backup for all enabled sources");

        let mut enabled_sources: Vec<&String> = self
            .resolved_sources
            .iter()
            .filter(|(_, source)| source.enabled)
            .map(|(name, _)| name)
            .collect();
        enabled_sources.sort();

        if enabled_sources.is_empty() {
            warn!("No enabled sources to backup");
            return Ok(());
        }

        info!("Found {} enabled sources", enabled_sources.len());

        let mut success_count = 0;
        let mut errors = Vec::new();

        for name in enabled_sources {
            match self.backup_source(name) {
                Ok(_) => {
                    success_count += 1;
                }
                Err(e) => {
                    error!("Failed to backup source '{}': {:#}", name, e);
                    errors.push(format!("{}: {:#}", name, e));
                }
            }
        }

        info!(
            "Backup summary: {} succeeded, {} failed",
            success_count,
            errors.len()
        );

        if !errors.is_empty() {
            anyhow::bail!(
                "{} source(s) failed to backup:\n{}",
                errors.len(),
                errors.join("\n")
            );
        }

        Ok(())
    }

    /// Filtered database list of a source, without dumping anything
    pub fn list_databases(&self, source_name: &str) -> Result<Vec<String>> {
        let source = self.source(source_name)?;
        Ok(source.filtered_databases())
    }

    /// Get list of all source names, sorted
    pub fn list_sources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resolved_sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get source configuration
    pub fn get_source(&self, name: &str) -> Option<&ResolvedSourceConfig> {
        self.resolved_sources.get(name)
    }
}
