use super::types::*;
use crate::sources::filter::DatabaseFilter;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Target '{0}' not found")]
    TargetNotFound(String),

    #[error("Source '{0}' not found")]
    SourceNotFound(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(contents)?;
    expand_paths(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn expand_paths(config: &mut Config) {
    let global = &mut config.global;
    global.staging_directory = super::expand_tilde(&global.staging_directory);
    global.lock_directory = super::expand_tilde(&global.lock_directory);
    global.log_directory = super::expand_tilde(&global.log_directory);
    for path in global.binaries.values_mut() {
        *path = super::expand_tilde(path);
    }

    for target in config.targets.values_mut() {
        target.path = super::expand_tilde(&target.path);
    }
}

/// Validate the configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.targets.is_empty() {
        return Err(ConfigError::ValidationError(
            "No targets defined".to_string(),
        ));
    }

    if config.global.default_timeout_seconds == 0 {
        return Err(ConfigError::ValidationError(
            "default_timeout_seconds must be greater than zero".to_string(),
        ));
    }

    for (name, source) in &config.sources {
        validate_source(name, source, config)?;
    }

    Ok(())
}

fn validate_source(name: &str, source: &SourceConfig, config: &Config) -> Result<()> {
    // The name becomes a staging subdirectory and part of the lock file name
    let unsafe_name = name.trim().is_empty()
        || name == "."
        || name.contains("..")
        || name.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(ConfigError::ValidationError(format!(
            "Invalid source name '{}': must not be empty or contain '/', '\\', '..' or NUL",
            name.escape_debug()
        )));
    }

    if source.host.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Source '{}': host must not be empty",
            name
        )));
    }

    if source.timeout_seconds == Some(0) {
        return Err(ConfigError::ValidationError(format!(
            "Source '{}': timeout_seconds must be greater than zero",
            name
        )));
    }

    if !config.targets.contains_key(&source.target) {
        return Err(ConfigError::TargetNotFound(source.target.clone()));
    }

    DatabaseFilter::new(&source.include, &source.exclude).map_err(|e| {
        ConfigError::ValidationError(format!("Source '{}': {}", name, e))
    })?;

    Ok(())
}

/// Resolve a source configuration by applying global defaults
pub fn resolve_source(name: &str, source: &SourceConfig, config: &Config) -> Result<ResolvedSourceConfig> {
    if !config.targets.contains_key(&source.target) {
        return Err(ConfigError::TargetNotFound(source.target.clone()));
    }

    let timeout_seconds = source
        .timeout_seconds
        .unwrap_or(config.global.default_timeout_seconds);

    Ok(ResolvedSourceConfig {
        name: name.to_string(),
        enabled: source.enabled,
        engine: source.engine,
        description: source.description.clone(),
        host: source.host.clone(),
        port: source.port,
        user: source.user.clone(),
        password: source.password.clone(),
        connect_database: source.connect_database.clone(),
        timeout_seconds,
        include: source.include.clone(),
        exclude: source.exclude.clone(),
        include_system_databases: source.include_system_databases,
        target: source.target.clone(),
        strategy: source.strategy.clone(),
    })
}

/// Resolve all sources in the configuration
pub fn resolve_all_sources(config: &Config) -> Result<HashMap<String, ResolvedSourceConfig>> {
    let mut resolved = HashMap::new();

    for (name, source) in &config.sources {
        let resolved_source = resolve_source(name, source, config)?;
        resolved.insert(name.clone(), resolved_source);
    }

    Ok(resolved)
}
