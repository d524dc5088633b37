//! Configuration module for db-backup-manager
//!
//! This module handles loading, validating, and resolving configuration from TOML files.
//!
//! ## Defaults
//!
//! Source settings fall back to the `[global]` table when unset
//! (currently only the timeout).
//!
//! ## Example Usage
//!
//! ```no_run
//! use db_backup_manager::config;
//!
//! let config = config::load_config("db-backup.toml")?;
//! let resolved_sources = config::resolve_all_sources(&config)?;
//!
//! for (name, source) in resolved_sources {
//!     println!("Source: {}, Engine: {}", name, source.engine);
//! }
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{
    load_config, parse_config, resolve_all_sources, resolve_source, ConfigError, Result,
};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
