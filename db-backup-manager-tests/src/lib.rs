//! Test utilities for db-backup-manager
//!
//! This crate provides shared test utilities, log capture, and helper
//! functions for testing the db-backup-manager pipeline.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ConfigBuilder, TestContext, MockExecutor};
//!
//! #[test]
//! fn my_test() {
//!     let ctx = TestContext::from_builder(
//!         ConfigBuilder::minimal().add_source("main"),
//!     );
//!     // ... test code
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod log_capture;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fixtures::*;
pub use log_capture::LogCapture;
pub use test_context::TestContext;

// Re-export types from the main crate for convenience
pub use db_backup_manager::config::{
    Config, DatabaseEngineKind, GlobalConfig, ResolvedSourceConfig, SourceConfig,
    StrategyConfig, StrategyProvider, TargetConfig, TargetType,
};
pub use db_backup_manager::context::RunContext;
pub use db_backup_manager::sources::{BackupFile, DatabaseSource};

// Re-export mock implementations from the main crate
pub use db_backup_manager::sources::mock::MockEngine;
pub use db_backup_manager::targets::mock::{MockTarget, TargetCall};
pub use db_backup_manager::utils::executor::mock::{MockExecutor, MockResponse};
pub use db_backup_manager::utils::executor::DumpExecutor;

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
