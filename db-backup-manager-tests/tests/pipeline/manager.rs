//! BackupManager against unreachable servers
//!
//! Sources built by the builder point at 127.0.0.1:1, so enumeration is
//! refused straight away and no dump is ever attempted.

use db_backup_manager::managers::backup::BackupManager;
use db_backup_manager::utils::locker::BackupLock;
use std::sync::Arc;
use test_utils::{ConfigBuilder, LogCapture, MockExecutor, TestContext};

fn manager(ctx: &TestContext, executor: Arc<MockExecutor>) -> BackupManager {
    BackupManager::with_executor(
        ctx.config().unwrap().clone(),
        ctx.resolved_sources(),
        executor,
    )
}

#[test]
fn test_unreachable_source_stores_nothing() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source("main"));
    let executor = Arc::new(MockExecutor::new());
    let capture = LogCapture::new();

    let report = capture
        .run(|| manager(&ctx, executor.clone()).backup_source("main"))
        .unwrap();

    assert!(report.bucket.is_none());
    assert!(report.files.is_empty());
    assert_eq!(executor.call_count(), 0);
    assert_eq!(capture.lines_at("ERROR").len(), 1);
    assert!(capture.contents().contains("No databases found."));
}

#[test]
fn test_unreachable_postgres_source_stores_nothing() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_postgres_source("pg"));
    let executor = Arc::new(MockExecutor::new());

    let report = manager(&ctx, executor.clone()).backup_source("pg").unwrap();

    assert!(report.bucket.is_none());
    assert_eq!(executor.call_count(), 0);
}

#[test]
fn test_disabled_source_is_skipped() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_disabled_source("old"));
    let capture = LogCapture::new();

    let report = capture
        .run(|| manager(&ctx, Arc::new(MockExecutor::new())).backup_source("old"))
        .unwrap();

    assert!(report.bucket.is_none());
    assert!(capture.contents().contains("disabled"));
    assert_eq!(capture.lines_at("ERROR").len(), 0);
}

#[test]
fn test_unknown_source_is_error() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source("main"));
    let result = manager(&ctx, Arc::new(MockExecutor::new())).backup_source("missing");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_backup_all_runs_every_enabled_source() {
    let builder = ConfigBuilder::minimal()
        .add_source("a")
        .add_postgres_source("b")
        .add_disabled_source("c");
    let ctx = TestContext::from_builder(builder);
    let capture = LogCapture::new();

    capture
        .run(|| manager(&ctx, Arc::new(MockExecutor::new())).backup_all())
        .unwrap();

    // One connection error per enabled source
    assert_eq!(capture.lines_at("ERROR").len(), 2);
    assert!(capture.contents().contains("2 succeeded, 0 failed"));
}

#[test]
fn test_overlapping_run_is_refused() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source("main"));
    let lock_dir = ctx.config().unwrap().global.lock_directory.clone();
    let _held = BackupLock::acquire(&lock_dir, "main").unwrap();

    let result = manager(&ctx, Arc::new(MockExecutor::new())).backup_source("main");

    assert!(result.is_err());
}

#[test]
fn test_list_sources_sorted() {
    let builder = ConfigBuilder::minimal()
        .add_source("zeta")
        .add_source("alpha");
    let ctx = TestContext::from_builder(builder);

    let names = manager(&ctx, Arc::new(MockExecutor::new())).list_sources();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[test]
fn test_list_databases_of_unreachable_source_is_empty() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source("main"));
    let databases = manager(&ctx, Arc::new(MockExecutor::new()))
        .list_databases("main")
        .unwrap();
    assert!(databases.is_empty());
}
