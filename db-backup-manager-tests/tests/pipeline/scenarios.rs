//! End-to-end scenarios of one source run

use db_backup_manager::managers::backup::run_pipeline;
use db_backup_manager::strategies::PruneOutcome;
use db_backup_manager::targets::{LocalTarget, TargetStore};
use std::sync::Arc;
use test_utils::{
    mock_source, run_context, ConfigBuilder, LogCapture, MockExecutor, MockResponse,
    StrategyProvider, TestContext,
};

fn local_target(ctx: &TestContext) -> Arc<dyn TargetStore> {
    let config = ctx.config().unwrap();
    Arc::new(LocalTarget::new("local", &config.targets["local"].path))
}

#[test]
fn test_timed_out_database_is_skipped() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source("main"));
    let executor = Arc::new(MockExecutor::new().expect("logs", MockResponse::Timeout));
    let source = mock_source(ctx.source("main"), &["app", "logs"], executor.clone());
    let capture = LogCapture::new();

    let report = capture
        .run(|| run_pipeline(&source, local_target(&ctx), &ctx.staging_dir("main"), run_context()))
        .unwrap();

    let names: Vec<&str> = report.files.iter().map(|f| f.file_name()).collect();
    assert_eq!(names, vec!["app.sql"]);
    assert_eq!(executor.dumped_databases(), vec!["app", "logs"]);

    let errors = capture.lines_at("ERROR");
    assert_eq!(errors.len(), 1, "unexpected errors: {:?}", errors);
    assert!(errors[0].contains("logs"));

    assert_eq!(ctx.bucket_files("local", "2024-03-10"), vec!["app.sql"]);
}

#[test]
fn test_seven_day_window_removes_one_bucket() {
    let builder = ConfigBuilder::minimal()
        .add_source("main")
        .with_strategy("main", StrategyProvider::Days, 7);
    let ctx = TestContext::from_builder(builder);
    ctx.create_file("backups/2024-03-03/app.sql", "a week old");
    ctx.create_file("backups/2024-03-04/app.sql", "six days old");

    let source = mock_source(ctx.source("main"), &["app"], Arc::new(MockExecutor::new()));
    let report =
        run_pipeline(&source, local_target(&ctx), &ctx.staging_dir("main"), run_context())
            .unwrap();

    assert_eq!(report.bucket.as_deref(), Some("2024-03-10"));
    assert_eq!(
        report.prune,
        Some(PruneOutcome::Deleted {
            bucket: "2024-03-03".to_string()
        })
    );
    assert!(!ctx.file_exists("backups/2024-03-03"));
    assert!(ctx.file_exists("backups/2024-03-04/app.sql"));
    assert_eq!(
        ctx.read_file("backups/2024-03-10/app.sql").unwrap(),
        "-- dump of app\n"
    );
}

#[test]
fn test_second_run_same_day_overwrites() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source("main"));
    let target = local_target(&ctx);
    let staging = ctx.staging_dir("main");

    let first = mock_source(ctx.source("main"), &["app", "old"], Arc::new(MockExecutor::new()));
    run_pipeline(&first, target.clone(), &staging, run_context()).unwrap();

    let second = mock_source(ctx.source("main"), &["app"], Arc::new(MockExecutor::new()));
    run_pipeline(&second, target, &staging, run_context()).unwrap();

    // Same bucket; files from the earlier run that were not re-dumped stay
    assert_eq!(
        ctx.bucket_files("local", "2024-03-10"),
        vec!["app.sql", "old.sql"]
    );
}

#[test]
fn test_unwritable_target_fails_the_run() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source("main"));
    // A regular file where the target root should be
    let blocked = ctx.create_file("blocked", "not a directory");
    let target: Arc<dyn TargetStore> = Arc::new(LocalTarget::new("local", &blocked));

    let source = mock_source(ctx.source("main"), &["app"], Arc::new(MockExecutor::new()));
    let result = run_pipeline(&source, target, &ctx.staging_dir("main"), run_context());

    assert!(result.is_err());
}

#[test]
fn test_failed_prune_is_logged_once() {
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source("main"));
    let target = Arc::new(test_utils::MockTarget::new().with_failing_delete());
    let source = mock_source(ctx.source("main"), &["app"], Arc::new(MockExecutor::new()));
    let capture = LogCapture::new();

    let report = capture
        .run(|| run_pipeline(&source, target.clone(), &ctx.staging_dir("main"), run_context()))
        .unwrap();

    assert!(matches!(report.prune, Some(PruneOutcome::Failed { .. })));
    let errors = capture.lines_at("ERROR");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("2024-03-03"));
    assert_eq!(target.saved_buckets(), vec!["2024-03-10"]);
}
