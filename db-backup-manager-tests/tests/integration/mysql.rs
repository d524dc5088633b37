//! MySQL integration tests
//!
//! Run with: `cargo test -p db-backup-manager-tests --test integration -- --ignored`

use super::common::{docker_exec, is_docker_available, is_tool_available, wait_until, ContainerGuard};
use anyhow::Result;
use db_backup_manager::managers::backup::BackupManager;
use std::process::Command;
use test_utils::{
    ConfigBuilder, DatabaseEngineKind, SourceConfig, StrategyConfig, StrategyProvider,
    TestContext,
};

const PORT: u16 = 33069;

fn start_mysql(container: &ContainerGuard) -> Result<()> {
    let port_mapping = format!("{}:3306", PORT);
    let status = Command::new("docker")
        .args([
            "run",
            "-d",
            "--name",
            container.name(),
            "-e",
            "MYSQL_ROOT_PASSWORD=testpass",
            "-p",
            &port_mapping,
            "mysql:8.0",
        ])
        .status()?;
    anyhow::ensure!(status.success(), "Failed to start MySQL container");

    // The entrypoint restarts the server once after init, so wait for TCP
    let ready = wait_until(120, || {
        docker_exec(
            container.name(),
            &["mysql", "-h127.0.0.1", "-uroot", "-ptestpass", "-e", "SELECT 1"],
        )
        .is_ok()
    });
    anyhow::ensure!(ready, "MySQL failed to become ready");
    Ok(())
}

fn mysql(container: &ContainerGuard, sql: &str) -> Result<String> {
    docker_exec(
        container.name(),
        &["mysql", "-h127.0.0.1", "-uroot", "-ptestpass", "-e", sql],
    )
}

fn source() -> SourceConfig {
    SourceConfig {
        enabled: true,
        engine: DatabaseEngineKind::Mysql,
        description: "Docker MySQL".to_string(),
        host: "127.0.0.1".to_string(),
        port: Some(PORT),
        user: "root".to_string(),
        password: "testpass".to_string(),
        connect_database: None,
        timeout_seconds: Some(60),
        include: vec![],
        exclude: vec!["scratch_*".to_string()],
        include_system_databases: false,
        target: "local".to_string(),
        strategy: StrategyConfig {
            provider: StrategyProvider::Days,
            revisions: 7,
        },
    }
}

#[test]
#[ignore] // Requires Docker and mysqldump
fn test_mysql_pipeline() {
    if !is_docker_available() || !is_tool_available("mysqldump") {
        println!("Docker or mysqldump not available, skipping test");
        return;
    }

    let container = ContainerGuard::new("db-backup-test-mysql");
    start_mysql(&container).expect("Failed to start MySQL");

    mysql(
        &container,
        "CREATE DATABASE app; CREATE DATABASE scratch_1; \
         CREATE TABLE app.orders (id INT PRIMARY KEY, item TEXT); \
         INSERT INTO app.orders VALUES (1, 'widget');",
    )
    .unwrap();

    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source_config("main", source()));
    let manager = BackupManager::new(ctx.config().unwrap().clone(), ctx.resolved_sources());

    // System schemas and the excluded scratch database are filtered out
    assert_eq!(manager.list_databases("main").unwrap(), vec!["app"]);

    let report = manager.backup_source("main").unwrap();
    let bucket = report.bucket.expect("Backup should have been stored");

    assert_eq!(ctx.bucket_files("local", &bucket), vec!["app.sql"]);
    let dump = std::fs::read_to_string(ctx.bucket_dir("local", &bucket).join("app.sql")).unwrap();
    assert!(dump.contains("CREATE TABLE `orders`"));
    assert!(dump.contains("widget"));
}

#[test]
#[ignore] // Requires Docker
fn test_mysql_unknown_user_means_no_databases() {
    if !is_docker_available() {
        println!("Docker not available, skipping test");
        return;
    }

    let container = ContainerGuard::new("db-backup-test-mysql-auth");
    start_mysql(&container).expect("Failed to start MySQL");

    let mut config = source();
    config.user = "nobody".to_string();
    let ctx = TestContext::from_builder(ConfigBuilder::minimal().add_source_config("main", config));
    let manager = BackupManager::new(ctx.config().unwrap().clone(), ctx.resolved_sources());

    let report = manager.backup_source("main").unwrap();
    assert!(report.bucket.is_none());
}
