//! Unit tests for configuration loading and validation
//!
//! These tests verify config parsing, validation, and source resolution.

use db_backup_manager::config::{
    load_config, parse_config, resolve_all_sources, ConfigError, DatabaseEngineKind,
    StrategyProvider,
};
use rstest::rstest;
use std::time::Duration;
use test_utils::{
    minimal_config_toml, multi_source_config_toml, render_config, ConfigBuilder, TestContext,
};

#[test]
fn test_config_loading_valid() {
    let (config_path, _temp_dir) = ConfigBuilder::minimal().add_source("main").write();

    let loaded = load_config(&config_path);
    assert!(loaded.is_ok(), "Config should load successfully: {:?}", loaded.err());
    assert!(loaded.unwrap().sources.contains_key("main"));
}

#[test]
fn test_minimal_template_defaults() {
    let ctx = TestContext::new();
    let config = parse_config(&render_config(minimal_config_toml(), ctx.temp_dir())).unwrap();

    assert_eq!(config.global.default_timeout_seconds, 3600);
    assert_eq!(config.global.log_level, "info");

    let resolved = resolve_all_sources(&config).unwrap();
    let main = &resolved["main"];
    assert!(main.enabled);
    assert_eq!(main.timeout(), Duration::from_secs(3600));
    assert!(main.include.is_empty());
    assert!(!main.include_system_databases);
}

#[test]
fn test_multi_source_resolution() {
    let ctx = TestContext::new();
    let config =
        parse_config(&render_config(multi_source_config_toml(), ctx.temp_dir())).unwrap();
    let resolved = resolve_all_sources(&config).unwrap();

    assert_eq!(resolved.len(), 3);

    let shop = &resolved["shop"];
    assert_eq!(shop.engine, DatabaseEngineKind::Mysql);
    assert_eq!(shop.timeout_seconds, 120);
    assert_eq!(shop.exclude, vec!["test_*", "tmp?"]);
    assert_eq!(shop.strategy.revisions, 14);

    let analytics = &resolved["analytics"];
    assert_eq!(analytics.engine, DatabaseEngineKind::Postgres);
    assert_eq!(analytics.port, Some(5433));
    assert_eq!(analytics.timeout_seconds, 900);
    assert_eq!(analytics.strategy.provider, StrategyProvider::Weeks);

    assert!(!resolved["legacy"].enabled);
}

#[test]
fn test_invalid_toml() {
    let ctx = TestContext::new();
    let config_path = ctx.create_file("config.toml", "invalid { toml content");

    let result = load_config(&config_path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_missing_file() {
    let ctx = TestContext::new();
    let result = load_config(ctx.temp_dir().join("missing.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_unknown_target() {
    let ctx = TestContext::new();
    let contents = render_config(minimal_config_toml(), ctx.temp_dir())
        .replace("target = \"local\"", "target = \"offsite\"");

    let result = parse_config(&contents);
    assert!(matches!(result, Err(ConfigError::TargetNotFound(name)) if name == "offsite"));
}

#[test]
fn test_unknown_engine() {
    let ctx = TestContext::new();
    let contents = render_config(minimal_config_toml(), ctx.temp_dir())
        .replace("engine = \"mysql\"", "engine = \"oracle\"");

    assert!(matches!(parse_config(&contents), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_zero_timeout_rejected() {
    let ctx = TestContext::new();
    let contents = render_config(minimal_config_toml(), ctx.temp_dir())
        .replace("port = 1", "port = 1\ntimeout_seconds = 0");

    let result = parse_config(&contents);
    assert!(matches!(result, Err(ConfigError::ValidationError(msg)) if msg.contains("timeout")));
}

#[rstest]
#[case("../victim")]
#[case("nested/name")]
#[case("back\\slash")]
#[case("..")]
#[case(".")]
fn test_unsafe_source_names_rejected(#[case] name: &str) {
    let ctx = TestContext::new();
    let contents = render_config(minimal_config_toml(), ctx.temp_dir())
        .replace("[sources.main]", &format!("[sources.{:?}]", name));

    let result = parse_config(&contents);
    assert!(
        matches!(&result, Err(ConfigError::ValidationError(msg)) if msg.contains("Invalid source name")),
        "{:?} should be rejected, got {:?}",
        name,
        result.map(|_| ())
    );
}

#[test]
fn test_config_without_targets_rejected() {
    let ctx = TestContext::new();
    let contents = format!(
        "[global]\nstaging_directory = \"{}\"\n\n[targets]\n",
        ctx.temp_dir().to_string_lossy().replace('\\', "/")
    );

    assert!(matches!(
        parse_config(&contents),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_disabled_source_preserved() {
    let config = ConfigBuilder::minimal()
        .add_source("source1")
        .add_source("source2")
        .add_disabled_source("source3")
        .build();

    let sources = resolve_all_sources(&config).unwrap();
    assert_eq!(sources.len(), 3);
    assert!(sources["source1"].enabled);
    assert!(sources["source2"].enabled);
    assert!(!sources["source3"].enabled);
}

#[test]
fn test_password_not_in_debug_output() {
    let config = ConfigBuilder::minimal().add_source("main").build();
    let sources = resolve_all_sources(&config).unwrap();

    let debug = format!("{:?}", sources["main"]);
    assert!(!debug.contains("test-password"));
}
