//! Tests for include/exclude rules on database names

use db_backup_manager::sources::filter::DatabaseFilter;
use rstest::rstest;

fn filter(include: &[&str], exclude: &[&str]) -> DatabaseFilter {
    let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
    let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
    DatabaseFilter::new(&include, &exclude).unwrap()
}

#[rstest]
#[case(&[], &[], "anything", true)]
#[case(&["app"], &[], "app", true)]
#[case(&["app"], &[], "app2", false)]
#[case(&["app*"], &[], "app_prod", true)]
#[case(&["app*"], &[], "myapp", false)]
#[case(&["db?"], &[], "db1", true)]
#[case(&["db?"], &[], "db10", false)]
#[case(&[], &["test_*"], "test_users", false)]
#[case(&[], &["test_*"], "users_test", true)]
#[case(&["*"], &["tmp"], "tmp", false)]
#[case(&["shop.*"], &[], "shopXorders", false)]
#[case(&["shop.*"], &[], "shop.orders", true)]
fn test_wildcard_rules(
    #[case] include: &[&str],
    #[case] exclude: &[&str],
    #[case] name: &str,
    #[case] expected: bool,
) {
    assert_eq!(filter(include, exclude).is_match(name), expected);
}

#[test]
fn test_apply_keeps_server_order() {
    let rules = filter(&["app*", "billing"], &["app_test"]);
    let names = vec![
        "billing".to_string(),
        "app_test".to_string(),
        "logs".to_string(),
        "app".to_string(),
    ];

    assert_eq!(rules.apply(names), vec!["billing", "app"]);
}

#[test]
fn test_rules_are_case_sensitive() {
    assert!(!filter(&["App"], &[]).is_match("app"));
}

#[test]
fn test_blank_rule_rejected() {
    let result = DatabaseFilter::new(&["  ".to_string()], &[]);
    assert!(result.is_err());
}
