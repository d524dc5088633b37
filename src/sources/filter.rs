//! Include/exclude rules for database names
//!
//! Rules are shell-style wildcards (`*` matches any run of characters,
//! `?` exactly one) matched against the whole name, case-sensitively.

use regex::Regex;

#[derive(Debug, thiserror::Error)]
#[error("Invalid filter rule '{rule}': {reason}")]
pub struct FilterError {
    pub rule: String,
    pub reason: String,
}

/// Compiled include/exclude rule set
#[derive(Debug, Clone, Default)]
pub struct DatabaseFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl DatabaseFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, FilterError> {
        Ok(Self {
            include: compile_rules(include)?,
            exclude: compile_rules(exclude)?,
        })
    }

    /// Whether a database name passes the rules
    ///
    /// An empty include list admits every name; excludes always win.
    pub fn is_match(&self, name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|r| r.is_match(name));
        included && !self.exclude.iter().any(|r| r.is_match(name))
    }

    /// Apply the rules, preserving the input order
    pub fn apply(&self, names: Vec<String>) -> Vec<String> {
        names.into_iter().filter(|n| self.is_match(n)).collect()
    }
}

fn compile_rules(rules: &[String]) -> Result<Vec<Regex>, FilterError> {
    rules.iter().map(|rule| compile_wildcard(rule)).collect()
}

fn compile_wildcard(rule: &str) -> Result<Regex, FilterError> {
    if rule.trim().is_empty() {
        return Err(FilterError {
            rule: rule.to_string(),
            reason: "rule is empty".to_string(),
        });
    }

    let mut pattern = String::with_capacity(rule.len() + 8);
    pattern.push('^');
    for ch in rule.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');

    Regex::new(&pattern).map_err(|e| FilterError {
        rule: rule.to_string(),
        reason: e.to_string(),
    })
}
