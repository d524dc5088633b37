//! Pipeline tests for db-backup-manager
//!
//! Sources run against a mock engine and mock executor, storing into a real
//! local target under a temp dir.

mod manager;
mod scenarios;
