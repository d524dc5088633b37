use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A dump produced for one database
///
/// `created_on` is only set once the dump is confirmed on disk; files
/// without it are never handed to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    directory: PathBuf,
    file_name: String,
    created_on: Option<DateTime<Utc>>,
}

impl BackupFile {
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
            created_on: None,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        self.created_on
    }

    pub fn mark_created(&mut self, at: DateTime<Utc>) {
        self.created_on = Some(at);
    }
}
