//! Backup targets
//!
//! A target persists a batch of dumps under a bucket key (for example a
//! calendar day) and can drop a whole bucket again.

pub mod local;

pub use local::LocalTarget;

use crate::config::{TargetConfig, TargetType};
use crate::sources::BackupFile;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid bucket key '{0}'")]
    InvalidBucket(String),

    #[error("Backup file {0:?} was never created")]
    NotCreated(PathBuf),
}

/// Storage sink for completed backups
pub trait TargetStore: Send + Sync {
    /// Target name (for logging)
    fn name(&self) -> &str;

    /// Persist files under `bucket`, replacing same-named files already there
    fn save(&self, bucket: &str, files: &[BackupFile]) -> Result<(), TargetError>;

    /// Remove everything stored under `bucket`
    fn delete_directory(&self, bucket: &str) -> Result<(), TargetError>;
}

/// Create a target store from its configuration
pub fn create_target(name: &str, config: &TargetConfig) -> Box<dyn TargetStore> {
    match config.target_type {
        TargetType::Local => Box::new(LocalTarget::new(name, &config.path)),
    }
}

/// Bucket keys become directory names
pub(crate) fn validate_bucket(bucket: &str) -> Result<(), TargetError> {
    let invalid = bucket.is_empty()
        || bucket == "."
        || bucket == ".."
        || bucket.contains(['/', '\\', '\0']);

    if invalid {
        return Err(TargetError::InvalidBucket(bucket.to_string()));
    }
    Ok(())
}

/// Mock target for testing
/// Available for use in external test crates
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Recorded target call
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum TargetCall {
        Save { bucket: String, files: Vec<String> },
        DeleteDirectory { bucket: String },
    }

    /// Mock target that records calls and can be told to fail
    #[derive(Clone, Default)]
    pub struct MockTarget {
        pub calls: Arc<Mutex<Vec<TargetCall>>>,
        fail_save: bool,
        fail_delete: bool,
    }

    impl MockTarget {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_failing_save(mut self) -> Self {
            self.fail_save = true;
            self
        }

        pub fn with_failing_delete(mut self) -> Self {
            self.fail_delete = true;
            self
        }

        pub fn get_calls(&self) -> Vec<TargetCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Buckets passed to `delete_directory`, in call order
        pub fn deleted_buckets(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter_map(|c| match c {
                    TargetCall::DeleteDirectory { bucket } => Some(bucket.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Buckets passed to `save`, in call order
        pub fn saved_buckets(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter_map(|c| match c {
                    TargetCall::Save { bucket, .. } => Some(bucket.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl TargetStore for MockTarget {
        fn name(&self) -> &str {
            "mock"
        }

        fn save(&self, bucket: &str, files: &[BackupFile]) -> Result<(), TargetError> {
            self.calls.lock().unwrap().push(TargetCall::Save {
                bucket: bucket.to_string(),
                files: files.iter().map(|f| f.file_name().to_string()).collect(),
            });
            if self.fail_save {
                return Err(TargetError::Io {
                    path: PathBuf::from(bucket),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            Ok(())
        }

        fn delete_directory(&self, bucket: &str) -> Result<(), TargetError> {
            self.calls.lock().unwrap().push(TargetCall::DeleteDirectory {
                bucket: bucket.to_string(),
            });
            if self.fail_delete {
                return Err(TargetError::Io {
                    path: PathBuf::from(bucket),
                    source: std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        "permission denied",
                    ),
                });
            }
            Ok(())
        }
    }
}
