//! Local directory target: `<root>/<bucket>/<file>`

use super::{validate_bucket, TargetError, TargetStore};
use crate::sources::BackupFile;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct LocalTarget {
    name: String,
    root: PathBuf,
}

impl LocalTarget {
    pub fn new(name: &str, root: &Path) -> Self {
        Self {
            name: name.to_string(),
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, TargetError> {
        validate_bucket(bucket)?;
        Ok(self.root.join(bucket))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TargetError + '_ {
    move |source| TargetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl TargetStore for LocalTarget {
    fn name(&self) -> &str {
        &self.name
    }

    fn save(&self, bucket: &str, files: &[BackupFile]) -> Result<(), TargetError> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        for file in files {
            if file.created_on().is_none() {
                return Err(TargetError::NotCreated(file.path()));
            }

            let source = file.path();
            let destination = dir.join(file.file_name());
            fs::copy(&source, &destination).map_err(io_error(&source))?;
            debug!("Stored {:?} as {:?}", source, destination);
        }

        info!(
            "Saved {} file(s) to target '{}' under {}",
            files.len(),
            self.name,
            bucket
        );
        Ok(())
    }

    fn delete_directory(&self, bucket: &str) -> Result<(), TargetError> {
        let dir = self.bucket_dir(bucket)?;

        if !dir.exists() {
            debug!("Bucket {} not present on target '{}'", bucket, self.name);
            return Ok(());
        }

        fs::remove_dir_all(&dir).map_err(io_error(&dir))?;
        info!("Deleted bucket {} from target '{}'", bucket, self.name);
        Ok(())
    }
}
