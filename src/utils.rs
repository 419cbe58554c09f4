use crate::error::MonitorError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = "air_quality_monitor";

/// Default directory for downloaded granules, under the user cache dir.
pub fn default_data_dir() -> Result<PathBuf, MonitorError> {
    dirs::cache_dir()
        .ok_or(MonitorError::DataDirResolution)
        .map(|p| p.join(DATA_DIR_NAME))
}

pub async fn ensure_data_dir_exists(path: &Path) -> Result<(), MonitorError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(MonitorError::DataDirCreation(
            path.to_path_buf(),
            io::Error::new(io::ErrorKind::AlreadyExists, "path exists but is not a directory"),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| MonitorError::DataDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(MonitorError::DataDirCreation(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_dir() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_data_dir_exists(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Second call is a no-op.
        ensure_data_dir_exists(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_in_the_way() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            ensure_data_dir_exists(file.path()).await,
            Err(MonitorError::DataDirCreation(..))
        ));
    }
}
