use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::data::file_sink::FileSink;

/// Writes uploads into one local directory, which is also served under `/uploads`.
#[derive(Debug, Clone)]
pub(crate) struct LocalFileSink {
    upload_dir: PathBuf,
}

impl LocalFileSink {
    pub(crate) fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }
}

#[async_trait]
impl FileSink for LocalFileSink {
    async fn write_file(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.upload_dir).await?;
        fs::write(self.upload_dir.join(file_name), bytes).await
    }

    async fn remove_file(&self, file_name: &str) -> std::io::Result<()> {
        match fs::remove_file(self.upload_dir.join(file_name)).await {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
