use async_trait::async_trait;

/// Destination for uploaded files, addressed by bare file name.
#[async_trait]
pub(crate) trait FileSink: Send + Sync {
    async fn write_file(&self, file_name: &str, bytes: &[u8]) -> std::io::Result<()>;

    /// Removes a previously written file; a missing file is not an error.
    async fn remove_file(&self, file_name: &str) -> std::io::Result<()>;
}
