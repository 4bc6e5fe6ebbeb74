use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Result of storing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name the file was stored under. Differs from the requested name when
    /// that name was already taken.
    pub name: String,
    pub size: u64,
}

/// Flat, name-addressed file storage for uploads.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under `name`.
    async fn put(&self, name: &str, data: &[u8]) -> Result<StoredFile, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(name, reader).await
    }

    /// Store data from an async reader under `name` without replacing an
    /// existing file.
    async fn put_stream(&self, name: &str, reader: BoxReader) -> Result<StoredFile, StorageError>;

    /// Retrieve all bytes of a stored file.
    async fn get(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let (mut reader, _) = self.get_stream(name).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a stored file as a streaming reader, together with its size.
    async fn get_stream(&self, name: &str) -> Result<(BoxReader, u64), StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Local filesystem path of a stored file, for consumers that need a path
    /// rather than a stream.
    fn local_path(&self, name: &str) -> Result<PathBuf, StorageError>;
}
