use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::warn;

use super::error::StorageError;
use super::traits::{BoxReader, FileStore, StoredFile};

/// How many alternative names are tried before giving up on a collision.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Longest file name, in bytes, most filesystems accept.
const MAX_NAME_LEN: usize = 255;

/// Hex digits in the random suffix added to colliding names.
const SUFFIX_HEX_LEN: usize = 8;

/// Filesystem-backed upload store.
///
/// Files live directly under `{base_path}/{name}`. Names must be flat: no
/// separators, no leading dot.
pub struct FilesystemFileStore {
    base_path: PathBuf,
}

impl FilesystemFileStore {
    /// Create a new filesystem store, creating the directory if needed.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn file_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        check_flat_name(name)?;
        Ok(self.base_path.join(name))
    }
}

fn check_flat_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Build the `attempt`-th candidate name for `name`.
///
/// Attempt 0 is the name itself; later attempts insert a short random suffix
/// before the extension (`cat.png` -> `cat_1a2b3c4d.png`). The stem is
/// shortened so the candidate never exceeds [`MAX_NAME_LEN`] bytes.
fn candidate_name(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..SUFFIX_HEX_LEN];
    let suffix_len = SUFFIX_HEX_LEN + 1;
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && suffix_len + ext.len() + 1 < MAX_NAME_LEN => {
            let stem = truncate_at_boundary(stem, MAX_NAME_LEN - suffix_len - ext.len() - 1);
            format!("{stem}_{suffix}.{ext}")
        }
        _ => {
            let stem = truncate_at_boundary(name, MAX_NAME_LEN - suffix_len);
            format!("{stem}_{suffix}")
        }
    }
}

fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    async fn put_stream(
        &self,
        name: &str,
        mut reader: BoxReader,
    ) -> Result<StoredFile, StorageError> {
        check_flat_name(name)?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = candidate_name(name, attempt);
            let path = self.base_path.join(&candidate);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if attempt > 0 {
                warn!(requested = %name, stored = %candidate, "Upload name taken, storing under a new name");
            }

            let written = async {
                let size = tokio::io::copy(&mut reader, &mut file).await?;
                file.flush().await?;
                Ok::<u64, std::io::Error>(size)
            }
            .await;

            return match written {
                Ok(size) => Ok(StoredFile {
                    name: candidate,
                    size,
                }),
                Err(e) => {
                    drop(file);
                    let _ = fs::remove_file(&path).await;
                    Err(e.into())
                }
            };
        }

        Err(StorageError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name found for {name:?}"),
        )))
    }

    async fn get_stream(&self, name: &str) -> Result<(BoxReader, u64), StorageError> {
        let path = self.file_path(name)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }
        Ok((Box::new(BufReader::new(file)), meta.len()))
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let path = self.file_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn local_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        self.file_path(name)
    }
}
