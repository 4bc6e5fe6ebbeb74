use std::fmt;

/// Errors that can occur during upload storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested file was not found.
    NotFound(String),
    /// The name is not a flat, visible filename.
    InvalidName(String),
    /// An I/O error occurred.
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "file not found: {name}"),
            Self::InvalidName(name) => write!(f, "invalid stored filename: {name:?}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
