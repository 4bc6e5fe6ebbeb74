/// Longest stored filename; longer names keep their extension and lose the
/// tail of the stem.
pub const MAX_FILENAME_LEN: usize = 255;

/// Result of validating a flat filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains path traversal patterns (`..`).
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
///
/// Used on names that arrive in URLs, which must already be in stored form.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    if filename.is_empty() || filename.trim().is_empty() {
        return Err(FilenameError::Empty);
    }

    if filename.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    if filename.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if filename.contains('/') || filename.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if filename == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if filename.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(filename)
}

/// Turn a client-supplied upload name into one that is safe to use as a single
/// path segment.
///
/// Non-ASCII characters are dropped, path separators become word breaks,
/// whitespace runs are joined with `_`, anything outside `[A-Za-z0-9._-]` is
/// removed and leading/trailing `.` and `_` are stripped. The result may be
/// empty, which callers must treat as an invalid name.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();

    truncate_preserving_extension(kept.trim_matches(|c| c == '.' || c == '_'))
}

fn truncate_preserving_extension(name: &str) -> String {
    if name.len() <= MAX_FILENAME_LEN {
        return name.to_string();
    }
    // ASCII only at this point, so byte offsets are char offsets.
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() < 16 => {
            let keep = MAX_FILENAME_LEN - ext.len() - 1;
            format!("{}.{ext}", &stem[..keep.min(stem.len())])
        }
        _ => name[..MAX_FILENAME_LEN].to_string(),
    }
}
