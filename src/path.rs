//! Path decomposition helpers shared by the filters.

use std::path::Path;

/// A path split into directory, stem, and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    /// Directory portion (`"."` for a bare file name).
    pub dirname: String,
    /// File name without its extension.
    pub basename: String,
    /// Extension including the leading dot, or empty.
    pub extension: String,
}

/// Split `path` into its [`PathParts`].
///
/// Mirrors the usual dirname/basename/extname convention: a leading dot on
/// a file name (`.htaccess`) is part of the basename, not an extension.
///
/// # Examples
///
/// ```
/// use gsdl::path::split;
///
/// let parts = split("site/css/app.css.map");
/// assert_eq!(parts.dirname, "site/css");
/// assert_eq!(parts.basename, "app.css");
/// assert_eq!(parts.extension, ".map");
/// ```
#[must_use]
pub fn split(path: impl AsRef<Path>) -> PathParts {
    let path = path.as_ref();
    let dirname = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        Some(_) => ".".to_string(),
        None => path.to_string_lossy().into_owned(),
    };
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let basename = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    PathParts {
        dirname,
        basename,
        extension,
    }
}
