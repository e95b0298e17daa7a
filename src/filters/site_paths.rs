//! Link helpers relative to a record's place in the output tree.
//!
//! Output paths mirror source paths below the record's base, so a link
//! computed between source locations is valid between output locations.
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use minijinja::value::{Object, Value, from_args};
use minijinja::{Error, ErrorKind, State};

use crate::error::FilterError;
use crate::path::split;
use crate::pipeline::{FileRecord, Filter};

const INDEX: &str = "index.html";

/// `relpath` and `docpath` for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    path: PathBuf,
    base: PathBuf,
}

/// Join `target` onto `base`, treating a leading `/` as the base itself and
/// folding `.` and `..` lexically.
fn join_site(base: &Path, target: &str) -> PathBuf {
    let mut out = base.to_path_buf();
    for component in Path::new(target.trim_start_matches('/')).components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

fn to_web(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl SitePaths {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, base: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
        }
    }

    fn error(&self, message: impl Into<String>) -> FilterError {
        FilterError::SitePath {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }

    fn resolve(&self, target: &str) -> Result<String, FilterError> {
        if target.is_empty() {
            return Ok(String::new());
        }

        let (target_dir, target_name) = if target == "/" {
            (self.base.clone(), String::new())
        } else {
            let file = join_site(&self.base, target);
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let dir = file.parent().map(Path::to_path_buf).unwrap_or(file);
            (dir, name)
        };

        let source_dir = self
            .path
            .parent()
            .ok_or_else(|| self.error("file has no parent directory"))?;
        let rel = pathdiff::diff_paths(&target_dir, source_dir).ok_or_else(|| {
            self.error(format!(
                "cannot relate {} to {}",
                target_dir.display(),
                source_dir.display()
            ))
        })?;

        let joined = to_web(&rel.join(&target_name));
        Ok(if joined.is_empty() { ".".to_string() } else { joined })
    }

    /// Path from this record's directory to `target`, given as an absolute
    /// site path (`/css/app.css`). `"/"` yields a bare directory reference.
    /// An empty target yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the two locations cannot be related.
    pub fn relpath(&self, target: &str) -> Result<String, FilterError> {
        self.resolve(target)
    }

    /// Like [`relpath`](Self::relpath), for documents: a trailing `/` or a
    /// missing extension means the directory's `index.html`. Never returns
    /// an empty or absolute path; those become `index.html`.
    ///
    /// # Errors
    ///
    /// Returns an error if the two locations cannot be related.
    pub fn docpath(&self, target: &str) -> Result<String, FilterError> {
        if target.is_empty() {
            return Ok(INDEX.to_string());
        }
        let mut query = target.to_string();
        if query.ends_with('/') {
            query.push_str(INDEX);
        }
        if split(&query).extension.is_empty() {
            query.push('/');
            query.push_str(INDEX);
        }
        let rel = self.resolve(&query)?;
        if rel.is_empty() || rel.starts_with('/') {
            Ok(INDEX.to_string())
        } else {
            Ok(rel)
        }
    }
}

impl Object for SitePaths {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        let (target,): (Option<&str>,) = from_args(args)?;
        let target = target.unwrap_or_default();
        let resolved = match method {
            "relpath" => self.relpath(target),
            "docpath" => self.docpath(target),
            _ => return Err(Error::from(ErrorKind::UnknownMethod)),
        };
        resolved
            .map(Value::from)
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
    }
}

/// Attaches [`SitePaths`] to each record's `site` data.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttachSitePaths;

impl Filter for AttachSitePaths {
    fn name(&self) -> &'static str {
        "site-paths"
    }

    fn apply(&self, mut record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        if !record.path.is_absolute() || !record.base.is_absolute() {
            return Err(FilterError::SitePath {
                path: record.display_path(),
                message: "source path and base must be absolute".to_string(),
            });
        }
        record.data.site = Some(SitePaths::new(record.path.clone(), record.base.clone()));
        Ok(Some(record))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::Contents;

    fn site(path: &str) -> SitePaths {
        SitePaths::new(path, "/p/html")
    }

    #[test]
    fn relpath_to_sibling_directory() {
        let s = site("/p/html/about/team.html");
        assert_eq!(s.relpath("/css/app.css").unwrap(), "../css/app.css");
    }

    #[test]
    fn relpath_from_root_level_file() {
        let s = site("/p/html/index.html");
        assert_eq!(s.relpath("/css/app.css").unwrap(), "css/app.css");
    }

    #[test]
    fn relpath_root_is_a_directory_reference() {
        assert_eq!(site("/p/html/index.html").relpath("/").unwrap(), ".");
        assert_eq!(site("/p/html/a/b/c.html").relpath("/").unwrap(), "../..");
    }

    #[test]
    fn relpath_empty_target_is_empty() {
        assert_eq!(site("/p/html/index.html").relpath("").unwrap(), "");
    }

    #[test]
    fn relpath_folds_parent_segments() {
        let s = site("/p/html/blog/post.html");
        assert_eq!(s.relpath("/blog/../img/x.png").unwrap(), "../img/x.png");
    }

    #[test]
    fn docpath_root_is_index() {
        assert_eq!(site("/p/html/index.html").docpath("/").unwrap(), "index.html");
        assert_eq!(site("/p/html/index.html").docpath("").unwrap(), "index.html");
    }

    #[test]
    fn docpath_trailing_slash_targets_index() {
        let s = site("/p/html/about/team.html");
        assert_eq!(s.docpath("/about/").unwrap(), "index.html");
        let s = site("/p/html/blog/post.html");
        assert_eq!(s.docpath("/about/").unwrap(), "../about/index.html");
    }

    #[test]
    fn docpath_without_extension_targets_index() {
        let s = site("/p/html/index.html");
        assert_eq!(s.docpath("/about").unwrap(), "about/index.html");
    }

    #[test]
    fn docpath_with_extension_is_kept() {
        let s = site("/p/html/blog/post.html");
        assert_eq!(s.docpath("/contact.html").unwrap(), "../contact.html");
    }

    #[test]
    fn attach_requires_absolute_paths() {
        let record = FileRecord::new("rel/a.html", "rel", Contents::Empty);
        let err = AttachSitePaths.apply(record).unwrap_err();
        assert!(err.to_string().starts_with("Error adding relative path to rel/a.html"));
    }

    #[test]
    fn attach_sets_site_data() {
        let record = FileRecord::new("/p/html/a.html", "/p/html", Contents::Empty);
        let out = AttachSitePaths.apply(record).unwrap().unwrap();
        let s = out.data.site.unwrap();
        assert_eq!(s.relpath("/a.html").unwrap(), "a.html");
    }
}
