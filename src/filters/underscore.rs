//! Drops files that live under an underscore-prefixed directory, and
//! underscore-prefixed style partials.
use std::path::Path;

use crate::error::FilterError;
use crate::path::split;
use crate::pipeline::{FileRecord, Filter};

/// Suppresses records whose directory, below the record base, has a
/// segment starting with `_`.
///
/// Such directories hold partials and includes that are only pulled in by
/// other files. Records without contents are forwarded unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreUnderscoreDirs;

/// Whether any directory segment of `path` starts with an underscore.
///
/// Pass a base-relative path: directories above the base are not looked at.
#[must_use]
pub fn in_underscore_dir(path: &Path) -> bool {
    let dirname = split(path).dirname;
    Path::new(&dirname)
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('_'))
}

impl Filter for IgnoreUnderscoreDirs {
    fn name(&self) -> &'static str {
        "ignore-underscore-dirs"
    }

    fn apply(&self, record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        if record.is_empty() || !in_underscore_dir(&record.relative()) {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}

/// Suppresses style partials: files whose name starts with `_`, such as
/// `_mixins.scss`. They only compile as part of the file importing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnorePartials;

/// Whether the file name of `path` starts with an underscore.
#[must_use]
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('_'))
}

impl Filter for IgnorePartials {
    fn name(&self) -> &'static str {
        "ignore-partials"
    }

    fn apply(&self, record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        Ok((!is_partial(&record.path)).then_some(record))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::Contents;

    fn rec(path: &str) -> FileRecord {
        FileRecord::new(path, "/p", Contents::Buffer(Vec::new()))
    }

    #[test]
    fn nested_underscore_dir_is_suppressed() {
        let out = IgnoreUnderscoreDirs.apply(rec("/p/a/_drafts/b/post.html")).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn trailing_underscore_is_forwarded() {
        let out = IgnoreUnderscoreDirs.apply(rec("/p/a/drafts_/post.html")).unwrap();
        assert!(out.is_some());
    }

    #[test]
    fn underscore_file_name_is_not_a_directory() {
        let out = IgnoreUnderscoreDirs.apply(rec("/p/scss/_vars.scss")).unwrap();
        assert!(out.is_some());
    }

    #[test]
    fn directories_above_the_base_are_ignored() {
        let record = FileRecord::new(
            "/home/me/_work/site/src/main/html/index.html",
            "/home/me/_work/site/src/main/html",
            Contents::Buffer(Vec::new()),
        );
        assert!(IgnoreUnderscoreDirs.apply(record).unwrap().is_some());
    }

    #[test]
    fn empty_records_pass_through() {
        let record = FileRecord::new("/p/_partials/x.html", "/p", Contents::Empty);
        assert!(IgnoreUnderscoreDirs.apply(record).unwrap().is_some());
    }

    #[test]
    fn partials_are_dropped_by_file_name() {
        assert!(IgnorePartials.apply(rec("/p/scss/_mixins.scss")).unwrap().is_none());
        assert!(IgnorePartials.apply(rec("/p/scss/app.scss")).unwrap().is_some());
        assert!(IgnorePartials.apply(rec("/p/_lib/app.scss")).unwrap().is_some());
    }
}
