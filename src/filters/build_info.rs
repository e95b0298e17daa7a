//! Build metadata stamping.
//!
//! The revision is looked up at most once per [`BuildInfoProvider`]; every
//! record stamped afterwards shares the same [`BuildInfo`].
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::{Context as _, Result, anyhow};
use serde::Serialize;

use crate::error::FilterError;
use crate::logging::format_utc_iso8601;
use crate::pipeline::{FileRecord, Filter};

/// Short hash used when the revision cannot be determined.
pub const FALLBACK_SHORT: &str = "Development";
/// Branch used when the revision cannot be determined.
pub const FALLBACK_BRANCH: &str = "master";

/// Revision and date a build was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub short: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// UTC, ISO-8601 with milliseconds.
    pub date: String,
}

/// Where the current revision comes from.
#[cfg_attr(test, mockall::automock)]
pub trait RevisionSource: Send + Sync {
    /// Abbreviated commit hash of HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no repository or no commit.
    fn short(&self) -> Result<String>;

    /// Name of the checked-out branch.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no repository or HEAD is unborn.
    fn branch(&self) -> Result<String>;
}

/// [`RevisionSource`] backed by the git repository containing `dir`.
#[derive(Debug, Clone)]
pub struct Git2Revision {
    dir: PathBuf,
}

impl Git2Revision {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn repo(&self) -> Result<git2::Repository> {
        git2::Repository::discover(&self.dir)
            .with_context(|| format!("no git repository at {}", self.dir.display()))
    }
}

impl RevisionSource for Git2Revision {
    fn short(&self) -> Result<String> {
        let repo = self.repo()?;
        let commit = repo.head()?.peel_to_commit()?;
        let id = commit.as_object().short_id()?;
        id.as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("short id is not valid UTF-8"))
    }

    fn branch(&self) -> Result<String> {
        let repo = self.repo()?;
        let head = repo.head()?;
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("HEAD name is not valid UTF-8"))
    }
}

/// Memoizing source of [`BuildInfo`].
///
/// Concurrent first callers block on the same lookup instead of issuing
/// their own.
pub struct BuildInfoProvider {
    source: Box<dyn RevisionSource>,
    version: Option<String>,
    cached: OnceLock<Arc<BuildInfo>>,
}

impl std::fmt::Debug for BuildInfoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildInfoProvider")
            .field("source", &"<dyn RevisionSource>")
            .field("version", &self.version)
            .field("cached", &self.cached.get())
            .finish()
    }
}

impl BuildInfoProvider {
    #[must_use]
    pub fn new(source: Box<dyn RevisionSource>, version: Option<String>) -> Self {
        Self {
            source,
            version,
            cached: OnceLock::new(),
        }
    }

    /// The build info for this run, computed on first use.
    pub fn get(&self) -> Arc<BuildInfo> {
        Arc::clone(self.cached.get_or_init(|| Arc::new(self.lookup())))
    }

    fn lookup(&self) -> BuildInfo {
        let short = self.source.short().unwrap_or_else(|e| {
            tracing::warn!("cannot read revision, using '{FALLBACK_SHORT}': {e:#}");
            FALLBACK_SHORT.to_string()
        });
        let branch = self.source.branch().unwrap_or_else(|e| {
            tracing::warn!("cannot read branch, using '{FALLBACK_BRANCH}': {e:#}");
            FALLBACK_BRANCH.to_string()
        });
        BuildInfo {
            short,
            branch,
            version: self.version.clone(),
            date: format_utc_iso8601(),
        }
    }
}

/// Attaches the run's [`BuildInfo`] to each record's `build` data.
#[derive(Debug, Clone)]
pub struct StampBuildInfo {
    provider: Arc<BuildInfoProvider>,
}

impl StampBuildInfo {
    #[must_use]
    pub const fn new(provider: Arc<BuildInfoProvider>) -> Self {
        Self { provider }
    }
}

impl Filter for StampBuildInfo {
    fn name(&self) -> &'static str {
        "build-info"
    }

    fn apply(&self, mut record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        record.data.build = Some(self.provider.get());
        Ok(Some(record))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::{Contents, Pipeline};

    fn rec(name: &str) -> FileRecord {
        FileRecord::new(format!("/p/{name}"), "/p", Contents::Buffer(Vec::new()))
    }

    #[test]
    fn revision_is_queried_once_for_many_records() {
        let mut source = MockRevisionSource::new();
        source
            .expect_short()
            .times(1)
            .returning(|| Ok("abc1234".to_string()));
        source
            .expect_branch()
            .times(1)
            .returning(|| Ok("main".to_string()));
        let provider = Arc::new(BuildInfoProvider::new(Box::new(source), None));
        let pipeline = Pipeline::new().pipe(StampBuildInfo::new(Arc::clone(&provider)));

        let outcome = pipeline.run(vec![rec("a.html"), rec("b.html"), rec("c.html")], true);
        assert_eq!(outcome.records.len(), 3);
        let first = outcome.records[0].data.build.clone().unwrap();
        assert_eq!(first.short, "abc1234");
        assert_eq!(first.branch, "main");
        for record in &outcome.records {
            let build = record.data.build.as_ref().unwrap();
            assert!(Arc::ptr_eq(build, &first));
        }
    }

    #[test]
    fn failed_lookup_falls_back_to_placeholders() {
        let mut source = MockRevisionSource::new();
        source
            .expect_short()
            .returning(|| Err(anyhow!("not a repository")));
        source
            .expect_branch()
            .returning(|| Err(anyhow!("not a repository")));
        let provider = BuildInfoProvider::new(Box::new(source), Some("2.0.0".to_string()));
        let info = provider.get();
        assert_eq!(info.short, FALLBACK_SHORT);
        assert_eq!(info.branch, FALLBACK_BRANCH);
        assert_eq!(info.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn partial_failure_keeps_what_was_found() {
        let mut source = MockRevisionSource::new();
        source
            .expect_short()
            .returning(|| Ok("abc1234".to_string()));
        source.expect_branch().returning(|| Err(anyhow!("unborn")));
        let provider = BuildInfoProvider::new(Box::new(source), None);
        let info = provider.get();
        assert_eq!(info.short, "abc1234");
        assert_eq!(info.branch, FALLBACK_BRANCH);
    }

    #[test]
    fn date_is_iso8601_utc_with_millis() {
        let mut source = MockRevisionSource::new();
        source.expect_short().returning(|| Ok("x".to_string()));
        source.expect_branch().returning(|| Ok("y".to_string()));
        let info = BuildInfoProvider::new(Box::new(source), None).get();
        assert_eq!(info.date.len(), "2024-01-01T00:00:00.000Z".len());
        assert!(info.date.ends_with('Z'));
        assert_eq!(&info.date[19..20], ".");
    }

    #[test]
    fn version_is_omitted_when_unset() {
        let info = BuildInfo {
            short: "a".to_string(),
            branch: "b".to_string(),
            version: None,
            date: "d".to_string(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("version").is_none());
    }

    #[test]
    fn git_outside_repository_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let source = Git2Revision::new(tmp.path());
        // A temp dir may sit inside a checkout on some CI hosts; only assert
        // when discovery really fails.
        if git2::Repository::discover(tmp.path()).is_err() {
            assert!(source.short().is_err());
            assert!(source.branch().is_err());
        }
    }
}
