// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed project in the standard source
// layout and a fluent builder so each integration test can set up an
// isolated project without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gsdl::cli::GlobalOpts;
use gsdl::config::{self, EffectiveSettings};
use gsdl::logging::{Log, Logger};
use gsdl::tasks::Context;

/// Write a small site into `root`.
///
/// Creates:
/// - `src/main/html/index.html`         : a page using build info and a partial
/// - `src/main/html/_partials/nav.html` - an include-only partial
/// - `src/main/css/site.css`
/// - `src/main/static/robots.txt`
/// - `src/main/data/site.json`
pub fn setup_minimal_project(root: &Path) {
    for (rel, body) in [
        (
            "src/main/html/index.html",
            "{% include \"_partials/nav.html\" %}<p>{$ build.branch $}</p>",
        ),
        ("src/main/html/_partials/nav.html", "<nav></nav>"),
        ("src/main/css/site.css", "a { color: red; }\n"),
        ("src/main/static/robots.txt", "User-agent: *\n"),
        ("src/main/data/site.json", "{\"name\": \"site\"}\n"),
    ] {
        write_file(root, rel, body);
    }
}

/// Write `body` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, body).expect("write project file");
}

/// An isolated project backed by a [`tempfile::TempDir`].
///
/// The directory is deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory containing the project.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a new context with the minimal site written out.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        setup_minimal_project(root.path());
        Self { root }
    }

    /// Path to the project root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Path to `rel` inside the project.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    /// Contents of `rel` inside the project.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read project file")
    }

    /// Global options pointing at this project, sequential, not dry-run.
    pub fn global_opts(&self) -> GlobalOpts {
        GlobalOpts {
            dry_run: false,
            root: Some(self.root.path().to_path_buf()),
            config: None,
            parallel: false,
        }
    }

    /// Settings resolved from the project's `gsdl.toml`, if any.
    pub fn settings(&self) -> EffectiveSettings {
        config::load(&self.path("gsdl.toml")).expect("load settings")
    }

    /// A task context for this project.
    pub fn context(&self) -> Context {
        Context::new(
            self.settings(),
            self.root.path().to_path_buf(),
            Arc::new(Logger::new("test")) as Arc<dyn Log>,
            false,
            false,
        )
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context backed by the minimal site.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `content` as the project's `gsdl.toml`.
    pub fn with_settings(self, content: &str) -> Self {
        write_file(self.ctx.root.path(), "gsdl.toml", content);
        self
    }

    /// Add or overwrite a project file.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        write_file(self.ctx.root.path(), rel, content);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}
