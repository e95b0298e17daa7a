use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::EffectiveSettings;
use crate::filters::build_info::{BuildInfoProvider, Git2Revision};
use crate::logging::Log;
use crate::pipeline::Filter;
use crate::server::ServerHandle;
use crate::watch::WatchHandle;

/// Something a task left running after it returned.
#[derive(Debug)]
pub enum Service {
    /// Rebuilds on source changes.
    Watcher(WatchHandle),
    /// Serves the dist directory.
    Server(ServerHandle),
}

/// Everything a task needs: settings, project root, logger and run flags.
pub struct Context {
    /// Merged, normalized settings.
    pub settings: Arc<EffectiveSettings>,
    /// Project root every settings path is relative to.
    pub root: PathBuf,
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (compile, but write nothing).
    pub dry_run: bool,
    /// Whether to process records in parallel using Rayon.
    pub parallel: bool,
    /// Whether this run builds for production (minified, no source maps).
    pub production: bool,
    /// Build metadata, looked up once per process.
    pub build_info: Arc<BuildInfoProvider>,
    /// Extra filters run on HTML records before build info is stamped.
    pub html_hooks: Arc<Vec<Arc<dyn Filter>>>,
    /// Long-running services started by tasks.
    ///
    /// Shared across per-task contexts so the command can keep them alive
    /// after the plan finishes.
    pub services: Arc<Mutex<Vec<Service>>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("parallel", &self.parallel)
            .field("production", &self.production)
            .field("html_hooks", &self.html_hooks.len())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a new context for task execution.
    ///
    /// Build info is read from the git repository containing `root`.
    #[must_use]
    pub fn new(
        settings: EffectiveSettings,
        root: PathBuf,
        log: Arc<dyn Log>,
        dry_run: bool,
        parallel: bool,
    ) -> Self {
        let build_info = Arc::new(BuildInfoProvider::new(
            Box::new(Git2Revision::new(&root)),
            settings.version.clone(),
        ));
        Self {
            settings: Arc::new(settings),
            root,
            log,
            dry_run,
            parallel,
            production: false,
            build_info,
            html_hooks: Arc::new(Vec::new()),
            services: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Absolute form of a settings path.
    #[must_use]
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    /// The dist root.
    #[must_use]
    pub fn dist_dir(&self) -> PathBuf {
        self.path(&self.settings.dist)
    }

    /// Keep `service` running until the command exits.
    pub fn register_service(&self, service: Service) {
        self.services
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(service);
    }

    /// Take every registered service, leaving none behind.
    #[must_use]
    pub fn take_services(&self) -> Vec<Service> {
        std::mem::take(
            &mut *self
                .services
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }

    /// The same context, logging to `log`.
    ///
    /// Settings, build info, hooks and services stay shared.
    #[must_use]
    pub fn with_log(&self, log: Arc<dyn Log>) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            root: self.root.clone(),
            log,
            dry_run: self.dry_run,
            parallel: self.parallel,
            production: self.production,
            build_info: Arc::clone(&self.build_info),
            html_hooks: Arc::clone(&self.html_hooks),
            services: Arc::clone(&self.services),
        }
    }

    /// Set production mode.
    #[must_use]
    pub const fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Use `provider` for build metadata.
    #[must_use]
    pub fn with_build_info(mut self, provider: Arc<BuildInfoProvider>) -> Self {
        self.build_info = provider;
        self
    }

    /// Register filters to run on HTML records ahead of templating.
    #[must_use]
    pub fn with_html_hooks(mut self, hooks: Vec<Arc<dyn Filter>>) -> Self {
        self.html_hooks = Arc::new(hooks);
        self
    }
}
