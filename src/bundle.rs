//! Style bundle orchestration.
//!
//! Each bundle compiles its LESS, SASS/SCSS and plain CSS sources on three
//! threads, merges whatever arrives first, concatenates the result into the
//! bundle's output file and post-processes it. All bundles build
//! concurrently; the first failure fails the whole run.
use std::path::PathBuf;
use std::sync::mpsc;

use crate::config::{BundleDescriptor, EffectiveSettings, SrcPath};
use crate::error::{BundleError, ConfigError, FilterError};
use crate::filters::concat::concat;
use crate::filters::{CompileSass, ExternalCommand, IgnorePartials, IgnoreUnderscoreDirs, ProcessCss, StripMaps};
use crate::logging::Log;
use crate::pipeline::{FileRecord, Pipeline, dest, source};

/// Builds every bundle declared in `style.bundles`.
#[derive(Debug)]
pub struct Bundler {
    root: PathBuf,
    dest: PathBuf,
    less: Pipeline,
    sass: Pipeline,
    css: Pipeline,
    post: ProcessCss,
    production: bool,
    dry_run: bool,
}

impl Bundler {
    /// Bundler for the project at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the autoprefixer browser list is invalid.
    pub fn new(
        settings: &EffectiveSettings,
        root: impl Into<PathBuf>,
        production: bool,
        dry_run: bool,
    ) -> Result<Self, ConfigError> {
        let root = root.into();
        Ok(Self {
            dest: root.join(&settings.style.dest_path),
            less: Pipeline::new()
                .pipe(IgnoreUnderscoreDirs)
                .pipe(IgnorePartials)
                .pipe(ExternalCommand::new(
                "less",
                settings.compilers.less.clone(),
                Some("css"),
            )),
            sass: Pipeline::new()
                .pipe(IgnoreUnderscoreDirs)
                .pipe(IgnorePartials)
                .pipe(CompileSass),
            css: Pipeline::new().pipe(IgnoreUnderscoreDirs),
            post: ProcessCss::new(&settings.autoprefixer.browsers, production)?,
            root,
            production,
            dry_run,
        })
    }

    /// Replace the LESS stage. Mainly for tests and embedding.
    #[must_use]
    pub fn with_less_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.less = pipeline;
        self
    }

    /// Build all `bundles`, returning how many completed.
    ///
    /// Returns `Ok(0)` straight away when there are none.
    ///
    /// # Errors
    ///
    /// Returns the first error of any bundle. Bundles that had already
    /// finished keep their output, but no partial count is reported.
    pub fn build_bundles(&self, bundles: &[BundleDescriptor], log: &dyn Log) -> Result<usize, BundleError> {
        if bundles.is_empty() {
            return Ok(0);
        }

        let results: Vec<Result<(), BundleError>> = std::thread::scope(|s| {
            let handles: Vec<_> = bundles
                .iter()
                .map(|bundle| (bundle, s.spawn(move || self.build_one(bundle, log))))
                .collect();
            handles
                .into_iter()
                .map(|(bundle, h)| {
                    h.join()
                        .unwrap_or_else(|_| Err(BundleError::Panicked(bundle.out.clone())))
                })
                .collect()
        });

        let mut completed = 0;
        for result in results {
            result?;
            completed += 1;
        }
        Ok(completed)
    }

    fn dialect(&self, bundle: &str, pipeline: &Pipeline, patterns: &SrcPath) -> Result<Vec<FileRecord>, BundleError> {
        let records = source::src(&self.root, patterns.patterns()).map_err(|e| match e {
            FilterError::Pattern { message, .. } => BundleError::Source {
                bundle: bundle.to_string(),
                message,
            },
            other => BundleError::Stream {
                bundle: bundle.to_string(),
                source: other,
            },
        })?;
        let mut outcome = pipeline.run(records, false);
        if let Some(first) = outcome.errors.drain(..).next() {
            return Err(BundleError::Stream {
                bundle: bundle.to_string(),
                source: first,
            });
        }
        Ok(outcome.records)
    }

    fn merged_sources(&self, bundle: &BundleDescriptor) -> Result<Vec<FileRecord>, BundleError> {
        let (tx, rx) = mpsc::channel();
        let streams = [
            (&self.less, &bundle.less_in),
            (&self.sass, &bundle.sass_in),
            (&self.css, &bundle.css_in),
        ];

        std::thread::scope(|s| {
            let handles: Vec<_> = streams
                .into_iter()
                .map(|(pipeline, patterns)| {
                    let tx = tx.clone();
                    s.spawn(move || {
                        // The receiver outlives every sender in this scope.
                        let _ = tx.send(self.dialect(&bundle.out, pipeline, patterns));
                    })
                })
                .collect();
            drop(tx);

            let mut merged = Vec::new();
            let mut first_error = None;
            for result in rx {
                match result {
                    Ok(records) => merged.extend(records),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            for h in handles {
                if h.join().is_err() {
                    first_error.get_or_insert(BundleError::Panicked(bundle.out.clone()));
                }
            }
            first_error.map_or(Ok(merged), Err)
        })
    }

    fn build_one(&self, bundle: &BundleDescriptor, log: &dyn Log) -> Result<(), BundleError> {
        let stream_err = |source| BundleError::Stream {
            bundle: bundle.out.clone(),
            source,
        };

        let merged = self.merged_sources(bundle)?;
        let joined = concat(&merged, &self.dest, &bundle.out).map_err(stream_err)?;
        let processed = self
            .post
            .process_record(joined, !self.production)
            .map_err(stream_err)?;

        let finished = if self.production {
            Pipeline::new().pipe(StripMaps).run(processed, false).records
        } else {
            processed
        };

        dest::dest(&finished, &self.dest, self.dry_run, log).map_err(stream_err)?;
        log.debug(&format!(
            "bundle {} built from {} source file(s)",
            bundle.out,
            merged.len()
        ));
        Ok(())
    }
}
