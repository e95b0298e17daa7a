//! Typed errors for each layer of gsdl.
//!
//! Settings, filters, bundles and the dev server return their own
//! [`thiserror`] enums; tasks and commands work in [`anyhow::Error`] and
//! pick these up through `?`.
//!
//! # Layout
//!
//! ```text
//! GsdlError
//! ├── Config(ConfigError)  : options loading, merging, normalization
//! ├── Filter(FilterError)  : a transform could not process one file
//! ├── Bundle(BundleError)  : a style bundle failed (aborts all bundles)
//! ├── Task(TaskError)      : task lookup, dependency issues, failures
//! └── Serve(ServeError)    : dev server and file watcher setup
//! ```

use thiserror::Error;

/// Top-level error type for the gsdl engine.
#[derive(Error, Debug)]
pub enum GsdlError {
    /// Configuration-related error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A per-file transform error.
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Style bundling error.
    #[error("Bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// Task execution error.
    #[error("Task execution error: {0}")]
    Task(#[from] TaskError),

    /// Development server or watcher error.
    #[error("Serve error: {0}")]
    Serve(#[from] ServeError),
}

/// Errors that arise while resolving the effective settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading the options file.
    #[error("IO error reading options file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The options file is not valid TOML.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidSyntax {
        /// Path to the offending file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// The merged settings do not match the expected shape.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// A section that must be a table was given as something else.
    #[error("Section [{0}] must be a table")]
    NotATable(String),

    /// The dist root is not a directory strictly inside the project.
    #[error("Refusing to clean {path}: {reason}")]
    UnsafeDist {
        /// Resolved dist root.
        path: String,
        /// Why it cannot be removed.
        reason: String,
    },

    /// `cleanName` is already the name of another task.
    #[error("cleanName '{0}' is already a task name")]
    CleanNameTaken(String),
}

/// Errors raised by a single filter for a single file.
#[derive(Error, Debug)]
pub enum FilterError {
    /// The template could not be rendered.
    #[error("Template error in {path}: {message}")]
    Template {
        /// File being rendered.
        path: String,
        /// Renderer message.
        message: String,
    },

    /// The record carries a live stream, which the filter cannot consume.
    #[error("Streaming is not supported: {path}")]
    StreamingUnsupported {
        /// File that arrived as a stream.
        path: String,
    },

    /// Site-relative path helpers could not be attached.
    #[error("Error adding relative path to {path}: {message}")]
    SitePath {
        /// File being processed.
        path: String,
        /// Underlying reason.
        message: String,
    },

    /// A style or script compiler rejected the file.
    #[error("{compiler} error in {path}: {message}")]
    Compile {
        /// Compiler name (e.g. `"SCSS"`, `"CSS"`).
        compiler: &'static str,
        /// File being compiled.
        path: String,
        /// Compiler message.
        message: String,
    },

    /// An external transform command could not be found on `PATH`.
    #[error("Required program '{program}' not found on PATH")]
    ProgramMissing {
        /// Program name.
        program: String,
    },

    /// An external transform command failed.
    #[error("{program} failed on {path}: {message}")]
    Command {
        /// Program name.
        program: String,
        /// File being transformed.
        path: String,
        /// Exit code and stderr.
        message: String,
    },

    /// A source glob is malformed.
    #[error("invalid source pattern '{pattern}': {message}")]
    Pattern {
        /// The offending glob.
        pattern: String,
        /// Glob parser message.
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that abort the style bundle orchestrator.
#[derive(Error, Debug)]
pub enum BundleError {
    /// A source stream of the bundle failed.
    #[error("bundle '{bundle}' failed: {source}")]
    Stream {
        /// Output filename of the bundle.
        bundle: String,
        /// The first error observed for this bundle.
        source: FilterError,
    },

    /// A source pattern could not be expanded.
    #[error("bundle '{bundle}' has an invalid source pattern: {message}")]
    Source {
        /// Output filename of the bundle.
        bundle: String,
        /// Glob error message.
        message: String,
    },

    /// A bundle worker thread panicked.
    #[error("bundle '{0}' worker panicked")]
    Panicked(String),
}

/// Errors that arise during task planning and execution.
#[derive(Error, Debug)]
pub enum TaskError {
    /// A task failed to execute.
    #[error("Task '{task}' failed: {reason}")]
    ExecutionFailed {
        /// Name of the task that failed.
        task: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The task dependency graph contains a cycle.
    #[error("Task dependency cycle detected: {0}")]
    DependencyCycle(String),

    /// The requested task is not registered.
    #[error("Unknown task '{name}' (known tasks: {known})")]
    UnknownTask {
        /// Requested name.
        name: String,
        /// Comma separated list of registered names.
        known: String,
    },
}

/// Errors from the development server and watcher.
#[derive(Error, Debug)]
pub enum ServeError {
    /// The listening socket could not be bound.
    #[error("cannot bind dev server to {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file watcher could not be created or attached.
    #[error("file watcher error: {0}")]
    Watch(String),
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn config_error_io_display() {
        let e = ConfigError::Io {
            path: "/project/gsdl.toml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.to_string().contains("/project/gsdl.toml"));
        assert!(e.to_string().contains("IO error reading options file"));
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "gsdl.toml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn filter_error_template_names_the_file() {
        let e = FilterError::Template {
            path: "src/main/html/index.html".to_string(),
            message: "unexpected end of block".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Template error in src/main/html/index.html: unexpected end of block"
        );
    }

    #[test]
    fn filter_error_site_path_display() {
        let e = FilterError::SitePath {
            path: "a.html".to_string(),
            message: "not relative".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Error adding relative path to a.html: not relative"
        );
    }

    #[test]
    fn bundle_error_wraps_filter_error() {
        use std::error::Error as StdError;
        let e = BundleError::Stream {
            bundle: "app.css".to_string(),
            source: FilterError::ProgramMissing {
                program: "lessc".to_string(),
            },
        };
        assert!(e.to_string().starts_with("bundle 'app.css' failed"));
        assert!(e.source().is_some());
    }

    #[test]
    fn task_error_unknown_task_lists_known() {
        let e = TaskError::UnknownTask {
            name: "deploy".to_string(),
            known: "build, copy".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Unknown task 'deploy' (known tasks: build, copy)"
        );
    }

    #[test]
    fn gsdl_error_from_config_error() {
        let e: GsdlError = ConfigError::NotATable("html".to_string()).into();
        assert!(e.to_string().contains("Configuration error"));
        assert!(e.to_string().contains("[html]"));
    }

    #[test]
    fn gsdl_error_from_bundle_error() {
        let e: GsdlError = BundleError::Panicked("app.css".to_string()).into();
        assert!(e.to_string().contains("Bundle error"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<GsdlError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<FilterError>();
        assert_send_sync::<BundleError>();
        assert_send_sync::<TaskError>();
        assert_send_sync::<ServeError>();
    }

    #[test]
    fn filter_error_converts_to_anyhow() {
        let e = FilterError::StreamingUnsupported {
            path: "x".to_string(),
        };
        let _anyhow_err: anyhow::Error = e.into();
    }
}
