//! Transforms delegated to external programs.
//!
//! The record's contents go to the program's stdin and its stdout replaces
//! them. In the argument list, `{path}` expands to the record's absolute
//! path and `{dir}` to its directory.
use std::path::Path;

use crate::error::FilterError;
use crate::exec;
use crate::pipeline::{Contents, FileRecord, Filter};

/// Runs a configured command line over each record.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    label: &'static str,
    argv: Vec<String>,
    extension: Option<&'static str>,
}

impl ExternalCommand {
    /// `argv[0]` is the program. `extension`, when set, replaces the
    /// record's extension after a successful run.
    #[must_use]
    pub const fn new(label: &'static str, argv: Vec<String>, extension: Option<&'static str>) -> Self {
        Self {
            label,
            argv,
            extension,
        }
    }

    fn expand(&self, path: &Path) -> Vec<String> {
        let dir = path.parent().unwrap_or(path).display().to_string();
        let path = path.display().to_string();
        self.argv
            .iter()
            .skip(1)
            .map(|a| a.replace("{path}", &path).replace("{dir}", &dir))
            .collect()
    }
}

impl Filter for ExternalCommand {
    fn name(&self) -> &'static str {
        self.label
    }

    fn apply(&self, mut record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        let input = match &record.contents {
            Contents::Empty => return Ok(Some(record)),
            Contents::Stream => {
                return Err(FilterError::StreamingUnsupported {
                    path: record.display_path(),
                });
            }
            Contents::Buffer(bytes) => bytes,
        };

        let Some(program) = self.argv.first() else {
            return Err(FilterError::Command {
                program: self.label.to_string(),
                path: record.display_path(),
                message: "no command configured".to_string(),
            });
        };
        if !exec::which(program) {
            return Err(FilterError::ProgramMissing {
                program: program.clone(),
            });
        }

        let dir = record.path.parent().unwrap_or(&record.path);
        let args = self.expand(&record.path);
        let result = exec::run_with_input(dir, program, &args, input).map_err(|e| {
            FilterError::Command {
                program: program.clone(),
                path: record.display_path(),
                message: format!("{e:#}"),
            }
        })?;

        record.set_bytes(result.stdout);
        if let Some(ext) = self.extension {
            record.set_extension(ext);
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn placeholders_expand() {
        let cmd = ExternalCommand::new("ES6", argv(&["esbuild", "{path}", "--outdir={dir}"]), None);
        let args = cmd.expand(Path::new("/p/es6/app.js"));
        assert_eq!(args, ["/p/es6/app.js", "--outdir=/p/es6"]);
    }

    #[test]
    fn missing_program_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = ExternalCommand::new("LESS", argv(&["no-such-lessc-12345", "-"]), Some("css"));
        let record = FileRecord::new(tmp.path().join("a.less"), tmp.path(), Contents::Buffer(b"a{}".to_vec()));
        let err = cmd.apply(record).unwrap_err();
        assert!(matches!(err, FilterError::ProgramMissing { ref program } if program == "no-such-lessc-12345"));
    }

    #[test]
    fn empty_command_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = ExternalCommand::new("JS", Vec::new(), None);
        let record = FileRecord::new(tmp.path().join("a.js"), tmp.path(), Contents::Buffer(Vec::new()));
        assert!(cmd.apply(record).is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn stdout_replaces_contents_and_extension_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = ExternalCommand::new("LESS", argv(&["cat"]), Some("css"));
        let record = FileRecord::new(tmp.path().join("a.less"), tmp.path(), Contents::Buffer(b"a{}".to_vec()));
        let out = cmd.apply(record).unwrap().unwrap();
        assert_eq!(out.bytes(), Some(&b"a{}"[..]));
        assert_eq!(out.path, tmp.path().join("a.css"));
    }

    #[cfg(not(windows))]
    #[test]
    fn failing_program_names_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = ExternalCommand::new("JS", argv(&["false"]), None);
        let record = FileRecord::new(tmp.path().join("a.js"), tmp.path(), Contents::Buffer(Vec::new()));
        let err = cmd.apply(record).unwrap_err();
        assert!(err.to_string().contains("a.js"));
    }
}
