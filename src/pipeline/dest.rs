//! Writing records below a destination directory.
use std::path::{Path, PathBuf};

use super::record::{Contents, FileRecord};
use crate::error::FilterError;
use crate::logging::Log;

/// Where `record` lands below `dest`.
#[must_use]
pub fn target_path(record: &FileRecord, dest: &Path) -> PathBuf {
    dest.join(record.relative())
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> FilterError + '_ {
    move |source| FilterError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write every record to `dest / relative path`, creating directories.
///
/// In dry-run mode nothing is written; each target is logged instead.
/// Returns the number of records written (or that would be written).
///
/// # Errors
///
/// Returns an error on the first record that cannot be written, or for a
/// record that still carries a stream.
pub fn dest(
    records: &[FileRecord],
    dest: &Path,
    dry_run: bool,
    log: &dyn Log,
) -> Result<usize, FilterError> {
    for record in records {
        let target = target_path(record, dest);
        if dry_run {
            log.dry_run(&format!("would write {}", target.display()));
            continue;
        }
        match &record.contents {
            Contents::Buffer(bytes) => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).map_err(io_err(parent))?;
                }
                std::fs::write(&target, bytes).map_err(io_err(&target))?;
                log.debug(&format!("wrote {}", target.display()));
            }
            Contents::Empty => {
                std::fs::create_dir_all(&target).map_err(io_err(&target))?;
            }
            Contents::Stream => {
                return Err(FilterError::StreamingUnsupported {
                    path: record.display_path(),
                });
            }
        }
    }
    Ok(records.len())
}
