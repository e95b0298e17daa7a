//! Joining many records into one.
use std::path::Path;

use crate::error::FilterError;
use crate::pipeline::{Contents, FileRecord};

/// Concatenate the buffered records, newline separated, into a single
/// record named `out` and based at `base`.
///
/// Records without contents are skipped.
///
/// # Errors
///
/// Returns an error if any record is a stream.
pub fn concat(records: &[FileRecord], base: &Path, out: &str) -> Result<FileRecord, FilterError> {
    let mut joined: Vec<u8> = Vec::new();
    for record in records {
        match &record.contents {
            Contents::Buffer(bytes) => {
                if !joined.is_empty() {
                    joined.push(b'\n');
                }
                joined.extend_from_slice(bytes);
            }
            Contents::Empty => {}
            Contents::Stream => {
                return Err(FilterError::StreamingUnsupported {
                    path: record.display_path(),
                });
            }
        }
    }
    Ok(FileRecord::new(base.join(out), base, Contents::Buffer(joined)))
}
