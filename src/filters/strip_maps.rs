//! Drops source-map files.
use crate::error::FilterError;
use crate::path::split;
use crate::pipeline::{FileRecord, Filter};

/// Suppresses records with a `.map` extension. Used by production builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct StripMaps;

impl Filter for StripMaps {
    fn name(&self) -> &'static str {
        "strip-maps"
    }

    fn apply(&self, record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        if split(&record.path).extension == ".map" {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    }
}
