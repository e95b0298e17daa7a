//! The in-flight file representation.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::filters::build_info::BuildInfo;
use crate::filters::site_paths::SitePaths;

/// Payload of a [`FileRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// The whole file, in memory.
    Buffer(Vec<u8>),
    /// No payload (e.g. a directory entry).
    Empty,
    /// A live byte stream that has not been buffered.
    Stream,
}

/// Metadata attached by upstream filters for downstream ones.
#[derive(Debug, Clone, Default)]
pub struct RecordData {
    /// Revision and build date, shared by every record of a run.
    pub build: Option<Arc<BuildInfo>>,
    /// Link helpers relative to this record's output location.
    pub site: Option<SitePaths>,
}

/// One asset moving through a pipeline.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute source path.
    pub path: PathBuf,
    /// Directory the output path is computed relative to.
    pub base: PathBuf,
    pub contents: Contents,
    pub data: RecordData,
}

impl FileRecord {
    /// Create a record with empty side-channel data.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, base: impl Into<PathBuf>, contents: Contents) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
            contents,
            data: RecordData::default(),
        }
    }

    /// Path below [`base`](Self::base); the file name alone when the path
    /// lies outside it.
    #[must_use]
    pub fn relative(&self) -> PathBuf {
        self.path.strip_prefix(&self.base).map_or_else(
            |_| self.path.file_name().map(PathBuf::from).unwrap_or_default(),
            Path::to_path_buf,
        )
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.contents, Contents::Empty)
    }

    #[must_use]
    pub const fn is_stream(&self) -> bool {
        matches!(self.contents, Contents::Stream)
    }

    /// Buffered bytes, if any.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.contents {
            Contents::Buffer(b) => Some(b),
            Contents::Empty | Contents::Stream => None,
        }
    }

    /// Replace the contents with a buffer.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.contents = Contents::Buffer(bytes);
    }

    /// Change the extension of the source path (`"css"`, no dot).
    pub fn set_extension(&mut self, ext: &str) {
        self.path.set_extension(ext);
    }

    /// Source path for messages.
    #[must_use]
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}
