//! File pipelines: a source, an ordered chain of filters, and a destination.
//!
//! Records flow through the filters strictly in declared order. Different
//! records are processed in parallel, and the output keeps their input
//! order. A filter error drops only the record that caused it.
pub mod dest;
pub mod record;
pub mod source;

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::FilterError;
use crate::logging::Log;

pub use record::{Contents, FileRecord, RecordData};

/// A per-record stage.
///
/// Returning `Ok(None)` suppresses the record without error.
pub trait Filter: Send + Sync {
    /// Short label for debug output.
    fn name(&self) -> &'static str;

    /// Transform one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be processed.
    fn apply(&self, record: FileRecord) -> Result<Option<FileRecord>, FilterError>;
}

/// Result of pushing a batch of records through a [`Pipeline`].
#[derive(Debug, Default)]
pub struct Outcome {
    /// Records that passed every filter, in input order.
    pub records: Vec<FileRecord>,
    /// One error per record that failed.
    pub errors: Vec<FilterError>,
    /// Number of records suppressed by a filter.
    pub suppressed: usize,
}

impl Outcome {
    /// Log every error through `log`, prefixed with `label`.
    pub fn report_errors(&self, label: &str, log: &dyn Log) {
        for e in &self.errors {
            log.error(&format!("{label} Error: {e}"));
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// An ordered chain of filters.
#[derive(Clone, Default)]
pub struct Pipeline {
    filters: Vec<Arc<dyn Filter>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.filters.iter().map(|s| s.name()).collect();
        f.debug_struct("Pipeline").field("filters", &names).finish()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    #[must_use]
    pub fn pipe(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Append a filter that is shared with other pipelines.
    #[must_use]
    pub fn pipe_shared(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append `filter` only when `cond` holds.
    #[must_use]
    pub fn pipe_if(self, cond: bool, filter: impl Filter + 'static) -> Self {
        if cond { self.pipe(filter) } else { self }
    }

    /// Number of filters in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run a single record through every filter.
    ///
    /// # Errors
    ///
    /// Returns the first filter error; later filters are not applied.
    pub fn process_one(&self, record: FileRecord) -> Result<Option<FileRecord>, FilterError> {
        let mut current = record;
        for filter in &self.filters {
            match filter.apply(current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Run a batch of records, in parallel when `parallel` is set.
    #[must_use]
    pub fn run(&self, records: Vec<FileRecord>, parallel: bool) -> Outcome {
        let results: Vec<Result<Option<FileRecord>, FilterError>> = if parallel {
            records
                .into_par_iter()
                .map(|r| self.process_one(r))
                .collect()
        } else {
            records.into_iter().map(|r| self.process_one(r)).collect()
        };

        let mut outcome = Outcome::default();
        for result in results {
            match result {
                Ok(Some(record)) => outcome.records.push(record),
                Ok(None) => outcome.suppressed += 1,
                Err(e) => outcome.errors.push(e),
            }
        }
        outcome
    }
}
