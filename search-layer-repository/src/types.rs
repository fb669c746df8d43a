//! Request and response types for search layer operations.

use std::fmt;

use search_layer_shared::Document;

use crate::errors::SearchError;

/// Options accepted by every index mutating operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskOptions {
    /// When set, the operation returns a [`Task`](crate::Task) the caller can
    /// await. Otherwise it returns nothing and the caller does not learn when
    /// the backend has applied the change.
    pub return_slow_promise_result: bool,
}

impl TaskOptions {
    /// Options requesting an awaitable task.
    pub fn wait() -> Self {
        Self {
            return_slow_promise_result: true,
        }
    }
}

/// The documents matched by a search.
///
/// A result is a single pass iterator: documents are produced lazily from
/// the backend response and consuming the result exhausts it. Dropping a
/// partially consumed result releases whatever the underlying iterator
/// owns.
///
/// Items are `Result`s because marshalling happens per hit; a failing hit
/// does not prevent the caller from reading the ones before it.
pub struct SearchResult {
    total: Option<u64>,
    documents: Box<dyn Iterator<Item = Result<Document, SearchError>> + Send>,
}

impl SearchResult {
    /// Create a result from a total and a lazy sequence of documents.
    ///
    /// # Arguments
    ///
    /// * `total` - The total number of matches, `None` if the backend did not report it
    /// * `documents` - The documents of the requested page
    pub fn new<I>(total: Option<u64>, documents: I) -> Self
    where
        I: IntoIterator<Item = Result<Document, SearchError>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            total,
            documents: Box::new(documents.into_iter()),
        }
    }

    /// A result with a total of 0 and no documents.
    pub fn empty() -> Self {
        Self::new(Some(0), std::iter::empty())
    }

    /// The total number of matching documents, if known.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Consume the result, collecting every document or the first error.
    pub fn into_documents(self) -> Result<Vec<Document>, SearchError> {
        self.collect()
    }
}

impl Iterator for SearchResult {
    type Item = Result<Document, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.documents.next()
    }
}

impl fmt::Debug for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResult")
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

/// A single operation inside a bulk request.
#[derive(Debug, Clone)]
pub enum DocumentOperation {
    Save(Document),
    Delete(String),
}

/// Result of a batch operation for a single item.
///
/// This struct represents the outcome of a single save or delete within a
/// batch. It indicates whether the operation succeeded and includes error
/// details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// Identifier of the document the operation targeted, when known.
    pub identifier: Option<String>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This allows callers to handle partial failures: a document that fails to
/// marshall does not prevent its siblings from being written.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Record the outcome of one item.
    pub fn record(&mut self, identifier: Option<String>, outcome: Result<(), SearchError>) {
        self.total += 1;
        match outcome {
            Ok(()) => {
                self.succeeded += 1;
                self.results.push(BatchOperationResult {
                    identifier,
                    success: true,
                    error: None,
                });
            }
            Err(e) => {
                self.failed += 1;
                self.results.push(BatchOperationResult {
                    identifier,
                    success: false,
                    error: Some(e),
                });
            }
        }
    }
}
