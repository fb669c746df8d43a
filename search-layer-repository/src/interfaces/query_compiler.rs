//! Search contract implemented by every backend.

use async_trait::async_trait;
use search_layer_shared::Search;

use crate::errors::SearchError;
use crate::types::SearchResult;

/// Compiles a backend-neutral [`Search`] into the backend's native query,
/// executes it and maps the hits back into documents.
///
/// Implementations must:
///
/// - answer a single identifier lookup (one identifier filter, offset 0,
///   limit 1) with a direct point lookup, returning an empty result with a
///   total of 0 when the document does not exist
/// - resolve `And` children conjunctively and `Or` children disjunctively
/// - pass free text to the backend's relevance query rather than the filter
/// - reject requests they cannot express before issuing any backend call
/// - attach requested highlights under `_formatted`, failing when the
///   backend omits one
#[async_trait]
pub trait QueryCompiler: Send + Sync {
    /// Execute a search.
    ///
    /// # Arguments
    ///
    /// * `search` - The frozen search request
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResult)` - The total and the lazily mapped documents
    /// * `Err(SearchError)` - If the request cannot be compiled or the backend fails
    async fn search(&self, search: &Search) -> Result<SearchResult, SearchError>;
}
