//! Error types for the search layer repository.
//!
//! This module provides a unified error type for every adapter, marshaller
//! and engine operation.

mod search_error;

pub use search_error::SearchError;
