//! Interface definitions for search backends.
//!
//! Each backend implements three independent traits: [`QueryCompiler`] for
//! searches, [`SchemaManager`] for index lifecycle and [`Indexer`] for
//! document writes. [`Adapter`] bundles them so an engine can hold a single
//! handle per backend.

mod adapter;
mod indexer;
mod query_compiler;
mod schema_manager;

pub use adapter::Adapter;
pub use indexer::Indexer;
pub use query_compiler::QueryCompiler;
pub use schema_manager::SchemaManager;
