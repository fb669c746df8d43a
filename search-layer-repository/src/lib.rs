//! # Search Layer Repository
//!
//! This crate binds the backend-neutral model of `search-layer-shared` to
//! concrete search backends. It provides the error taxonomy, the two
//! document marshallers, the adapter traits and their implementations for
//! OpenSearch, Algolia, Typesense and an in-process memory backend, two
//! composite adapters, and the [`Engine`] / [`EngineRegistry`] surface
//! application code talks to.

pub mod algolia;
pub mod config;
pub mod engine;
pub mod errors;
pub(crate) mod http;
pub mod interfaces;
pub mod marshaller;
pub mod memory;
pub mod multi;
pub mod opensearch;
pub mod read_write;
pub mod registry;
pub mod task;
pub mod types;
pub mod typesense;
pub mod utils;

pub use config::{AdapterDsn, EngineConfig, RegistryConfig};
pub use engine::Engine;
pub use errors::SearchError;
pub use interfaces::{Adapter, Indexer, QueryCompiler, SchemaManager};
pub use marshaller::{FlattenMarshaller, Marshaller};
pub use memory::MemoryAdapter;
pub use multi::MultiAdapter;
pub use read_write::ReadWriteAdapter;
pub use registry::EngineRegistry;
pub use task::Task;
pub use types::{
    BatchOperationResult, BatchOperationSummary, DocumentOperation, SearchResult, TaskOptions,
};
pub use utils::document_identifier;
