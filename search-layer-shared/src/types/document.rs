//! Document representation.
//!
//! A document is an untyped structured mapping that conforms to an index's
//! field tree. The map keeps insertion order, which some backends rely on
//! for their column ordering.

/// A structured document: field name to scalar, sequence or nested mapping.
pub type Document = serde_json::Map<String, serde_json::Value>;
