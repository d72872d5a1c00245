//! Core types for the rankfuse retrieval system

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// Unique identifier for a document
pub type DocumentId = String;

/// Embedding vector type
pub type Embedding = Vec<f32>;

/// Field holding a document's explicit identifier, when present
pub const ID_FIELD: &str = "id";

/// Default field holding a document's text content
pub const DEFAULT_TEXT_FIELD: &str = "text";

/// A document to be indexed and retrieved
///
/// Documents are opaque field mappings: one field carries the text used for
/// indexing (configurable, default `"text"`), an optional `"id"` field carries
/// an explicit identifier, and every other field is metadata carried through
/// retrieval untouched. Documents are immutable once handed to a retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Create a document with content in the default text field
    pub fn new(text: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(DEFAULT_TEXT_FIELD.to_string(), Value::String(text.into()));
        Self { fields }
    }

    /// Create a document from an existing field mapping
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Set the explicit document identifier
    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.fields
            .insert(ID_FIELD.to_string(), Value::String(id.into()));
        self
    }

    /// Attach a metadata field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Explicit identifier, if the document carries one
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(|v| v.as_str())
    }

    /// Text content of the named field
    ///
    /// A missing field or a non-string value is tolerated as empty text, so a
    /// malformed document scores near zero instead of failing the query.
    pub fn text(&self, field: &str) -> &str {
        self.fields.get(field).and_then(|v| v.as_str()).unwrap_or("")
    }

    /// Raw field value by name
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The full field mapping
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Identity used when fusing candidate lists from several retrievers
    ///
    /// The explicit `id` field when present, otherwise a content hash over the
    /// canonical serialization of all fields. Distinct retrievers may hold
    /// independently constructed copies of the same document, so the fallback
    /// must depend on field values, never on reference identity. Two id-less
    /// documents with identical content collapse into one entry during fusion.
    pub fn fusion_key(&self) -> FusionKey {
        match self.id() {
            Some(id) => FusionKey(format!("id:{}", id)),
            None => FusionKey(format!("hash:{}", ContentHash::compute_fields(&self.fields))),
        }
    }
}

/// Grouping key for fusion deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FusionKey(String);

impl fmt::Display for FusionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exact content hash using SHA256 (64-character hex string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA256 hash of content
    pub fn compute(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }

    /// Compute a deterministic hash of a field mapping
    ///
    /// `serde_json::Map` iterates in sorted key order, so serialization is
    /// canonical and independent of insertion order.
    pub fn compute_fields(fields: &Map<String, Value>) -> Self {
        let canonical = Value::Object(fields.clone()).to_string();
        Self::compute(&canonical)
    }

    /// Get the underlying string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A retrieval result: a document with its attached relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

impl ScoredDocument {
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }
}
