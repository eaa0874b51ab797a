//! Document module - the unit of input text

use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a document based on UUIDv7
///
/// UUIDv7 ids sort by creation time, which keeps extraction reports for the
/// same run in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u128);

impl DocumentId {
    /// Generate a new UUIDv7-based DocumentId
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_domain::DocumentId;
    ///
    /// let id = DocumentId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a DocumentId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a DocumentId from its hyphenated string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid document id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// A loaded document: raw text content plus arbitrary metadata
///
/// Documents are immutable once built. The caller owns them; the pipeline
/// only ever borrows the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: DocumentId,
    content: String,
    metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document from its text content
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_domain::Document;
    ///
    /// let doc = Document::new("The first cars appeared in 1886.")
    ///     .with_metadata("source", "https://en.wikipedia.org/wiki/Car");
    /// assert_eq!(doc.metadata_value("source"), Some("https://en.wikipedia.org/wiki/Car"));
    /// ```
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry while the document is being built
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Document identifier
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Full text content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// All metadata entries, sorted by key
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Look up a single metadata value
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Length of the content in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the document has no content
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// A human-readable source label: the `source` metadata entry if present,
    /// otherwise the document id
    pub fn source_label(&self) -> String {
        self.metadata_value("source")
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }
}
