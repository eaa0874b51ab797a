//! Extracted records - schema-conforming output of one model call

use std::fmt;

/// A single field value inside an extracted record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Floating-point number
    Number(f64),
    /// Boolean flag
    Boolean(bool),
    /// Optional field the model left empty
    Null,
}

impl FieldValue {
    /// Borrow the text if this is a `Text` value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer if this is an `Integer` value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Null => Ok(()),
        }
    }
}

/// A structured record extracted from one segment
///
/// Fields keep the order in which the schema declares them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedRecord {
    fields: Vec<(String, FieldValue)>,
}

impl ExtractedRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_domain::{ExtractedRecord, FieldValue};
    ///
    /// let record = ExtractedRecord::new()
    ///     .with_field("year", FieldValue::Integer(1886))
    ///     .with_field("evidence", FieldValue::Text("Benz patented...".into()));
    /// assert_eq!(record.get("year"), Some(&FieldValue::Integer(1886)));
    /// ```
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing any previous value under the same name
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Get a field value by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text field by name
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Iterate over fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_field_order_is_preserved() {
        let record = ExtractedRecord::new()
            .with_field("year", FieldValue::Integer(1908))
            .with_field("description", FieldValue::Text("Model T".into()))
            .with_field("evidence", FieldValue::Text("The Model T...".into()));

        let names: Vec<&str> = record.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["year", "description", "evidence"]);
    }

    #[test]
    fn test_set_replaces_existing_value() {
        let mut record = ExtractedRecord::new().with_field("year", FieldValue::Integer(1));
        record.set("year", FieldValue::Integer(2));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("year").and_then(FieldValue::as_integer), Some(2));
    }

    #[test]
    fn test_text_accessor_ignores_non_text() {
        let record = ExtractedRecord::new()
            .with_field("year", FieldValue::Integer(1886))
            .with_field("note", FieldValue::Null);
        assert_eq!(record.text("year"), None);
        assert_eq!(record.text("missing"), None);
        assert!(record.get("note").unwrap().is_null());
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Text("a".into()).to_string(), "a");
        assert_eq!(FieldValue::Integer(7).to_string(), "7");
        assert_eq!(FieldValue::Boolean(true).to_string(), "true");
        assert_eq!(FieldValue::Null.to_string(), "");
    }
}
