//! Statically declared extraction schemas
//!
//! A schema names the record fields, their kinds and the natural-language
//! descriptions used to steer the model. It is resolved and validated before
//! any model call is made and rendered to JSON Schema for structured output.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sift_domain::{ExtractedRecord, FieldValue};
use std::collections::HashSet;
use std::path::Path;

use crate::error::ExtractorError;

/// Value kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text
    String,
    /// Whole number
    Integer,
    /// Any number
    Number,
    /// true / false
    Boolean,
}

impl FieldKind {
    fn json_type(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// One field of an extracted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it appears in model output
    pub name: String,

    /// Value kind
    pub kind: FieldKind,

    /// Instruction to the model describing what goes in this field
    pub description: String,

    /// Whether the model must provide a non-null value
    #[serde(default = "default_required")]
    pub required: bool,
}

impl FieldSpec {
    /// Create a required field
    pub fn required(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        }
    }

    /// Create an optional (nullable) field
    pub fn optional(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

fn default_required() -> bool {
    true
}

fn default_collection() -> String {
    "records".to_string()
}

/// Target schema for structured extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    /// Short identifier, also used as the JSON Schema title
    pub name: String,

    /// What a record represents
    pub description: String,

    /// Key of the record array in the model's response object
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Field holding the verbatim source span; used for deduplication
    pub evidence_field: String,

    /// Extra guidance appended to the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Record fields, in output order
    pub fields: Vec<FieldSpec>,
}

impl ExtractionSchema {
    /// Key developments in the history of a subject: year, description and
    /// the verbatim evidence sentence(s)
    pub fn key_developments() -> Self {
        Self {
            name: "key_developments".to_string(),
            description: "Information about a key development in the history of the subject of the text.".to_string(),
            collection: default_collection(),
            evidence_field: "evidence".to_string(),
            instructions: Some(
                "Only extract important historic developments. \
                 Extract nothing if no important information can be found in the text."
                    .to_string(),
            ),
            fields: vec![
                FieldSpec::required(
                    "year",
                    FieldKind::Integer,
                    "The year when there was an important historic development.",
                ),
                FieldSpec::required(
                    "description",
                    FieldKind::String,
                    "What happened in this year? What was the development?",
                ),
                FieldSpec::required(
                    "evidence",
                    FieldKind::String,
                    "Repeat in verbatim the sentence(s) from which the year and description information were extracted.",
                ),
            ],
        }
    }

    /// Validate the schema before use
    pub fn validate(&self) -> Result<(), ExtractorError> {
        let invalid = |msg: String| Err(ExtractorError::InvalidConfiguration(msg));

        if self.name.trim().is_empty() {
            return invalid("schema name must not be empty".to_string());
        }
        if self.collection.trim().is_empty() {
            return invalid("schema collection key must not be empty".to_string());
        }
        if self.fields.is_empty() {
            return invalid(format!("schema '{}' declares no fields", self.name));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return invalid("field names must not be empty".to_string());
            }
            if !seen.insert(field.name.as_str()) {
                return invalid(format!("duplicate field '{}'", field.name));
            }
        }

        match self.field(&self.evidence_field) {
            None => invalid(format!("evidence field '{}' is not declared", self.evidence_field)),
            Some(f) if f.kind != FieldKind::String || !f.required => invalid(format!(
                "evidence field '{}' must be a required string",
                self.evidence_field
            )),
            Some(_) => Ok(()),
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render as a JSON Schema for structured-output model APIs
    ///
    /// Every field is listed as required; optional fields are nullable
    /// instead, which strict structured-output modes demand.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let kind = if field.required {
                json!(field.kind.json_type())
            } else {
                json!([field.kind.json_type(), "null"])
            };
            properties.insert(
                field.name.clone(),
                json!({ "type": kind, "description": field.description }),
            );
        }
        let required: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();

        let mut collection = Map::new();
        collection.insert(
            self.collection.clone(),
            json!({
                "type": "array",
                "description": format!("Extracted {} records. Empty when nothing relevant is found.", self.name),
                "items": {
                    "type": "object",
                    "description": self.description,
                    "properties": properties,
                    "required": required,
                    "additionalProperties": false,
                },
            }),
        );

        json!({
            "title": self.name,
            "type": "object",
            "properties": collection,
            "required": [self.collection],
            "additionalProperties": false,
        })
    }

    /// Convert one element of the model's record array into a typed record
    pub fn conform(&self, value: &Value) -> Result<ExtractedRecord, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| "record is not a JSON object".to_string())?;

        let mut record = ExtractedRecord::new();
        for field in &self.fields {
            let raw = obj.get(&field.name).filter(|v| !v.is_null());
            let converted = match raw {
                None if field.required => {
                    return Err(format!("missing required field '{}'", field.name));
                }
                None => FieldValue::Null,
                Some(v) => convert(field, v)?,
            };
            record.set(field.name.clone(), converted);
        }
        Ok(record)
    }

    /// Load a schema from a TOML string and validate it
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let schema: Self = toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse schema TOML: {}", e)))?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load a schema from a TOML file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExtractorError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ExtractorError::Config(format!("Failed to read {}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Serialize the schema to a TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize schema: {}", e)))
    }
}

fn convert(field: &FieldSpec, value: &Value) -> Result<FieldValue, String> {
    let mismatch = || format!("field '{}' is not a valid {}", field.name, field.kind.json_type());
    match field.kind {
        FieldKind::String => value
            .as_str()
            .map(|s| FieldValue::Text(s.to_string()))
            .ok_or_else(mismatch),
        FieldKind::Integer => value
            .as_i64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
                    .map(|f| f as i64)
            })
            .map(FieldValue::Integer)
            .ok_or_else(mismatch),
        FieldKind::Number => value.as_f64().map(FieldValue::Number).ok_or_else(mismatch),
        FieldKind::Boolean => value.as_bool().map(FieldValue::Boolean).ok_or_else(mismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_developments_is_valid() {
        let schema = ExtractionSchema::key_developments();
        assert!(schema.validate().is_ok());
        assert_eq!(schema.collection, "records");
        assert_eq!(schema.fields.len(), 3);
    }

    #[test]
    fn test_missing_evidence_field() {
        let mut schema = ExtractionSchema::key_developments();
        schema.evidence_field = "quote".to_string();
        assert!(matches!(schema.validate(), Err(ExtractorError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_evidence_field_must_be_string() {
        let mut schema = ExtractionSchema::key_developments();
        schema.evidence_field = "year".to_string();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_duplicate_field_names() {
        let mut schema = ExtractionSchema::key_developments();
        schema.fields.push(FieldSpec::required("year", FieldKind::Integer, "again"));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_no_fields() {
        let mut schema = ExtractionSchema::key_developments();
        schema.fields.clear();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_json_schema_shape() {
        let mut schema = ExtractionSchema::key_developments();
        schema.fields.push(FieldSpec::optional("place", FieldKind::String, "Where it happened"));
        let rendered = schema.json_schema();

        assert_eq!(rendered["title"], "key_developments");
        assert_eq!(rendered["required"][0], "records");
        let items = &rendered["properties"]["records"]["items"];
        assert_eq!(items["properties"]["year"]["type"], "integer");
        assert_eq!(items["properties"]["place"]["type"], json!(["string", "null"]));
        assert_eq!(items["required"].as_array().unwrap().len(), 4);
        assert_eq!(items["additionalProperties"], false);
    }

    #[test]
    fn test_conform_valid_record() {
        let schema = ExtractionSchema::key_developments();
        let record = schema
            .conform(&json!({
                "year": 1886,
                "description": "First automobile patented",
                "evidence": "Karl Benz patented the Benz Patent-Motorwagen in 1886.",
                "extra": "ignored"
            }))
            .unwrap();

        assert_eq!(record.get("year"), Some(&FieldValue::Integer(1886)));
        assert_eq!(record.len(), 3);
        assert!(record.get("extra").is_none());
    }

    #[test]
    fn test_conform_accepts_integral_float_for_integer() {
        let schema = ExtractionSchema::key_developments();
        let record = schema
            .conform(&json!({"year": 1908.0, "description": "d", "evidence": "e"}))
            .unwrap();
        assert_eq!(record.get("year"), Some(&FieldValue::Integer(1908)));

        let err = schema
            .conform(&json!({"year": 1908.5, "description": "d", "evidence": "e"}))
            .unwrap_err();
        assert!(err.contains("year"));
    }

    #[test]
    fn test_conform_rejects_integer_out_of_range() {
        let schema = ExtractionSchema::key_developments();
        for year in [1e30, -1e30, 9.3e18] {
            let err = schema
                .conform(&json!({"year": year, "description": "d", "evidence": "e"}))
                .unwrap_err();
            assert!(err.contains("year"), "{} accepted", year);
        }
    }

    #[test]
    fn test_conform_rejects_missing_and_wrong_kinds() {
        let schema = ExtractionSchema::key_developments();
        assert!(schema.conform(&json!({"year": 1886, "description": "d"})).is_err());
        assert!(schema.conform(&json!({"year": "1886", "description": "d", "evidence": "e"})).is_err());
        assert!(schema.conform(&json!({"year": 1886, "description": null, "evidence": "e"})).is_err());
        assert!(schema.conform(&json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_conform_optional_field_null() {
        let mut schema = ExtractionSchema::key_developments();
        schema.fields.push(FieldSpec::optional("place", FieldKind::String, "Where"));
        let record = schema
            .conform(&json!({"year": 1, "description": "d", "evidence": "e", "place": null}))
            .unwrap();
        assert!(record.get("place").unwrap().is_null());
    }

    #[test]
    fn test_toml_round_trip() {
        let schema = ExtractionSchema::key_developments();
        let toml_str = schema.to_toml().unwrap();
        let parsed = ExtractionSchema::from_toml(&toml_str).unwrap();
        assert_eq!(schema, parsed);
    }

    #[test]
    fn test_from_toml_defaults() {
        let toml_str = r#"
            name = "people"
            description = "A person mentioned in the text"
            evidence_field = "quote"

            [[fields]]
            name = "name"
            kind = "string"
            description = "Full name"

            [[fields]]
            name = "quote"
            kind = "string"
            description = "Verbatim sentence mentioning the person"

            [[fields]]
            name = "age"
            kind = "integer"
            description = "Age if stated"
            required = false
        "#;
        let schema = ExtractionSchema::from_toml(toml_str).unwrap();
        assert_eq!(schema.collection, "records");
        assert!(schema.fields[0].required);
        assert!(!schema.fields[2].required);
        assert!(schema.instructions.is_none());
    }

    #[test]
    fn test_from_toml_rejects_invalid_schema() {
        let toml_str = r#"
            name = "broken"
            description = "d"
            evidence_field = "missing"

            [[fields]]
            name = "a"
            kind = "string"
            description = "a"
        "#;
        assert!(matches!(
            ExtractionSchema::from_toml(toml_str),
            Err(ExtractorError::InvalidConfiguration(_))
        ));
    }
}
