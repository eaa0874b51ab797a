//! Schema command implementation.

use super::load_schema;
use crate::cli::SchemaArgs;
use crate::error::Result;

/// Execute the schema command.
pub fn execute_schema(args: SchemaArgs) -> Result<()> {
    println!("{}", render_schema(&args)?);
    Ok(())
}

/// Render the selected schema as TOML, or as the JSON Schema sent to the model.
pub fn render_schema(args: &SchemaArgs) -> Result<String> {
    let schema = load_schema(args.schema.as_ref())?;
    if args.json_schema {
        Ok(serde_json::to_string_pretty(&schema.json_schema())?)
    } else {
        Ok(schema.to_toml()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use sift_extractor::ExtractionSchema;

    #[test]
    fn test_default_schema_as_toml() {
        let out = render_schema(&SchemaArgs {
            schema: None,
            json_schema: false,
        })
        .unwrap();

        let parsed = ExtractionSchema::from_toml(&out).unwrap();
        assert_eq!(parsed, ExtractionSchema::key_developments());
    }

    #[test]
    fn test_json_schema_output() {
        let out = render_schema(&SchemaArgs {
            schema: None,
            json_schema: true,
        })
        .unwrap();

        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["type"], "object");
        assert_eq!(parsed["properties"]["records"]["type"], "array");
    }

    #[test]
    fn test_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.toml");
        std::fs::write(
            &path,
            r#"
name = "person"
description = "People mentioned in the text"
collection = "people"
evidence_field = "quote"

[[fields]]
name = "name"
kind = "string"
description = "Full name"

[[fields]]
name = "quote"
kind = "string"
description = "Sentence mentioning the person"
"#,
        )
        .unwrap();

        let out = render_schema(&SchemaArgs {
            schema: Some(path),
            json_schema: true,
        })
        .unwrap();
        assert!(out.contains("\"people\""));
    }
}
