//! Prompt construction for structured extraction

use crate::schema::ExtractionSchema;

/// Builds the prompt for one segment
pub struct PromptBuilder<'a> {
    schema: &'a ExtractionSchema,
    text: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(schema: &'a ExtractionSchema, text: &'a str) -> Self {
        Self { schema, text }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Role and task
        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. What a record is and the fields it carries
        prompt.push_str(&format!("Record type: {}\n", self.schema.name));
        prompt.push_str(&format!("{}\n\n", self.schema.description));
        prompt.push_str("Fields:\n");
        for field in &self.schema.fields {
            let optional = if field.required { "" } else { ", optional" };
            prompt.push_str(&format!(
                "- {} ({}{}): {}\n",
                field.name,
                kind_label(field),
                optional,
                field.description
            ));
        }
        prompt.push('\n');

        if let Some(instructions) = &self.schema.instructions {
            prompt.push_str(instructions);
            prompt.push_str("\n\n");
        }

        // 3. The text to analyze
        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(self.text);
        prompt.push_str("\n---\n\n");

        // 4. Output format reminder
        prompt.push_str(&format!(
            "Output a JSON object with a single key \"{}\" holding the list of records. \
             If nothing relevant is found, return an empty list.\n",
            self.schema.collection
        ));
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

fn kind_label(field: &crate::schema::FieldSpec) -> &'static str {
    use crate::schema::FieldKind;
    match field.kind {
        FieldKind::String => "text",
        FieldKind::Integer => "integer",
        FieldKind::Number => "number",
        FieldKind::Boolean => "true/false",
    }
}

const EXTRACTION_INSTRUCTIONS: &str = "You are an expert at identifying key information in text. \
Only extract information that is stated in the text. \
Extract nothing if no relevant information can be found in the text.";

const OUTPUT_FORMAT_REMINDER: &str =
    "Remember: Return ONLY valid JSON, no markdown code blocks, no explanations.";
