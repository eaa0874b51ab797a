//! Parse model output into typed records

use serde_json::Value;
use sift_domain::ExtractedRecord;

use crate::error::ExtractorError;
use crate::schema::ExtractionSchema;

/// Parse a structured-output response into records
///
/// The response must be an object holding the schema's collection key mapped
/// to an array. Every element must conform to the schema; one bad element
/// fails the whole response.
pub fn parse_response(
    response: &str,
    schema: &ExtractionSchema,
) -> Result<Vec<ExtractedRecord>, ExtractorError> {
    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(json_str)?;

    let obj = json
        .as_object()
        .ok_or_else(|| ExtractorError::InvalidFormat("Expected JSON object".to_string()))?;

    let items = obj
        .get(&schema.collection)
        .ok_or_else(|| {
            ExtractorError::InvalidFormat(format!("Missing '{}' key", schema.collection))
        })?
        .as_array()
        .ok_or_else(|| {
            ExtractorError::InvalidFormat(format!("'{}' is not an array", schema.collection))
        })?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            schema
                .conform(item)
                .map_err(|e| ExtractorError::InvalidFormat(format!("record {}: {}", idx, e)))
        })
        .collect()
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<&str, ExtractorError> {
    let trimmed = response.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return Ok(trimmed);
    };

    // Drop the closing fence and an optional language tag (```json)
    let body = rest.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    let tag_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let body = match body[tag_len..].chars().next() {
        Some(c) if c.is_whitespace() => &body[tag_len..],
        None => "",
        _ => body,
    };

    let body = body.trim();
    if body.is_empty() {
        return Err(ExtractorError::InvalidFormat("Empty code block".to_string()));
    }
    Ok(body)
}
