//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde_json::{json, Value};
use sift_domain::{ExtractedRecord, FieldValue, Segment};
use sift_extractor::{ExtractionReport, ExtractionSchema, ExtractionStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Characters of segment text shown in the chunk table
const PREVIEW_CHARS: usize = 48;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an extraction report.
    pub fn format_report(&self, report: &ExtractionReport, schema: &ExtractionSchema) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&report_json(report))?),
            OutputFormat::Table => Ok(self.format_report_table(report, schema)),
            OutputFormat::Quiet => self.format_report_quiet(report),
        }
    }

    fn format_report_table(&self, report: &ExtractionReport, schema: &ExtractionSchema) -> String {
        let mut out = String::new();

        if report.records.is_empty() {
            out.push_str(&self.colorize("No records found.", "yellow"));
        } else {
            let mut builder = Builder::default();
            let mut header = vec!["Segment".to_string()];
            header.extend(schema.fields.iter().map(|f| f.name.clone()));
            builder.push_record(header);

            for entry in report.records.entries() {
                let mut row = vec![entry.segment_index.to_string()];
                row.extend(
                    schema
                        .fields
                        .iter()
                        .map(|f| entry.record.get(&f.name).map(ToString::to_string).unwrap_or_default()),
                );
                builder.push_record(row);
            }

            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            out.push_str(&table.to_string());
        }
        out.push('\n');

        for failure in &report.failures {
            out.push_str(&self.error(&format!(
                "Segment {} failed after {} attempt(s): {}",
                failure.segment_index, failure.attempts, failure.error
            )));
            out.push('\n');
        }

        let summary = format!(
            "{} record(s) from {}/{} segment(s), {} duplicate(s) removed, {} ms [{}]",
            report.records.len(),
            report.segments_processed,
            report.segments_total,
            report.duplicates_removed,
            report.metadata.processing_time_ms,
            report.status()
        );
        out.push_str(&match report.status() {
            ExtractionStatus::Complete => self.success(&summary),
            ExtractionStatus::NoRecords => self.info(&summary),
            ExtractionStatus::Partial => self.warning(&summary),
            ExtractionStatus::Failed => self.error(&summary),
        });

        out
    }

    /// One compact JSON object per record.
    fn format_report_quiet(&self, report: &ExtractionReport) -> Result<String> {
        let lines = report
            .records
            .records()
            .map(|r| serde_json::to_string(&record_json(r)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(lines.join("\n"))
    }

    /// Format a list of segments.
    pub fn format_segments(&self, segments: &[Segment]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let items: Vec<Value> = segments
                    .iter()
                    .map(|s| {
                        json!({
                            "index": s.index,
                            "byte_start": s.byte_range.start,
                            "byte_end": s.byte_range.end,
                            "unit_start": s.unit_range.start,
                            "unit_end": s.unit_range.end,
                            "text": s.text,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&items)?)
            }
            OutputFormat::Quiet => Ok(segments.len().to_string()),
            OutputFormat::Table => {
                if segments.is_empty() {
                    return Ok(self.colorize("No segments.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Index", "Bytes", "Units", "Preview"]);
                for s in segments {
                    builder.push_record([
                        s.index.to_string(),
                        format!("{}..{}", s.byte_range.start, s.byte_range.end),
                        format!("{}..{}", s.unit_range.start, s.unit_range.end),
                        preview(&s.text),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Convert a field value to JSON.
pub fn field_value_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => json!(s),
        FieldValue::Integer(i) => json!(i),
        FieldValue::Number(n) => json!(n),
        FieldValue::Boolean(b) => json!(b),
        FieldValue::Null => Value::Null,
    }
}

/// Convert a record to a JSON object.
pub fn record_json(record: &ExtractedRecord) -> Value {
    let fields = record
        .fields()
        .map(|(name, value)| (name.to_string(), field_value_json(value)))
        .collect::<serde_json::Map<_, _>>();
    Value::Object(fields)
}

fn report_json(report: &ExtractionReport) -> Value {
    let records: Vec<Value> = report
        .records
        .entries()
        .iter()
        .map(|e| json!({ "segment": e.segment_index, "record": record_json(&e.record) }))
        .collect();
    let failures: Vec<Value> = report
        .failures
        .iter()
        .map(|f| json!({ "segment": f.segment_index, "attempts": f.attempts, "error": f.error.to_string() }))
        .collect();

    json!({
        "status": report.status().to_string(),
        "source": report.metadata.source_id,
        "model": report.metadata.model_name,
        "strategy": report.metadata.strategy,
        "timestamp": report.metadata.timestamp,
        "processing_time_ms": report.metadata.processing_time_ms,
        "segments_total": report.segments_total,
        "segments_processed": report.segments_processed,
        "duplicates_removed": report.duplicates_removed,
        "retries": report.stats.retries,
        "records": records,
        "failures": failures,
    })
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_extractor::{
        DispatchStats, ExtractionMetadata, ExtractorError, ResultSet, SegmentFailure,
    };

    fn create_test_report(with_failure: bool) -> ExtractionReport {
        let mut records = ResultSet::new();
        records.push(
            0,
            ExtractedRecord::new()
                .with_field("year", FieldValue::Integer(1886))
                .with_field("description", FieldValue::Text("Benz Patent-Motorwagen".into()))
                .with_field("evidence", FieldValue::Text("Karl Benz patented it in 1886.".into())),
        );
        let failures = if with_failure {
            vec![SegmentFailure {
                segment_index: 1,
                attempts: 3,
                error: ExtractorError::Service("connection refused".into()),
            }]
        } else {
            Vec::new()
        };

        ExtractionReport {
            records,
            failures,
            segments_processed: 2,
            segments_total: 2,
            duplicates_removed: 0,
            stats: DispatchStats::default(),
            metadata: ExtractionMetadata {
                source_id: "cars.txt".into(),
                model_name: "mock".into(),
                strategy: "brute_force".into(),
                timestamp: 0,
                processing_time_ms: 12,
            },
        }
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter
            .format_report(&create_test_report(true), &ExtractionSchema::key_developments())
            .unwrap();

        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["status"], "partial");
        assert_eq!(parsed["records"][0]["record"]["year"], 1886);
        assert_eq!(parsed["failures"][0]["segment"], 1);
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter
            .format_report(&create_test_report(false), &ExtractionSchema::key_developments())
            .unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains(r#""year":1886"#));
        assert!(!output.contains("segment"));
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_report(&create_test_report(true), &ExtractionSchema::key_developments())
            .unwrap();
        assert!(output.contains("evidence"));
        assert!(output.contains("1886"));
        assert!(output.contains("Segment 1 failed after 3 attempt(s)"));
        assert!(output.contains("[partial]"));
    }

    #[test]
    fn test_empty_report() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut report = create_test_report(false);
        report.records = ResultSet::new();
        let output = formatter
            .format_report(&report, &ExtractionSchema::key_developments())
            .unwrap();
        assert!(output.contains("No records found"));
        assert!(output.contains("[no records]"));
    }

    #[test]
    fn test_segments_table_and_json() {
        let segments = vec![Segment::new(0, "one two three".into(), 0..13, 0..3)];

        let table = Formatter::new(OutputFormat::Table, false).format_segments(&segments).unwrap();
        assert!(table.contains("0..13"));
        assert!(table.contains("one two three"));

        let json = Formatter::new(OutputFormat::Json, false).format_segments(&segments).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["unit_end"], 3);
    }

    #[test]
    fn test_preview_truncates() {
        let long = "word ".repeat(40);
        let p = preview(&long);
        assert!(p.ends_with('…'));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
