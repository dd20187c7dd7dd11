// Dataset parser - One JSON object of timestamp -> value per line
use crate::domain::error::ParseError;
use crate::domain::publish::PublishRecord;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub timestamp: String,
    pub value: f64,
}

/// Entries of one line plus the ones that had to be left out.
#[derive(Debug, Default)]
pub struct ParsedLine {
    pub entries: Vec<DatasetEntry>,
    pub rejected: Vec<ParseError>,
}

#[derive(Debug, Default)]
pub struct ParsedDataset {
    pub records: Vec<PublishRecord>,
    /// Every rejected line or entry.
    pub skipped: Vec<ParseError>,
    /// Lines dropped as a whole; bad entries on a usable line do not count.
    pub skipped_lines: usize,
}

/// Parse a single line. Line-level failures are errors, bad entries are collected.
pub fn parse_line(line_no: usize, line: &str) -> Result<ParsedLine, ParseError> {
    let parsed: Value = serde_json::from_str(line.trim()).map_err(|source| ParseError::InvalidJson {
        line: line_no,
        source,
    })?;

    let Value::Object(map) = parsed else {
        return Err(ParseError::NotAnObject { line: line_no });
    };

    let mut result = ParsedLine::default();
    for (timestamp, raw) in map {
        if timestamp.trim().is_empty() {
            result.rejected.push(ParseError::EmptyTimestamp { line: line_no });
            continue;
        }

        match numeric_value(&raw) {
            Some(value) => result.entries.push(DatasetEntry { timestamp, value }),
            None => result.rejected.push(ParseError::NonNumeric {
                line: line_no,
                timestamp,
                value: raw.to_string(),
            }),
        }
    }

    Ok(result)
}

/// Parse every line into records for `topic`, skipping what cannot be used.
pub fn parse_dataset<'a, I>(lines: I, topic: &str) -> ParsedDataset
where
    I: IntoIterator<Item = &'a str>,
{
    let mut dataset = ParsedDataset::default();

    for (idx, line) in lines.into_iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(idx + 1, line) {
            Ok(parsed) => {
                dataset.records.extend(
                    parsed
                        .entries
                        .into_iter()
                        .map(|entry| PublishRecord::new(topic, entry.timestamp, entry.value)),
                );
                for rejected in parsed.rejected {
                    tracing::warn!("Skipping dataset entry: {}", rejected);
                    dataset.skipped.push(rejected);
                }
            }
            Err(e) => {
                tracing::warn!("Skipping dataset line: {}", e);
                dataset.skipped_lines += 1;
                dataset.skipped.push(e);
            }
        }
    }

    dataset
}

fn numeric_value(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}
