use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{BufRead as _, BufReader, ErrorKind, Lines};
use std::path::Path;

use anyhow::Context as _;
use serde_json::{Map, Value};

use crate::error::RecordError;
use crate::formats::RawRecord;

/// Checked in order; the first non-null one is the payload.
pub const PAYLOAD_KEYS: &[&str] = &["payload_json", "payload", "data", "body"];

#[derive(Debug)]
pub enum RawLine {
    Record { line: usize, record: RawRecord },
    Malformed { line: usize, error: RecordError },
}

pub struct JsonlReader {
    lines: Lines<BufReader<File>>,
    line: usize,
    done: bool,
}

impl JsonlReader {
    /// Opening is the only fatal step of a run.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("open input jsonl: {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line: 0,
            done: false,
        })
    }
}

impl Iterator for JsonlReader {
    type Item = RawLine;

    fn next(&mut self) -> Option<RawLine> {
        while !self.done {
            let next = self.lines.next()?;
            self.line += 1;
            let line = self.line;

            let text = match next {
                Ok(text) => text,
                Err(err) if err.kind() == ErrorKind::InvalidData => {
                    return Some(RawLine::Malformed {
                        line,
                        error: RecordError::Unreadable(err),
                    });
                }
                Err(err) => {
                    tracing::warn!(line, %err, "input read failed; stopping early");
                    self.done = true;
                    return None;
                }
            };
            if text.trim().is_empty() {
                continue;
            }

            return Some(match parse_line(&text) {
                Ok(record) => RawLine::Record { line, record },
                Err(error) => RawLine::Malformed { line, error },
            });
        }
        None
    }
}

pub fn parse_line(text: &str) -> Result<RawRecord, RecordError> {
    let value: Value = serde_json::from_str(text).map_err(RecordError::InvalidJson)?;
    match value {
        Value::Object(map) => Ok(raw_record_from_map(map)),
        _ => Err(RecordError::NotAnObject),
    }
}

fn raw_record_from_map(mut map: Map<String, Value>) -> RawRecord {
    let payload = PAYLOAD_KEYS
        .iter()
        .find(|key| map.get(**key).is_some_and(|v| !v.is_null()))
        .and_then(|key| map.remove(*key));
    let list_data = map.remove("list_data").filter(|v| !v.is_null());

    let text = |key: &str| match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    };

    RawRecord {
        platform_code: text("platform_code"),
        source_url: text("source_url"),
        request_url: text("request_url"),
        collected_at: text("collected_at"),
        payload,
        list_data,
    }
}

/// Decode a payload captured as a JSON-encoded string. Other strings (HTML,
/// plain text) and non-string values are returned as they are.
pub fn decode_embedded(value: &Value) -> Result<Cow<'_, Value>, RecordError> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                let decoded = serde_json::from_str(text).map_err(RecordError::EmbeddedPayload)?;
                Ok(Cow::Owned(decoded))
            } else {
                Ok(Cow::Borrowed(value))
            }
        }
        _ => Ok(Cow::Borrowed(value)),
    }
}
