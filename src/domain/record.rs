//! Collected records
//!
//! The core does not model the schema of what a step returns. A record is an
//! ordered map of field name to scalar JSON value; the field set is decided
//! entirely by the query that produced it.

use serde_json::{Map, Value};

/// One row of a collection result
pub type Record = Map<String, Value>;

/// Ordered sequence of records returned by one step invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionResult {
    records: Vec<Record>,
}

impl CollectionResult {
    /// Create a result from records, keeping their order
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// An empty result
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of field names across all records, in order of first appearance
    ///
    /// Used as the column list of the delimited output so every chunk of the
    /// same result shares one header.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for record in &self.records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Parse a query tool's JSON output
    ///
    /// Accepts a JSON array of objects, a single object, or one object per
    /// line (JSON lines). Blank output is an empty result.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }

        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return Self::from_value(value);
        }

        let mut records = Vec::new();
        for (line_no, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(Value::Object(map)) => records.push(map),
                Ok(other) => {
                    return Err(format!(
                        "line {} is not a JSON object: {}",
                        line_no + 1,
                        type_name(&other)
                    ))
                }
                Err(e) => return Err(format!("line {}: {}", line_no + 1, e)),
            }
        }
        Ok(Self::new(records))
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        Value::Object(map) => records.push(map),
                        other => {
                            return Err(format!(
                                "element {} is not a JSON object: {}",
                                i,
                                type_name(&other)
                            ))
                        }
                    }
                }
                Ok(Self::new(records))
            }
            Value::Object(map) => Ok(Self::new(vec![map])),
            Value::Null => Ok(Self::empty()),
            other => Err(format!("expected a JSON array of objects, got {}", type_name(&other))),
        }
    }
}

impl From<Vec<Record>> for CollectionResult {
    fn from(records: Vec<Record>) -> Self {
        Self::new(records)
    }
}

/// Render a scalar value as a delimited-file cell
///
/// Strings are written raw, null becomes an empty cell, nested values are
/// written as compact JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
