//! Normalized execution results.

use crate::error::RenderError;
use crate::value::Value;
use csv::WriterBuilder;
use serde_json::json;
use smol_str::SmolStr;
use std::fmt;

/// Shape of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultFormat {
    Scalar,
    Tabular,
}

impl ResultFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultFormat::Scalar => "SCALAR",
            ResultFormat::Tabular => "TABULAR",
        }
    }
}

impl fmt::Display for ResultFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded result value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Scalar(Value),
    Table {
        columns: Vec<SmolStr>,
        rows: Vec<Vec<Value>>,
    },
}

/// The outcome of executing a catalog function.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub value: ResultValue,
    pub format: ResultFormat,
    /// The backend capped the output; a table's rows are a prefix.
    pub truncated: bool,
}

impl ExecutionResult {
    pub fn scalar(value: impl Into<Value>, truncated: bool) -> Self {
        Self {
            value: ResultValue::Scalar(value.into()),
            format: ResultFormat::Scalar,
            truncated,
        }
    }

    pub fn table(columns: Vec<SmolStr>, rows: Vec<Vec<Value>>, truncated: bool) -> Self {
        Self {
            value: ResultValue::Table { columns, rows },
            format: ResultFormat::Tabular,
            truncated,
        }
    }

    /// The scalar value, if this is a scalar result.
    pub fn as_scalar(&self) -> Option<&Value> {
        match &self.value {
            ResultValue::Scalar(value) => Some(value),
            ResultValue::Table { .. } => None,
        }
    }

    /// Text handed to agent frameworks: the value's text for scalars, CSV
    /// with a header row for tables.
    pub fn render(&self) -> Result<String, RenderError> {
        match &self.value {
            ResultValue::Scalar(value) => Ok(value.to_text()),
            ResultValue::Table { columns, rows } => {
                let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
                writer.write_record(columns.iter().map(SmolStr::as_str))?;
                for row in rows {
                    writer.write_record(
                        row.iter()
                            .map(|cell| if cell.is_null() { String::new() } else { cell.to_text() }),
                    )?;
                }
                let bytes = writer.into_inner().map_err(|err| RenderError::from(err.into_error()))?;
                String::from_utf8(bytes).map_err(|err| RenderError {
                    message: err.to_string(),
                })
            }
        }
    }

    /// JSON envelope `{"format", "value"[, "truncated"]}`.
    pub fn to_json(&self) -> Result<serde_json::Value, RenderError> {
        let mut envelope = json!({
            "format": self.format.as_str(),
            "value": self.render()?,
        });
        if self.truncated {
            envelope["truncated"] = json!(true);
        }
        Ok(envelope)
    }
}
