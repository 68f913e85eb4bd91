//! DDL text generation.
//!
//! The output is parsed by the catalog service as standard SQL, so the
//! clause order and literal quoting here are exact.

use crate::catalog::FunctionName;
use crate::compiler::FunctionParameter;
use crate::types::SqlType;
use crate::value::{Value, format_timestamp};

/// Quotes `text` as a SQL string literal, doubling embedded single quotes.
pub fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Renders a native value as a SQL literal.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Boolean(true) => "TRUE".to_string(),
        Value::Boolean(false) => "FALSE".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(x) => float_literal(*x),
        Value::Decimal(d) => d.to_string(),
        Value::String(s) => quote_string(s),
        Value::Date(d) => format!("DATE '{d}'"),
        Value::Timestamp(ts) => format!("TIMESTAMP '{}'", format_timestamp(ts)),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(sql_literal).collect();
            format!("ARRAY({})", items.join(", "))
        }
        Value::Map(entries) => {
            let items: Vec<String> = entries
                .iter()
                .flat_map(|(k, v)| [sql_literal(k), sql_literal(v)])
                .collect();
            format!("MAP({})", items.join(", "))
        }
    }
}

fn float_literal(x: f64) -> String {
    if x.is_nan() {
        return "CAST('NaN' AS DOUBLE)".to_string();
    }
    if x.is_infinite() {
        let sign = if x > 0.0 { "" } else { "-" };
        return format!("CAST('{sign}Infinity' AS DOUBLE)");
    }
    let text = x.to_string();
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

/// Removes the whitespace prefix shared by all non-blank lines, plus
/// leading and trailing blank lines.
pub fn dedent(body: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let start = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(start, |i| i + 1);

    lines[start..end]
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.get(indent..).unwrap_or_else(|| line.trim_start())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Renders one parameter clause: `<name> <TYPE>[ DEFAULT <lit>][ COMMENT '<c>']`.
pub fn parameter_clause(parameter: &FunctionParameter) -> String {
    let mut clause = format!("{} {}", parameter.name, parameter.sql_type);
    if parameter.has_default {
        let default = parameter.default_value.as_ref().unwrap_or(&Value::Null);
        clause.push_str(" DEFAULT ");
        clause.push_str(&sql_literal(default));
    }
    if !parameter.comment.is_empty() {
        clause.push_str(" COMMENT ");
        clause.push_str(&quote_string(&parameter.comment));
    }
    clause
}

/// Pieces of a `CREATE OR REPLACE FUNCTION` statement.
#[derive(Debug, Clone, Copy)]
pub struct CreateFunction<'a> {
    pub name: &'a FunctionName,
    pub parameters: &'a [FunctionParameter],
    pub return_type: &'a SqlType,
    pub language: &'a str,
    pub comment: &'a str,
    /// Already dedented.
    pub body: &'a str,
}

impl CreateFunction<'_> {
    pub fn render(&self) -> String {
        let parameters: Vec<String> = self.parameters.iter().map(parameter_clause).collect();
        format!(
            "CREATE OR REPLACE FUNCTION {name}({parameters})\n\
             RETURNS {returns}\n\
             LANGUAGE {language}\n\
             COMMENT {comment}\n\
             AS $$\n\
             {body}\n\
             $$",
            name = self.name,
            parameters = parameters.join(", "),
            returns = self.return_type,
            language = self.language.to_ascii_uppercase(),
            comment = quote_string(self.comment),
            body = self.body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn scalar_literals() {
        assert_eq!(sql_literal(&Value::Null), "NULL");
        assert_eq!(sql_literal(&Value::Boolean(false)), "FALSE");
        assert_eq!(sql_literal(&Value::Integer(-3)), "-3");
        assert_eq!(sql_literal(&Value::Float(1.0)), "1.0");
        assert_eq!(sql_literal(&Value::Float(0.25)), "0.25");
        assert_eq!(sql_literal(&Value::Float(1e20)), "100000000000000000000.0");
        assert_eq!(
            sql_literal(&Value::Decimal(Decimal::from_str("12.50").unwrap())),
            "12.50"
        );
        assert_eq!(sql_literal(&Value::from("it's")), "'it''s'");
    }

    #[test]
    fn temporal_and_collection_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(sql_literal(&Value::Date(date)), "DATE '2024-01-02'");
        let ts = date.and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(
            sql_literal(&Value::Timestamp(ts)),
            "TIMESTAMP '2024-01-02T03:04:05'"
        );
        assert_eq!(
            sql_literal(&Value::from(vec!["a", "b"])),
            "ARRAY('a', 'b')"
        );
        assert_eq!(
            sql_literal(&Value::map_of([("k", Value::Integer(1))])),
            "MAP('k', 1)"
        );
        assert_eq!(sql_literal(&Value::Array(vec![])), "ARRAY()");
    }

    #[test]
    fn dedent_strips_common_prefix() {
        let body = "\n        x = 1\n\n          return x\n    ";
        assert_eq!(dedent(body), "x = 1\n\n  return x");
        assert_eq!(dedent("return 1"), "return 1");
        assert_eq!(dedent("   \n  "), "");
    }

    #[test]
    fn parameter_clause_variants() {
        let mut parameter = FunctionParameter {
            name: "x".into(),
            sql_type: SqlType::STRING,
            description: String::new(),
            has_default: false,
            default_value: None,
            comment: String::new(),
        };
        assert_eq!(parameter_clause(&parameter), "x STRING");

        parameter.has_default = true;
        parameter.comment = "the user's name".into();
        assert_eq!(
            parameter_clause(&parameter),
            "x STRING DEFAULT NULL COMMENT 'the user''s name'"
        );

        parameter.default_value = Some(Value::from("anon"));
        assert_eq!(
            parameter_clause(&parameter),
            "x STRING DEFAULT 'anon' COMMENT 'the user''s name'"
        );
    }
}
