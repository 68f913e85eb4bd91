//! The SQL → native direction of the type mapper.
//!
//! Two jobs live here: checking that a caller's argument has a shape the
//! declared `SqlType` can represent, and decoding raw backend cells into
//! native values.
//!
//! DECIMAL results are decoded into `Value::Float`, so decimals with more
//! significant digits than an `f64` carries come back rounded. A `warn!`
//! event is emitted whenever the rounding actually changes the value.

use super::sql::{ScalarKind, SqlType};
use crate::value::{Value, parse_iso_date, parse_iso_timestamp};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value as Json;
use std::str::FromStr;

/// An argument whose shape does not fit its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMismatch {
    pub expected: SqlType,
    pub found: String,
    /// Position inside a collection, e.g. `[1]` or `["k"]`; `None` at top level.
    pub at: Option<String>,
}

/// Checks that `value` is representable as `ty`.
///
/// `NULL` is representable as every type.
pub fn check_value(ty: &SqlType, value: &Value) -> Result<(), ShapeMismatch> {
    check_at(ty, value, &mut String::new())
}

fn check_at(ty: &SqlType, value: &Value, at: &mut String) -> Result<(), ShapeMismatch> {
    let mismatch = |found: String, at: &str| ShapeMismatch {
        expected: ty.clone(),
        found,
        at: (!at.is_empty()).then(|| at.to_string()),
    };

    match (ty, value) {
        (_, Value::Null) => Ok(()),
        (_, Value::Float(x)) if !x.is_finite() && !at.is_empty() => {
            Err(mismatch(format!("non-finite float `{x}` inside a collection"), at))
        }
        (SqlType::Scalar(kind), value) => {
            let fits = match (kind, value) {
                (ScalarKind::Integer, Value::Integer(_)) => true,
                (ScalarKind::Double, Value::Float(_) | Value::Integer(_)) => true,
                (ScalarKind::Decimal, Value::Decimal(_) | Value::Float(_) | Value::Integer(_)) => {
                    true
                }
                (ScalarKind::String, Value::String(_)) => true,
                (ScalarKind::Boolean, Value::Boolean(_)) => true,
                (ScalarKind::Date, Value::Date(_)) => true,
                (ScalarKind::Timestamp, Value::Timestamp(_)) => true,
                (ScalarKind::Date, Value::String(s)) => {
                    return if parse_iso_date(s).is_some() {
                        Ok(())
                    } else {
                        Err(mismatch(format!("non-ISO date string `{s}`"), at))
                    };
                }
                (ScalarKind::Timestamp, Value::String(s)) => {
                    return if parse_iso_timestamp(s).is_some() {
                        Ok(())
                    } else {
                        Err(mismatch(format!("non-ISO datetime string `{s}`"), at))
                    };
                }
                _ => false,
            };
            if fits {
                Ok(())
            } else {
                Err(mismatch(value.kind_name().to_string(), at))
            }
        }
        (SqlType::Array(element), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let len = at.len();
                at.push_str(&format!("[{i}]"));
                check_at(element, item, at)?;
                at.truncate(len);
            }
            Ok(())
        }
        (SqlType::Map(key_ty, value_ty), Value::Map(entries)) => {
            for (key, item) in entries {
                let len = at.len();
                at.push_str(&format!("[{}]", key.to_json()));
                if key.is_null() {
                    return Err(mismatch("null map key".to_string(), at));
                }
                let typed_key = match (&**key_ty, key) {
                    (SqlType::Scalar(kind), Value::String(text)) => key_from_text(*kind, text),
                    _ => None,
                };
                check_at(key_ty, typed_key.as_ref().unwrap_or(key), at)?;
                check_at(value_ty, item, at)?;
                at.truncate(len);
            }
            Ok(())
        }
        (_, value) => Err(mismatch(value.kind_name().to_string(), at)),
    }
}

/// Normalizes a value that passed [`check_value`] to the canonical variant
/// for `ty`: integers become floats for DOUBLE, ISO strings become dates and
/// timestamps. Collections are normalized element-wise.
pub fn conform_value(ty: &SqlType, value: Value) -> Value {
    match (ty, value) {
        (SqlType::Scalar(ScalarKind::Double), Value::Integer(i)) => Value::Float(i as f64),
        (SqlType::Scalar(ScalarKind::Decimal), Value::Integer(i)) => Value::Decimal(Decimal::from(i)),
        (SqlType::Scalar(ScalarKind::Date), Value::String(s)) => match parse_iso_date(&s) {
            Some(date) => Value::Date(date),
            None => Value::String(s),
        },
        (SqlType::Scalar(ScalarKind::Timestamp), Value::String(s)) => match parse_iso_timestamp(&s) {
            Some(ts) => Value::Timestamp(ts),
            None => Value::String(s),
        },
        (SqlType::Array(element), Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| conform_value(element, item))
                .collect(),
        ),
        (SqlType::Map(key_ty, value_ty), Value::Map(entries)) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (conform_key(key_ty, k), conform_value(value_ty, v)))
                .collect(),
        ),
        (_, value) => value,
    }
}

fn conform_key(ty: &SqlType, key: Value) -> Value {
    match (ty, key) {
        (SqlType::Scalar(kind), Value::String(text)) => match key_from_text(*kind, &text) {
            Some(typed) => typed,
            None => conform_value(ty, Value::String(text)),
        },
        (_, key) => conform_value(ty, key),
    }
}

/// Reads a map key given as text (JSON object keys always are) as a
/// numeric or boolean key type. Other kinds are left to the regular check.
fn key_from_text(kind: ScalarKind, text: &str) -> Option<Value> {
    match kind {
        ScalarKind::Integer => text.parse().ok().map(Value::Integer),
        ScalarKind::Double => text.parse().ok().map(Value::Float),
        ScalarKind::Decimal => Decimal::from_str(text).ok().map(Value::Decimal),
        ScalarKind::Boolean => match text {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        ScalarKind::String | ScalarKind::Date | ScalarKind::Timestamp => None,
    }
}

/// Decodes a raw backend cell into a native value of type `ty`.
///
/// Warehouses report every cell as a string; session backends may report
/// JSON natives. Both are accepted. Complex values may arrive as JSON text.
pub fn to_native_value(ty: &SqlType, raw: &Json) -> Result<Value, String> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    match ty {
        SqlType::Scalar(kind) => decode_scalar(*kind, raw),
        SqlType::Array(element) => match as_structured(raw)? {
            Json::Array(items) => items
                .iter()
                .map(|item| to_native_value(element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Err(format!("expected a JSON array, got `{other}`")),
        },
        SqlType::Map(key_ty, value_ty) => match as_structured(raw)? {
            Json::Object(entries) => entries
                .iter()
                .map(|(key, item)| {
                    let key = to_native_value(key_ty, &Json::String(key.clone()))?;
                    Ok((key, to_native_value(value_ty, item)?))
                })
                .collect::<Result<Vec<_>, String>>()
                .map(Value::Map),
            other => Err(format!("expected a JSON object, got `{other}`")),
        },
    }
}

fn as_structured(raw: &Json) -> Result<Json, String> {
    match raw {
        Json::String(text) => serde_json::from_str(text).map_err(|e| format!("invalid JSON `{text}`: {e}")),
        other => Ok(other.clone()),
    }
}

fn decode_scalar(kind: ScalarKind, raw: &Json) -> Result<Value, String> {
    let text = match raw {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    };
    let bad = || format!("cannot read `{text}` as {}", kind.as_str());

    let value = match kind {
        ScalarKind::Integer => match raw {
            Json::Number(n) => n.as_i64().map(Value::Integer).ok_or_else(bad)?,
            _ => text.trim().parse().map(Value::Integer).map_err(|_| bad())?,
        },
        ScalarKind::Double => match raw {
            Json::Number(n) => n.as_f64().map(Value::Float).ok_or_else(bad)?,
            _ => text.trim().parse().map(Value::Float).map_err(|_| bad())?,
        },
        ScalarKind::Decimal => Value::Float(decimal_to_float(text.trim()).ok_or_else(bad)?),
        ScalarKind::String => Value::String(text),
        ScalarKind::Boolean => match raw {
            Json::Bool(b) => Value::Boolean(*b),
            _ => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => return Err(bad()),
            },
        },
        ScalarKind::Date => parse_iso_date(&text).map(Value::Date).ok_or_else(bad)?,
        ScalarKind::Timestamp => parse_iso_timestamp(&text)
            .map(Value::Timestamp)
            .ok_or_else(bad)?,
    };
    Ok(value)
}

/// Converts decimal text to `f64`, warning when precision is lost.
fn decimal_to_float(text: &str) -> Option<f64> {
    let float: f64 = text.parse().ok()?;
    let exact = Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text));
    if let Ok(exact) = exact {
        let round_trips = Decimal::from_f64_retain(float)
            .map(|back| back.normalize() == exact.normalize())
            .unwrap_or(false)
            || exact.to_f64().is_some_and(|f| f.to_string() == exact.normalize().to_string());
        if !round_trips {
            tracing::warn!(decimal = text, float, "DECIMAL value lost precision converting to float");
        }
    }
    Some(float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn scalars_accept_matching_shapes() {
        assert!(check_value(&SqlType::INTEGER, &Value::Integer(1)).is_ok());
        assert!(check_value(&SqlType::DOUBLE, &Value::Integer(1)).is_ok());
        assert!(check_value(&SqlType::DECIMAL, &Value::Float(1.5)).is_ok());
        assert!(check_value(&SqlType::DATE, &Value::from("2024-01-31")).is_ok());
        assert!(check_value(&SqlType::TIMESTAMP, &Value::from("2024-01-31T10:00:00")).is_ok());
        assert!(check_value(&SqlType::STRING, &Value::Null).is_ok());
    }

    #[test]
    fn scalars_reject_other_shapes() {
        let err = check_value(&SqlType::INTEGER, &Value::from("1")).unwrap_err();
        assert_eq!(err.found, "string");
        assert_eq!(err.at, None);
        assert!(check_value(&SqlType::BOOLEAN, &Value::Integer(1)).is_err());
        assert!(check_value(&SqlType::DATE, &Value::from("31/01/2024")).is_err());
    }

    #[test]
    fn collections_report_nested_position() {
        let ty = SqlType::map(SqlType::STRING, SqlType::array(SqlType::INTEGER));
        let value = Value::map_of([("ok", Value::from(vec![1_i64])), ("bad", Value::from(vec![Value::Integer(1), Value::from("x")]))]);
        let err = check_value(&ty, &value).unwrap_err();
        assert_eq!(err.expected, SqlType::INTEGER);
        assert_eq!(err.at.as_deref(), Some(r#"["bad"][1]"#));

        let err = check_value(&SqlType::array(SqlType::STRING), &Value::map_of([("a", Value::Null)]))
            .unwrap_err();
        assert_eq!(err.found, "map");
    }

    #[test]
    fn text_map_keys_read_as_declared_key_type() {
        let ty = SqlType::map(SqlType::INTEGER, SqlType::STRING);
        let value = Value::map_of([("1", Value::from("a")), ("20", Value::from("b"))]);
        assert!(check_value(&ty, &value).is_ok());
        assert_eq!(
            conform_value(&ty, value),
            Value::Map(vec![
                (Value::Integer(1), Value::from("a")),
                (Value::Integer(20), Value::from("b")),
            ])
        );

        let err = check_value(&ty, &Value::map_of([("one", Value::from("a"))])).unwrap_err();
        assert_eq!(err.expected, SqlType::INTEGER);
        assert_eq!(err.found, "string");

        let flags = SqlType::map(SqlType::BOOLEAN, SqlType::INTEGER);
        assert!(check_value(&flags, &Value::map_of([("true", Value::Integer(1))])).is_ok());
    }

    #[test]
    fn non_finite_floats_rejected_inside_collections() {
        assert!(check_value(&SqlType::DOUBLE, &Value::Float(f64::NAN)).is_ok());

        let err = check_value(&SqlType::array(SqlType::DOUBLE), &Value::from(vec![Value::Float(1.0), Value::Float(f64::INFINITY)]))
            .unwrap_err();
        assert_eq!(err.at.as_deref(), Some("[1]"));
        assert!(err.found.contains("inf"), "{}", err.found);

        let weights = SqlType::map(SqlType::STRING, SqlType::DOUBLE);
        assert!(check_value(&weights, &Value::map_of([("w", Value::Float(f64::NAN))])).is_err());
    }

    #[test]
    fn conform_picks_canonical_variants() {
        assert_eq!(conform_value(&SqlType::DOUBLE, Value::Integer(2)), Value::Float(2.0));
        assert_eq!(
            conform_value(&SqlType::array(SqlType::DATE), Value::from(vec!["2024-01-31"])),
            Value::Array(vec![Value::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())])
        );
        assert_eq!(conform_value(&SqlType::STRING, Value::Null), Value::Null);
    }

    #[test]
    fn decodes_warehouse_strings() {
        assert_eq!(to_native_value(&SqlType::INTEGER, &json!("3")), Ok(Value::Integer(3)));
        assert_eq!(to_native_value(&SqlType::BOOLEAN, &json!("TRUE")), Ok(Value::Boolean(true)));
        assert_eq!(to_native_value(&SqlType::DECIMAL, &json!("12.50")), Ok(Value::Float(12.5)));
        assert_eq!(
            to_native_value(&SqlType::DATE, &json!("2024-02-29")),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert_eq!(
            to_native_value(&SqlType::array(SqlType::INTEGER), &json!("[1,2]")),
            Ok(Value::from(vec![1_i64, 2]))
        );
        assert_eq!(to_native_value(&SqlType::STRING, &Json::Null), Ok(Value::Null));
    }

    #[test]
    fn decodes_json_natives() {
        assert_eq!(to_native_value(&SqlType::INTEGER, &json!(7)), Ok(Value::Integer(7)));
        assert_eq!(to_native_value(&SqlType::STRING, &json!(7)), Ok(Value::from("7")));
        assert_eq!(
            to_native_value(&SqlType::map(SqlType::STRING, SqlType::DOUBLE), &json!({"a": 1.5})),
            Ok(Value::map_of([("a", Value::Float(1.5))]))
        );
    }

    #[test]
    fn decode_failures_describe_the_cell() {
        let err = to_native_value(&SqlType::INTEGER, &json!("three")).unwrap_err();
        assert!(err.contains("three"));
        assert!(to_native_value(&SqlType::array(SqlType::INTEGER), &json!("{}")).is_err());
    }

    #[test]
    fn wide_decimals_still_decode_lossily() {
        let value = to_native_value(&SqlType::DECIMAL, &json!("12345678901234567890.123456789"));
        assert!(matches!(value, Ok(Value::Float(f)) if (f - 1.2345678901234567e19).abs() < 1e4));
    }
}
