//! Argument validation and SQL call construction.

use crate::catalog::{FunctionInfo, FunctionName, FunctionReturn};
use crate::ddl::{quote_string, sql_literal};
use crate::error::{ExecuteError, ExecuteResult};
use crate::types::{SqlType, check_value, conform_value};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Statement parameter naming the function in scalar calls.
pub const FUNCTION_NAME_PARAMETER: &str = "function_name";

/// Caller-supplied arguments by parameter name. Validated per call, never
/// stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentBinding(BTreeMap<String, Value>);

impl ArgumentBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a JSON object of arguments, as agent frameworks supply them.
    /// `null` or an empty object means no arguments.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, String> {
        match json {
            serde_json::Value::Null => Ok(Self::new()),
            serde_json::Value::Object(entries) => Ok(Self(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            )),
            other => Err(format!("arguments must be a JSON object, got `{other}`")),
        }
    }
}

impl From<BTreeMap<String, Value>> for ArgumentBinding {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ArgumentBinding {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A named statement parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementParameter {
    pub name: String,
    /// `None` binds SQL NULL.
    pub value: Option<String>,
    /// Catalog type text; `None` lets the warehouse infer a string.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_text: Option<String>,
}

/// A ready-to-run call of a catalog function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCall {
    pub function: FunctionName,
    /// Parametrised statement, with `:name` markers.
    pub statement: String,
    pub parameters: Vec<StatementParameter>,
    /// The same call with literals in place of markers.
    pub inline: String,
}

/// Validates `args` against `info` and builds the call.
///
/// Unknown argument names are rejected before any value is looked at.
/// Parameters are bound positionally until one is omitted in favour of its
/// default; every later argument is bound by name.
pub fn build_call(info: &FunctionInfo, args: &ArgumentBinding) -> ExecuteResult<SqlCall> {
    let function = info.name.to_string();

    if let Some(unknown) = args.names().find(|name| info.parameter(name).is_none()) {
        return Err(ExecuteError::UnknownArgument {
            function,
            parameter: unknown.to_string(),
            declared: info.parameter_names(),
        });
    }

    let mut statement_args = Vec::new();
    let mut inline_args = Vec::new();
    let mut parameters = Vec::new();
    let mut named = false;

    for parameter in &info.parameters {
        let name = parameter.name.as_str();
        let Some(value) = args.get(name) else {
            if parameter.has_default {
                tracing::debug!(function = %info.name, parameter = name, "omitting argument, catalog default applies");
                named = true;
                continue;
            }
            return Err(ExecuteError::MissingArgument {
                function,
                parameter: name.to_string(),
            });
        };

        check_value(&parameter.sql_type, value).map_err(|mismatch| ExecuteError::InvalidArgument {
            function: function.clone(),
            parameter: name.to_string(),
            expected: mismatch.expected,
            found: mismatch.found,
            at: mismatch.at,
        })?;
        let value = conform_value(&parameter.sql_type, value.clone());

        let prefix = if named { format!("{name} => ") } else { String::new() };
        let (marker, inline, bound) = bind(name, &parameter.sql_type, &value);
        statement_args.push(format!("{prefix}{marker}"));
        inline_args.push(format!("{prefix}{inline}"));
        parameters.extend(bound);
    }

    let fqn = info.name.to_string();
    let (statement, inline) = match &info.returns {
        FunctionReturn::Scalar(_) => {
            parameters.insert(
                0,
                StatementParameter {
                    name: FUNCTION_NAME_PARAMETER.to_string(),
                    value: Some(fqn.clone()),
                    type_text: None,
                },
            );
            (
                format!("SELECT IDENTIFIER(:{FUNCTION_NAME_PARAMETER})({})", statement_args.join(", ")),
                format!("SELECT {fqn}({})", inline_args.join(", ")),
            )
        }
        FunctionReturn::Table(_) => (
            format!("SELECT * FROM {fqn}({})", statement_args.join(", ")),
            format!("SELECT * FROM {fqn}({})", inline_args.join(", ")),
        ),
    };

    Ok(SqlCall {
        function: info.name.clone(),
        statement,
        parameters,
        inline,
    })
}

/// Marker text, inline text and statement parameters for one argument.
fn bind(name: &str, ty: &SqlType, value: &Value) -> (String, String, Vec<StatementParameter>) {
    let type_text = ty.to_string();
    if ty.is_complex() && !value.is_null() {
        let json = value.to_json().to_string();
        let inline = format!("from_json({}, {})", quote_string(&json), quote_string(&type_text));
        return (
            format!("from_json(:{name}, :{name}_type)"),
            inline,
            vec![
                StatementParameter {
                    name: name.to_string(),
                    value: Some(json),
                    type_text: None,
                },
                StatementParameter {
                    name: format!("{name}_type"),
                    value: Some(type_text),
                    type_text: None,
                },
            ],
        );
    }

    let text = (!value.is_null()).then(|| value.to_text());
    let inline = match value {
        Value::Null => format!("CAST(NULL AS {type_text})"),
        other => sql_literal(other),
    };
    (
        format!(":{name}"),
        inline,
        vec![StatementParameter {
            name: name.to_string(),
            value: text,
            type_text: Some(type_text),
        }],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ParameterInfo;

    fn info(returns: FunctionReturn) -> FunctionInfo {
        FunctionInfo::new(FunctionName::new("c", "s", "f"), returns)
            .with_parameter(ParameterInfo::required("a", SqlType::INTEGER))
            .with_parameter(ParameterInfo::required("b", SqlType::STRING).with_default("x"))
            .with_parameter(ParameterInfo::required("tags", SqlType::array(SqlType::STRING)).with_default(Value::Null))
    }

    #[test]
    fn positional_scalar_call() {
        let args = ArgumentBinding::new().with("a", 1_i64).with("b", "it's");
        let call = build_call(&info(FunctionReturn::Scalar(SqlType::INTEGER)), &args).unwrap();
        assert_eq!(call.statement, "SELECT IDENTIFIER(:function_name)(:a, :b)");
        assert_eq!(call.inline, "SELECT c.s.f(1, 'it''s')");
        assert_eq!(call.parameters[0].value.as_deref(), Some("c.s.f"));
        assert_eq!(
            call.parameters[2],
            StatementParameter {
                name: "b".into(),
                value: Some("it's".into()),
                type_text: Some("STRING".into())
            }
        );
    }

    #[test]
    fn switches_to_named_after_omitted_default() {
        let args = ArgumentBinding::new().with("a", 1_i64).with("tags", vec!["x", "y"]);
        let call = build_call(&info(FunctionReturn::Table(vec![])), &args).unwrap();
        assert_eq!(
            call.statement,
            "SELECT * FROM c.s.f(:a, tags => from_json(:tags, :tags_type))"
        );
        assert_eq!(
            call.inline,
            r#"SELECT * FROM c.s.f(1, tags => from_json('["x","y"]', 'ARRAY<STRING>'))"#
        );
        assert_eq!(call.parameters.len(), 3);
        assert_eq!(call.parameters[2].value.as_deref(), Some("ARRAY<STRING>"));
    }

    #[test]
    fn unknown_argument_is_checked_first() {
        let args = ArgumentBinding::new().with("a", "not an int").with("zzz", 1_i64);
        let err = build_call(&info(FunctionReturn::Scalar(SqlType::INTEGER)), &args).unwrap_err();
        assert!(matches!(err, ExecuteError::UnknownArgument { ref parameter, .. } if parameter == "zzz"));
    }

    #[test]
    fn missing_and_invalid_arguments() {
        let f = info(FunctionReturn::Scalar(SqlType::INTEGER));
        let err = build_call(&f, &ArgumentBinding::new()).unwrap_err();
        assert_eq!(
            err,
            ExecuteError::MissingArgument {
                function: "c.s.f".into(),
                parameter: "a".into()
            }
        );

        let err = build_call(&f, &ArgumentBinding::new().with("a", 1_i64).with("tags", vec![Value::from("ok"), Value::Integer(3)]))
            .unwrap_err();
        assert!(matches!(err, ExecuteError::InvalidArgument { ref at, .. } if at.as_deref() == Some("[1]")));
    }

    #[test]
    fn nulls_bind_as_typed_null() {
        let args = ArgumentBinding::new().with("a", Value::Null);
        let call = build_call(&info(FunctionReturn::Scalar(SqlType::INTEGER)), &args).unwrap();
        assert_eq!(call.inline, "SELECT c.s.f(CAST(NULL AS INTEGER))");
        assert_eq!(call.parameters[1].value, None);
    }

    #[test]
    fn arguments_from_json() {
        let args = ArgumentBinding::from_json(&serde_json::json!({"a": 2})).unwrap();
        assert_eq!(args.get("a"), Some(&Value::Integer(2)));
        assert!(ArgumentBinding::from_json(&serde_json::Value::Null).unwrap().is_empty());
        assert!(ArgumentBinding::from_json(&serde_json::json!([1])).is_err());
    }
}
