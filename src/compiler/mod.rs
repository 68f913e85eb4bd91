//! Signature compiler: native function → `FunctionSpec` and catalog DDL.
//!
//! Compilation is all-or-nothing. Every check runs before any text is
//! produced, so a failed compile never yields partial DDL.
//!
//! # Example
//!
//! ```
//! use udf_bridge::compiler::{NativeFunction, NativeParameter, compile};
//!
//! let add = NativeFunction::new("add")
//!     .param(NativeParameter::typed("a", "int"))
//!     .param(NativeParameter::typed("b", "int"))
//!     .returns("int")
//!     .body("return a + b");
//!
//! let spec = compile(&add, "main", "default", None).unwrap();
//! assert!(spec.raw_ddl.contains("RETURNS INTEGER"));
//! ```

mod function;
mod spec;

pub use function::{DEFAULT_LANGUAGE, NativeFunction, NativeParameter, ParameterKind};
pub use spec::{FunctionParameter, FunctionSpec};

use crate::catalog::{CatalogClient, FunctionName};
use crate::ddl::{CreateFunction, dedent, sql_literal};
use crate::docstring::{DocString, parse_docstring};
use crate::error::{AnnotationTarget, CompileError, CompileResult, CreateFunctionError};
use crate::types::{NativeType, SqlType, TypePath, check_value, conform_value};
use smol_str::SmolStr;

/// Parameter names that belong to methods, not functions.
const FORBIDDEN_PARAMETERS: [&str; 2] = ["self", "cls"];

/// Compiles `function` into a spec targeting `catalog.schema`.
///
/// The function comment is `comment` when given, else the documentation
/// summary.
pub fn compile(
    function: &NativeFunction,
    catalog: &str,
    schema: &str,
    comment: Option<&str>,
) -> CompileResult<FunctionSpec> {
    check_identifier("catalog name", catalog)?;
    check_identifier("schema name", schema)?;
    check_identifier("function name", &function.name)?;
    let fn_name = &function.name;

    check_signature_shape(function)?;

    let doc = function
        .doc
        .as_deref()
        .map(parse_docstring)
        .unwrap_or_default();
    let declared: Vec<&str> = function.parameters.iter().map(|p| p.name.as_str()).collect();
    for extra in doc.undeclared_params(&declared) {
        tracing::debug!(function = %fn_name, parameter = extra, "ignoring documented parameter not in signature");
    }

    let parameters = function
        .parameters
        .iter()
        .map(|parameter| compile_parameter(fn_name, parameter, &doc))
        .collect::<CompileResult<Vec<_>>>()?;

    let return_annotation =
        function
            .return_annotation
            .as_deref()
            .ok_or_else(|| CompileError::MissingAnnotation {
                function: fn_name.clone(),
                target: AnnotationTarget::ReturnValue,
            })?;
    let (_, return_type) = resolve_type(
        fn_name,
        AnnotationTarget::ReturnValue,
        return_annotation,
        TypePath::return_value(),
    )?;

    let body = dedent(&function.body);
    if body.contains("$$") {
        return Err(CompileError::UnsupportedSignature {
            function: fn_name.clone(),
            reason: "function body contains `$$`, which would terminate the DDL body".into(),
        });
    }

    let name = FunctionName::new(catalog, schema, fn_name.clone());
    let description = comment.map_or_else(|| doc.summary.clone(), str::to_string);
    let raw_ddl = CreateFunction {
        name: &name,
        parameters: &parameters,
        return_type: &return_type,
        language: &function.language,
        comment: &description,
        body: &body,
    }
    .render();

    tracing::debug!(function = %name, parameters = parameters.len(), "compiled function");
    Ok(FunctionSpec {
        name,
        parameters,
        return_type,
        description,
        language: function.language.to_ascii_uppercase(),
        raw_ddl,
    })
}

/// Compiles `function` and submits its DDL to `client`.
pub fn create_native_function(
    client: &dyn CatalogClient,
    function: &NativeFunction,
    catalog: &str,
    schema: &str,
    comment: Option<&str>,
) -> Result<FunctionSpec, CreateFunctionError> {
    let spec = compile(function, catalog, schema, comment)?;
    tracing::info!(function = %spec.name, "creating catalog function");
    client.create_function(&spec.raw_ddl)?;
    Ok(spec)
}

fn check_identifier(what: &'static str, name: &str) -> CompileResult<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier {
            what,
            name: name.to_string(),
        })
    }
}

fn check_signature_shape(function: &NativeFunction) -> CompileResult<()> {
    let unsupported = |reason: String| CompileError::UnsupportedSignature {
        function: function.name.clone(),
        reason,
    };
    let mut seen: Vec<&str> = Vec::with_capacity(function.parameters.len());
    for parameter in &function.parameters {
        let name = parameter.name.as_str();
        if parameter.kind.is_variadic() {
            let prefix = match parameter.kind {
                ParameterKind::VarPositional => "*",
                _ => "**",
            };
            return Err(unsupported(format!(
                "variadic parameter `{prefix}{name}` has no fixed SQL signature"
            )));
        }
        if FORBIDDEN_PARAMETERS.contains(&name) {
            return Err(unsupported(format!(
                "parameter `{name}` is not allowed; compile a plain function, not a method"
            )));
        }
        check_identifier("parameter name", name)?;
        if seen.contains(&name) {
            return Err(unsupported(format!("parameter `{name}` is declared twice")));
        }
        seen.push(name);
    }
    Ok(())
}

/// Parses and maps an annotation, returning the native type too.
fn resolve_type(
    function: &SmolStr,
    target: AnnotationTarget,
    annotation: &str,
    path: TypePath,
) -> CompileResult<(NativeType, SqlType)> {
    let native = NativeType::parse(annotation).map_err(|diag| CompileError::MalformedAnnotation {
        function: function.clone(),
        target,
        annotation: annotation.to_string(),
        diag,
    })?;
    let sql = native
        .to_sql_type(&path)
        .map_err(|unsupported| CompileError::UnsupportedType {
            function: function.clone(),
            path: unsupported.path,
            annotation: unsupported.annotation,
        })?;
    Ok((native, sql))
}

fn compile_parameter(
    function: &SmolStr,
    parameter: &NativeParameter,
    doc: &DocString,
) -> CompileResult<FunctionParameter> {
    let name = &parameter.name;
    let target = AnnotationTarget::Parameter(name.clone());
    let annotation = parameter
        .annotation
        .as_deref()
        .ok_or_else(|| CompileError::MissingAnnotation {
            function: function.clone(),
            target: target.clone(),
        })?;
    let (native, sql_type) = resolve_type(function, target, annotation, TypePath::parameter(name.clone()))?;

    if native.is_optional() && parameter.default.is_none() {
        return Err(CompileError::MissingDefault {
            function: function.clone(),
            parameter: name.clone(),
        });
    }

    let default_value = match &parameter.default {
        Some(value) => {
            check_value(&sql_type, value).map_err(|mismatch| CompileError::InvalidDefault {
                function: function.clone(),
                parameter: name.clone(),
                expected: sql_type.clone(),
                found: mismatch.found,
            })?;
            Some(conform_value(&sql_type, value.clone()))
        }
        None => None,
    };

    let comment = doc.param_description(name);
    let description = match &default_value {
        Some(default) => format!("{comment} (Default: {})", sql_literal(default)),
        None => comment.clone(),
    };

    Ok(FunctionParameter {
        name: name.clone(),
        sql_type,
        description,
        has_default: default_value.is_some(),
        default_value,
        comment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn add() -> NativeFunction {
        NativeFunction::new("add")
            .param(NativeParameter::typed("a", "int"))
            .param(NativeParameter::typed("b", "int"))
            .returns("int")
            .body("    return a + b\n")
    }

    #[test]
    fn add_without_docstring() {
        let spec = compile(&add(), "main", "default", None).unwrap();
        assert_eq!(
            spec.raw_ddl,
            "CREATE OR REPLACE FUNCTION main.default.add(\
             a INTEGER COMMENT 'Parameter `a`', b INTEGER COMMENT 'Parameter `b`')\n\
             RETURNS INTEGER\n\
             LANGUAGE PYTHON\n\
             COMMENT ''\n\
             AS $$\n\
             return a + b\n\
             $$"
        );
        assert_eq!(spec.description, "");
        assert!(spec.parameters.iter().all(FunctionParameter::is_required));
    }

    #[test]
    fn docstring_feeds_comments() {
        let function = add().doc("Adds numbers.\n\nArgs:\n    a: left\n    b: right\n");
        let spec = compile(&function, "main", "default", None).unwrap();
        assert_eq!(spec.description, "Adds numbers.");
        assert_eq!(spec.parameters[0].comment, "left");
        assert!(spec.raw_ddl.contains("COMMENT 'Adds numbers.'"));

        let spec = compile(&function, "main", "default", Some("Overridden")).unwrap();
        assert_eq!(spec.description, "Overridden");
    }

    #[test]
    fn defaults_render_and_describe() {
        let function = NativeFunction::new("greet")
            .param(NativeParameter::typed("name", "str").with_default("it's me"))
            .param(NativeParameter::typed("scale", "float").with_default(2_i64))
            .returns("str")
            .body("return name");
        let spec = compile(&function, "c", "s", None).unwrap();
        assert!(spec.raw_ddl.contains("name STRING DEFAULT 'it''s me'"));
        assert!(spec.raw_ddl.contains("scale DOUBLE DEFAULT 2.0"));
        assert_eq!(spec.parameters[1].default_value, Some(Value::Float(2.0)));
        assert_eq!(
            spec.parameters[0].description,
            "Parameter `name` (Default: 'it''s me')"
        );
    }

    #[test]
    fn optional_requires_default() {
        let missing = NativeFunction::new("f")
            .param(NativeParameter::typed("x", "Optional[int]"))
            .returns("int");
        assert_eq!(
            compile(&missing, "c", "s", None),
            Err(CompileError::MissingDefault {
                function: "f".into(),
                parameter: "x".into()
            })
        );

        let with_none = NativeFunction::new("f")
            .param(NativeParameter::typed("x", "int | None").with_default(Value::Null))
            .returns("int");
        let spec = compile(&with_none, "c", "s", None).unwrap();
        assert!(spec.raw_ddl.contains("x INTEGER DEFAULT NULL"));
    }

    #[test]
    fn untyped_mapping_names_parameter() {
        let function = NativeFunction::new("f")
            .param(NativeParameter::typed("details", "dict"))
            .returns("float");
        let err = compile(&function, "c", "s", None).unwrap_err();
        assert!(
            matches!(&err, CompileError::UnsupportedType { path, .. } if path.parameter.as_deref() == Some("details"))
        );
        assert!(err.to_string().contains("parameter `details`"));
    }

    #[test]
    fn missing_annotations() {
        let function = NativeFunction::new("f").param(NativeParameter::new("x")).returns("int");
        assert!(matches!(
            compile(&function, "c", "s", None),
            Err(CompileError::MissingAnnotation { target: AnnotationTarget::Parameter(p), .. }) if p == "x"
        ));

        let function = NativeFunction::new("f").param(NativeParameter::typed("x", "int"));
        assert!(matches!(
            compile(&function, "c", "s", None),
            Err(CompileError::MissingAnnotation { target: AnnotationTarget::ReturnValue, .. })
        ));
    }

    #[test]
    fn rejected_signatures() {
        let variadic = NativeFunction::new("f")
            .param(NativeParameter::typed("xs", "int").with_kind(ParameterKind::VarPositional))
            .returns("int");
        let err = compile(&variadic, "c", "s", None).unwrap_err();
        assert!(err.to_string().contains("`*xs`"), "{err}");

        let method = NativeFunction::new("f")
            .param(NativeParameter::new("self"))
            .returns("int");
        assert!(matches!(
            compile(&method, "c", "s", None),
            Err(CompileError::UnsupportedSignature { .. })
        ));

        let twice = NativeFunction::new("f")
            .param(NativeParameter::typed("x", "int"))
            .param(NativeParameter::typed("x", "str"))
            .returns("int");
        assert!(compile(&twice, "c", "s", None).is_err());

        let dollar = add().body("return '$$'");
        assert!(matches!(
            compile(&dollar, "c", "s", None),
            Err(CompileError::UnsupportedSignature { .. })
        ));

        assert!(matches!(
            compile(&add(), "bad-catalog", "s", None),
            Err(CompileError::InvalidIdentifier { what: "catalog name", .. })
        ));
    }

    #[test]
    fn bad_defaults_and_annotations() {
        let function = NativeFunction::new("f")
            .param(NativeParameter::typed("n", "int").with_default("ten"))
            .returns("int");
        assert!(matches!(
            compile(&function, "c", "s", None),
            Err(CompileError::InvalidDefault { found, .. }) if found == "string"
        ));

        let function = NativeFunction::new("f")
            .param(NativeParameter::typed("n", "list[int"))
            .returns("int");
        assert!(matches!(
            compile(&function, "c", "s", None),
            Err(CompileError::MalformedAnnotation { .. })
        ));
    }
}
