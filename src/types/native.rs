//! Native type descriptors and the native → SQL direction of the type mapper.

use super::annotation;
use super::sql::SqlType;
use crate::diag::Diag;
use smol_str::SmolStr;
use std::fmt;

/// A native type annotation, reduced to a closed set of recognised tags.
///
/// Anything outside the set is kept as `Named` so it can be reported, never
/// guessed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    Int,
    Float,
    Str,
    Bool,
    Date,
    DateTime,
    Decimal,
    Bytes,
    /// `list[T]`; `None` for a bare `list`.
    List(Option<Box<NativeType>>),
    /// `dict[K, V]`; `None` for a bare `dict`.
    Dict(Option<(Box<NativeType>, Box<NativeType>)>),
    /// `Optional[T]`, `Union[T, None]` or `T | None`.
    Optional(Box<NativeType>),
    /// Any other union.
    Union(Vec<NativeType>),
    Tuple,
    Any,
    NoneType,
    Named(SmolStr),
}

impl NativeType {
    /// Parses annotation text such as `dict[str, list[int]]`.
    pub fn parse(text: &str) -> Result<NativeType, Diag> {
        annotation::parse_annotation(text)
    }

    pub fn list_of(element: NativeType) -> Self {
        NativeType::List(Some(Box::new(element)))
    }

    pub fn dict_of(key: NativeType, value: NativeType) -> Self {
        NativeType::Dict(Some((Box::new(key), Box::new(value))))
    }

    pub fn optional(inner: NativeType) -> Self {
        NativeType::Optional(Box::new(inner))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, NativeType::Optional(_))
    }

    /// Maps this native type to its SQL type.
    ///
    /// `path` locates the type inside the signature and is extended as the
    /// mapping recurses, so a failure at any depth names where it happened.
    /// `Optional` is transparent here: nullability is a signature concern.
    pub fn to_sql_type(&self, path: &TypePath) -> Result<SqlType, UnsupportedType> {
        let sql = match self {
            NativeType::Int => SqlType::INTEGER,
            NativeType::Float => SqlType::DOUBLE,
            NativeType::Str => SqlType::STRING,
            NativeType::Bool => SqlType::BOOLEAN,
            NativeType::Date => SqlType::DATE,
            NativeType::DateTime => SqlType::TIMESTAMP,
            NativeType::Decimal => SqlType::DECIMAL,
            NativeType::List(Some(element)) => {
                SqlType::array(element.to_sql_type(&path.clone().push(PathStep::ArrayElement))?)
            }
            NativeType::Dict(Some((key, value))) => SqlType::map(
                key.to_sql_type(&path.clone().push(PathStep::MapKey))?,
                value.to_sql_type(&path.clone().push(PathStep::MapValue))?,
            ),
            NativeType::Optional(inner) => inner.to_sql_type(path)?,
            NativeType::List(None)
            | NativeType::Dict(None)
            | NativeType::Union(_)
            | NativeType::Tuple
            | NativeType::Any
            | NativeType::NoneType
            | NativeType::Bytes
            | NativeType::Named(_) => {
                return Err(UnsupportedType {
                    path: path.clone(),
                    annotation: self.to_string(),
                });
            }
        };
        Ok(sql)
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Int => f.write_str("int"),
            NativeType::Float => f.write_str("float"),
            NativeType::Str => f.write_str("str"),
            NativeType::Bool => f.write_str("bool"),
            NativeType::Date => f.write_str("date"),
            NativeType::DateTime => f.write_str("datetime"),
            NativeType::Decimal => f.write_str("Decimal"),
            NativeType::Bytes => f.write_str("bytes"),
            NativeType::List(None) => f.write_str("list"),
            NativeType::List(Some(element)) => write!(f, "list[{element}]"),
            NativeType::Dict(None) => f.write_str("dict"),
            NativeType::Dict(Some((key, value))) => write!(f, "dict[{key}, {value}]"),
            NativeType::Optional(inner) => write!(f, "Optional[{inner}]"),
            NativeType::Union(members) => {
                f.write_str("Union[")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str("]")
            }
            NativeType::Tuple => f.write_str("tuple"),
            NativeType::Any => f.write_str("Any"),
            NativeType::NoneType => f.write_str("None"),
            NativeType::Named(name) => f.write_str(name),
        }
    }
}

/// One step into a collection type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    ArrayElement,
    MapKey,
    MapValue,
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::ArrayElement => f.write_str("element type of array"),
            PathStep::MapKey => f.write_str("key type of map"),
            PathStep::MapValue => f.write_str("value type of map"),
        }
    }
}

/// Location of a type within a signature, e.g.
/// "parameter `orders`, value type of map".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePath {
    /// `None` for the return value.
    pub parameter: Option<SmolStr>,
    pub steps: Vec<PathStep>,
}

impl TypePath {
    pub fn parameter(name: impl Into<SmolStr>) -> Self {
        Self {
            parameter: Some(name.into()),
            steps: Vec::new(),
        }
    }

    pub fn return_value() -> Self {
        Self {
            parameter: None,
            steps: Vec::new(),
        }
    }

    pub fn push(mut self, step: PathStep) -> Self {
        self.steps.push(step);
        self
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter {
            Some(name) => write!(f, "parameter `{name}`")?,
            None => f.write_str("return value")?,
        }
        for step in &self.steps {
            write!(f, ", {step}")?;
        }
        Ok(())
    }
}

/// A native type with no SQL counterpart, located by its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedType {
    pub path: TypePath,
    /// The offending (sub)type as written.
    pub annotation: String,
}
