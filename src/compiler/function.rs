//! Native function descriptors, the compiler's input.
//!
//! These are plain data: whatever reflects over a native function (a macro,
//! a host-language bridge, a hand-written table) fills them in.

use crate::value::Value;
use smol_str::SmolStr;

/// Language tag used when none is given.
pub const DEFAULT_LANGUAGE: &str = "PYTHON";

/// How a native parameter is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterKind {
    /// Positional or keyword.
    #[default]
    Positional,
    /// Keyword-only; still maps to an ordinary SQL parameter.
    KeywordOnly,
    /// `*args`; not representable in SQL.
    VarPositional,
    /// `**kwargs`; not representable in SQL.
    VarKeyword,
}

impl ParameterKind {
    pub fn is_variadic(self) -> bool {
        matches!(self, ParameterKind::VarPositional | ParameterKind::VarKeyword)
    }
}

/// One declared parameter of a native function.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeParameter {
    /// Parameter name.
    pub name: SmolStr,

    /// Declaration kind.
    pub kind: ParameterKind,

    /// Type annotation text, e.g. `dict[str, float]`.
    pub annotation: Option<String>,

    /// Declared default. `Some(Value::Null)` is an explicit `None` default,
    /// distinct from having no default at all.
    pub default: Option<Value>,
}

impl NativeParameter {
    /// An unannotated positional parameter.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Positional,
            annotation: None,
            default: None,
        }
    }

    /// A positional parameter with a type annotation.
    pub fn typed(name: impl Into<SmolStr>, annotation: impl Into<String>) -> Self {
        Self::new(name).annotated(annotation)
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A native function as seen by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeFunction {
    /// Function name; becomes the last part of the catalog name.
    pub name: SmolStr,

    /// Parameters in declaration order.
    pub parameters: Vec<NativeParameter>,

    /// Return annotation text.
    pub return_annotation: Option<String>,

    /// Raw documentation text.
    pub doc: Option<String>,

    /// Source of the function body, without signature or documentation.
    pub body: String,

    /// Language tag rendered into `LANGUAGE`.
    pub language: String,
}

impl NativeFunction {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_annotation: None,
            doc: None,
            body: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn param(mut self, parameter: NativeParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, annotation: impl Into<String>) -> Self {
        self.return_annotation = Some(annotation.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}
