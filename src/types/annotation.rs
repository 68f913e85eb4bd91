//! Lexer and parser for native type annotation text.
//!
//! Grammar:
//!
//! ```text
//! annotation := primary ('|' primary)*
//! primary    := NAME ('[' arg (',' arg)* ','? ']')?
//! arg        := annotation | '...'
//! ```

use super::native::NativeType;
use crate::diag::Diag;
use crate::span::{Span, Spanned, join};
use logos::Logos;
use smol_str::SmolStr;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token {
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,
    #[token("...")]
    Ellipsis,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*", |lex| SmolStr::new(lex.slice()))]
    Name(SmolStr),
}

/// Parses annotation text into a `NativeType`.
pub fn parse_annotation(text: &str) -> Result<NativeType, Diag> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(text).spanned() {
        match result {
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(()) => {
                return Err(Diag::error(format!(
                    "unexpected character `{}` in annotation",
                    &text[span.clone()]
                ))
                .with_primary_label(span, "not part of a type annotation")
                .with_code("udf::annotation::invalid_character"));
            }
        }
    }

    let mut parser = AnnotationParser {
        tokens,
        pos: 0,
        end: text.len(),
    };
    if parser.tokens.is_empty() {
        return Err(Diag::error("empty annotation")
            .with_primary_label(0..text.len(), "expected a type")
            .with_code("udf::annotation::empty"));
    }
    let parsed = parser.parse_union()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(Diag::error("unexpected input after annotation")
            .with_primary_label(extra.span.clone(), "trailing input")
            .with_code("udf::annotation::trailing_input"));
    }
    Ok(parsed.node)
}

struct AnnotationParser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    end: usize,
}

impl AnnotationParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.node)
    }

    fn here(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.clone())
            .unwrap_or(self.end..self.end)
    }

    fn bump(&mut self) -> Option<Spanned<Token>> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse_union(&mut self) -> Result<Spanned<NativeType>, Diag> {
        let first = self.parse_primary()?;
        if self.peek() != Some(&Token::Pipe) {
            return Ok(first);
        }
        let mut span = first.span.clone();
        let mut members = vec![first.node];
        while self.peek() == Some(&Token::Pipe) {
            self.bump();
            let next = self.parse_primary()?;
            span = join(&span, &next.span);
            members.push(next.node);
        }
        Ok(Spanned::new(normalize_union(members), span))
    }

    fn parse_primary(&mut self) -> Result<Spanned<NativeType>, Diag> {
        let Some(token) = self.bump() else {
            return Err(Diag::error("expected a type name")
                .with_primary_label(self.end..self.end, "annotation ends here")
                .with_code("udf::annotation::unexpected_end"));
        };
        let name = match token.node {
            Token::Name(name) => name,
            other => {
                return Err(Diag::error(format!("expected a type name, found {other:?}"))
                    .with_primary_label(token.span, "expected a type name")
                    .with_code("udf::annotation::unexpected_token"));
            }
        };

        let mut args = Vec::new();
        let mut span = token.span.clone();
        if self.peek() == Some(&Token::LBracket) {
            let open = self.here();
            self.bump();
            loop {
                if self.peek() == Some(&Token::Ellipsis) {
                    let ellipsis = self.bump().map(|t| t.span).unwrap_or_default();
                    args.push(Spanned::new(None, ellipsis));
                } else {
                    let arg = self.parse_union()?;
                    args.push(arg.map(Some));
                }
                if self.peek() == Some(&Token::Comma) {
                    self.bump();
                    if self.peek() != Some(&Token::RBracket) {
                        continue;
                    }
                }
                if self.peek() != Some(&Token::RBracket) {
                    return Err(Diag::error("unclosed `[` in annotation")
                        .with_primary_label(self.here(), "expected `,` or `]`")
                        .with_secondary_label(open, "opened here")
                        .with_code("udf::annotation::unclosed"));
                }
                let close = self.here();
                self.bump();
                span = join(&span, &close);
                break;
            }
        }

        let native = resolve_name(&name, args, &span)?;
        Ok(Spanned::new(native, span))
    }
}

/// Canonical name with `typing.`/`builtins.` prefixes dropped.
fn canonical(name: &str) -> &str {
    let name = name
        .strip_prefix("typing.")
        .or_else(|| name.strip_prefix("builtins."))
        .unwrap_or(name);
    match name {
        "datetime.date" => "date",
        "datetime.datetime" => "datetime",
        "decimal.Decimal" => "Decimal",
        other => other,
    }
}

fn resolve_name(
    name: &str,
    args: Vec<Spanned<Option<NativeType>>>,
    span: &Span,
) -> Result<NativeType, Diag> {
    let canonical = canonical(name);
    let given = args.len();
    let arity_error = |expected: &str| {
        Diag::error(format!("`{name}` takes {expected}"))
            .with_primary_label(span.clone(), format!("{given} type argument(s) given"))
            .with_code("udf::annotation::arity")
    };
    let type_args = |args: Vec<Spanned<Option<NativeType>>>| -> Result<Vec<NativeType>, Diag> {
        args.into_iter()
            .map(|arg| {
                arg.node.ok_or_else(|| {
                    Diag::error("`...` is only allowed in tuple annotations")
                        .with_primary_label(arg.span, "unexpected `...`")
                        .with_code("udf::annotation::ellipsis")
                })
            })
            .collect()
    };

    let native = match canonical {
        "tuple" | "Tuple" => NativeType::Tuple,
        "list" | "List" | "Sequence" => match args.len() {
            0 => NativeType::List(None),
            1 => {
                let mut args = type_args(args)?;
                NativeType::List(args.pop().map(Box::new))
            }
            _ => return Err(arity_error("exactly one type argument")),
        },
        "dict" | "Dict" | "Mapping" => match args.len() {
            0 => NativeType::Dict(None),
            2 => {
                let mut args = type_args(args)?.into_iter();
                match (args.next(), args.next()) {
                    (Some(key), Some(value)) => NativeType::dict_of(key, value),
                    _ => return Err(arity_error("exactly two type arguments")),
                }
            }
            _ => return Err(arity_error("exactly two type arguments")),
        },
        "Optional" => {
            if args.len() != 1 {
                return Err(arity_error("exactly one type argument"));
            }
            let inner = type_args(args)?;
            normalize_union(inner.into_iter().chain([NativeType::NoneType]).collect())
        }
        "Union" => {
            if args.is_empty() {
                return Err(arity_error("at least one type argument"));
            }
            normalize_union(type_args(args)?)
        }
        scalar if !args.is_empty() => {
            return Err(Diag::error(format!("`{scalar}` does not take type arguments"))
                .with_primary_label(span.clone(), "unexpected subscript")
                .with_code("udf::annotation::not_generic"));
        }
        "int" => NativeType::Int,
        "float" => NativeType::Float,
        "str" => NativeType::Str,
        "bool" => NativeType::Bool,
        "bytes" => NativeType::Bytes,
        "date" => NativeType::Date,
        "datetime" => NativeType::DateTime,
        "Decimal" => NativeType::Decimal,
        "Any" => NativeType::Any,
        "None" | "NoneType" => NativeType::NoneType,
        other => NativeType::Named(SmolStr::new(other)),
    };
    Ok(native)
}

/// Flattens nested unions and folds a `None` member into `Optional`.
fn normalize_union(members: Vec<NativeType>) -> NativeType {
    let mut flat: Vec<NativeType> = Vec::new();
    let mut nullable = false;
    for member in members {
        let expanded = match member {
            NativeType::Union(inner) => inner,
            NativeType::Optional(inner) => {
                nullable = true;
                vec![*inner]
            }
            other => vec![other],
        };
        for ty in expanded {
            if ty == NativeType::NoneType {
                nullable = true;
            } else if !flat.contains(&ty) {
                flat.push(ty);
            }
        }
    }

    let inner = match flat.len() {
        0 => return NativeType::NoneType,
        1 => flat.remove(0),
        _ => NativeType::Union(flat),
    };
    if nullable {
        NativeType::optional(inner)
    } else {
        inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> NativeType {
        parse_annotation(text).unwrap_or_else(|d| panic!("failed to parse `{text}`: {d}"))
    }

    #[test]
    fn scalars_and_qualified_names() {
        assert_eq!(parse("int"), NativeType::Int);
        assert_eq!(parse("typing.Any"), NativeType::Any);
        assert_eq!(parse("datetime.datetime"), NativeType::DateTime);
        assert_eq!(parse("decimal.Decimal"), NativeType::Decimal);
        assert_eq!(parse("MyClass"), NativeType::Named("MyClass".into()));
    }

    #[test]
    fn generic_collections() {
        assert_eq!(
            parse("Dict[str, List[int]]"),
            NativeType::dict_of(NativeType::Str, NativeType::list_of(NativeType::Int))
        );
        assert_eq!(parse("list"), NativeType::List(None));
        assert_eq!(parse("tuple[int, ...]"), NativeType::Tuple);
        assert_eq!(parse("list[int,]"), NativeType::list_of(NativeType::Int));
    }

    #[test]
    fn optional_spellings_agree() {
        let expected = NativeType::optional(NativeType::Int);
        assert_eq!(parse("Optional[int]"), expected);
        assert_eq!(parse("Union[int, None]"), expected);
        assert_eq!(parse("int | None"), expected);
        assert_eq!(parse("None | int"), expected);
    }

    #[test]
    fn real_unions_are_kept() {
        assert_eq!(
            parse("Union[int, str]"),
            NativeType::Union(vec![NativeType::Int, NativeType::Str])
        );
        assert_eq!(
            parse("int | str | None"),
            NativeType::optional(NativeType::Union(vec![NativeType::Int, NativeType::Str]))
        );
    }

    #[test]
    fn syntax_errors_carry_spans() {
        let err = parse_annotation("list[int").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("udf::annotation::unclosed"));
        assert_eq!(err.labels.len(), 2);

        let err = parse_annotation("int[str]").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("udf::annotation::not_generic"));

        let err = parse_annotation("dict[str]").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("udf::annotation::arity"));

        let err = parse_annotation("int str").unwrap_err();
        assert_eq!(err.primary_span(), Some(4..7));

        assert!(parse_annotation("").is_err());
        assert!(parse_annotation("list[int]]").is_err());
        assert!(parse_annotation("in$t").is_err());
    }
}
