//! Reading `CREATE FUNCTION` statements back into function metadata.
//!
//! Only the header is tokenized; the `$$`-quoted body is opaque.

use super::lexer::{SqlToken, TokenCursor};
use crate::catalog::{FunctionInfo, FunctionName, FunctionReturn, ParameterInfo};
use crate::diag::Diag;
use crate::error::CatalogError;
use crate::types::sql::parse_sql_type;
use crate::types::{ScalarKind, SqlType};
use crate::value::{Value, parse_iso_date, parse_iso_timestamp};
use rust_decimal::Decimal;
use std::str::FromStr;

/// A parsed `CREATE FUNCTION` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFunction {
    pub info: FunctionInfo,
    /// The text between the `$$` delimiters, if any.
    pub body: Option<String>,
}

/// Parses a `CREATE FUNCTION` statement into the function's declared schema.
pub fn parse_create_function(ddl: &str) -> Result<FunctionInfo, CatalogError> {
    parse_create_function_with_body(ddl).map(|parsed| parsed.info)
}

/// Like [`parse_create_function`], also returning the body text.
pub fn parse_create_function_with_body(ddl: &str) -> Result<ParsedFunction, CatalogError> {
    let (header, body) = split_body(ddl).map_err(|diag| invalid(ddl, diag))?;
    let mut cursor = TokenCursor::lex(header).map_err(|diag| invalid(ddl, diag))?;
    let info = parse_header(&mut cursor).map_err(|diag| invalid(ddl, diag))?;
    tracing::debug!(function = %info.name, parameters = info.parameters.len(), "parsed CREATE FUNCTION");
    Ok(ParsedFunction {
        info,
        body: body.map(str::to_string),
    })
}

/// Reads only the function name from a `CREATE FUNCTION` statement.
pub fn extract_function_name(ddl: &str) -> Result<FunctionName, CatalogError> {
    let (header, _) = split_body(ddl).map_err(|diag| invalid(ddl, diag))?;
    let mut cursor = TokenCursor::lex(header).map_err(|diag| invalid(ddl, diag))?;
    parse_preamble(&mut cursor)
        .and_then(|()| parse_name(&mut cursor))
        .map_err(|diag| invalid(ddl, diag))
}

fn invalid(ddl: &str, diag: Diag) -> CatalogError {
    let location = diag
        .primary_span()
        .map(|span| line_column(ddl, span.start))
        .map(|(line, column)| format!(" (line {line}, column {column})"))
        .unwrap_or_default();
    CatalogError::InvalidDdl {
        message: format!("{}{location}", diag.message),
    }
}

fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

/// Splits the statement at its `$$` delimiters.
fn split_body(ddl: &str) -> Result<(&str, Option<&str>), Diag> {
    let Some(open) = find_unquoted(ddl, "$$") else {
        return Ok((ddl, None));
    };
    let rest = &ddl[open + 2..];
    let Some(close) = rest.rfind("$$") else {
        return Err(Diag::error("unterminated `$$` body")
            .with_primary_label(open..open + 2, "body opened here")
            .with_code("udf::ddl::unterminated_body"));
    };
    let body = rest[..close].trim_matches('\n');
    Ok((&ddl[..open], Some(body)))
}

/// Byte offset of the first `needle` outside string literals and quoted
/// identifiers.
fn find_unquoted(text: &str, needle: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '`' => quote = Some(c),
            None if text[i..].starts_with(needle) => return Some(i),
            None => {}
        }
    }
    None
}

/// `CREATE [OR REPLACE] [TEMPORARY] FUNCTION [IF NOT EXISTS]`
fn parse_preamble(cursor: &mut TokenCursor) -> Result<(), Diag> {
    cursor.expect_keyword("CREATE")?;
    if cursor.eat_keyword("OR") {
        cursor.expect_keyword("REPLACE")?;
    }
    cursor.eat_keyword("TEMPORARY");
    cursor.expect_keyword("FUNCTION")?;
    if cursor.eat_keyword("IF") {
        cursor.expect_keyword("NOT")?;
        cursor.expect_keyword("EXISTS")?;
    }
    Ok(())
}

fn parse_name(cursor: &mut TokenCursor) -> Result<FunctionName, Diag> {
    let (catalog, _) = cursor.expect_ident("a catalog name")?;
    cursor.expect(&SqlToken::Dot, "`.` after the catalog name")?;
    let (schema, _) = cursor.expect_ident("a schema name")?;
    cursor.expect(&SqlToken::Dot, "`.` after the schema name")?;
    let (name, _) = cursor.expect_ident("a function name")?;
    Ok(FunctionName::new(catalog, schema, name))
}

fn parse_header(cursor: &mut TokenCursor) -> Result<FunctionInfo, Diag> {
    parse_preamble(cursor)?;
    let name = parse_name(cursor)?;

    cursor.expect(&SqlToken::LParen, "`(` opening the parameter list")?;
    let mut parameters = Vec::new();
    if !cursor.eat(&SqlToken::RParen) {
        loop {
            parameters.push(parse_parameter(cursor)?);
            if cursor.eat(&SqlToken::RParen) {
                break;
            }
            cursor.expect(&SqlToken::Comma, "`,` or `)` in the parameter list")?;
        }
    }

    cursor.expect_keyword("RETURNS")?;
    let returns = if cursor.peek().is_some_and(|t| t.is_keyword("TABLE")) {
        cursor.bump();
        FunctionReturn::Table(parse_columns(cursor)?)
    } else {
        FunctionReturn::Scalar(parse_sql_type(cursor)?)
    };

    let mut info = FunctionInfo::new(name, returns);
    info.parameters = parameters;

    while !cursor.is_done() {
        if cursor.eat_keyword("LANGUAGE") {
            let (language, _) = cursor.expect_ident("a language name")?;
            info.language = Some(language.to_ascii_uppercase());
        } else if cursor.eat_keyword("COMMENT") {
            info.comment = Some(expect_string(cursor)?);
        } else if cursor.eat_keyword("DETERMINISTIC") {
        } else if cursor.eat_keyword("NOT") {
            cursor.expect_keyword("DETERMINISTIC")?;
        } else if cursor.eat_keyword("AS") {
            if let Some((token, span)) = cursor.bump() {
                return Err(Diag::error(format!("unexpected {} after AS", token.describe()))
                    .with_primary_label(span, "expected a `$$` body")
                    .with_code("udf::ddl::body"));
            }
        } else {
            return Err(cursor.unexpected("a function characteristic or AS"));
        }
    }
    Ok(info)
}

fn parse_parameter(cursor: &mut TokenCursor) -> Result<ParameterInfo, Diag> {
    let (name, _) = cursor.expect_ident("a parameter name")?;
    let sql_type = parse_sql_type(cursor)?;
    let mut parameter = ParameterInfo::required(name, sql_type);
    if cursor.eat_keyword("DEFAULT") {
        let default = parse_literal(cursor, &parameter.sql_type)?;
        parameter.has_default = true;
        parameter.default = Some(default);
    }
    if cursor.eat_keyword("COMMENT") {
        parameter.comment = Some(expect_string(cursor)?);
    }
    Ok(parameter)
}

fn parse_columns(cursor: &mut TokenCursor) -> Result<Vec<(smol_str::SmolStr, SqlType)>, Diag> {
    cursor.expect(&SqlToken::LParen, "`(` opening the table columns")?;
    let mut columns = Vec::new();
    loop {
        let (name, _) = cursor.expect_ident("a column name")?;
        let sql_type = parse_sql_type(cursor)?;
        if cursor.eat_keyword("COMMENT") {
            expect_string(cursor)?;
        }
        columns.push((name, sql_type));
        if cursor.eat(&SqlToken::RParen) {
            return Ok(columns);
        }
        cursor.expect(&SqlToken::Comma, "`,` or `)` in the table columns")?;
    }
}

fn expect_string(cursor: &mut TokenCursor) -> Result<String, Diag> {
    match cursor.peek() {
        Some(SqlToken::Str(text)) => {
            let text = text.clone();
            cursor.bump();
            Ok(text)
        }
        _ => Err(cursor.unexpected("a string literal")),
    }
}

/// Reads a default-value literal, shaped by the declared type.
fn parse_literal(cursor: &mut TokenCursor, ty: &SqlType) -> Result<Value, Diag> {
    let span = cursor.here();
    let bad_literal = |what: &str| {
        Diag::error(format!("invalid {what} literal for {ty}"))
            .with_primary_label(span.clone(), "in this default")
            .with_code("udf::ddl::literal")
    };

    let Some((token, _)) = cursor.bump() else {
        return Err(cursor.unexpected("a default value"));
    };
    match token {
        SqlToken::Ident(word) if word.eq_ignore_ascii_case("NULL") => Ok(Value::Null),
        SqlToken::Ident(word) if word.eq_ignore_ascii_case("TRUE") => Ok(Value::Boolean(true)),
        SqlToken::Ident(word) if word.eq_ignore_ascii_case("FALSE") => Ok(Value::Boolean(false)),
        SqlToken::Ident(word) if word.eq_ignore_ascii_case("DATE") => {
            let text = expect_string(cursor)?;
            parse_iso_date(&text)
                .map(Value::Date)
                .ok_or_else(|| bad_literal("DATE"))
        }
        SqlToken::Ident(word) if word.eq_ignore_ascii_case("TIMESTAMP") => {
            let text = expect_string(cursor)?;
            parse_iso_timestamp(&text)
                .map(Value::Timestamp)
                .ok_or_else(|| bad_literal("TIMESTAMP"))
        }
        SqlToken::Ident(word) if word.eq_ignore_ascii_case("CAST") => {
            cursor.expect(&SqlToken::LParen, "`(` after CAST")?;
            let text = expect_string(cursor)?;
            cursor.expect_keyword("AS")?;
            let (target, _) = cursor.expect_ident("a type name")?;
            cursor.expect(&SqlToken::RParen, "`)` closing CAST")?;
            let is_double = ["DOUBLE", "FLOAT"].iter().any(|name| target.eq_ignore_ascii_case(name));
            if !is_double || *ty != SqlType::DOUBLE {
                return Err(bad_literal("CAST"));
            }
            text.parse().map(Value::Float).map_err(|_| bad_literal("DOUBLE"))
        }
        SqlToken::Ident(word) if word.eq_ignore_ascii_case("ARRAY") => {
            let element = match ty {
                SqlType::Array(element) => element.as_ref(),
                _ => return Err(bad_literal("ARRAY")),
            };
            let items = parse_literal_list(cursor, |cursor, _| parse_literal(cursor, element))?;
            Ok(Value::Array(items))
        }
        SqlToken::Ident(word) if word.eq_ignore_ascii_case("MAP") => {
            let (key_ty, value_ty) = match ty {
                SqlType::Map(key, value) => (key.as_ref(), value.as_ref()),
                _ => return Err(bad_literal("MAP")),
            };
            let flat = parse_literal_list(cursor, |cursor, i| {
                parse_literal(cursor, if i % 2 == 0 { key_ty } else { value_ty })
            })?;
            if flat.len() % 2 != 0 {
                return Err(bad_literal("MAP"));
            }
            let mut entries = Vec::with_capacity(flat.len() / 2);
            let mut items = flat.into_iter();
            while let (Some(key), Some(value)) = (items.next(), items.next()) {
                entries.push((key, value));
            }
            Ok(Value::Map(entries))
        }
        SqlToken::Str(text) => Ok(Value::String(text)),
        SqlToken::Minus => match cursor.bump() {
            Some((SqlToken::Number(digits), _)) => {
                number_literal(&format!("-{digits}"), ty).ok_or_else(|| bad_literal("numeric"))
            }
            _ => Err(bad_literal("numeric")),
        },
        SqlToken::Number(digits) => number_literal(&digits, ty).ok_or_else(|| bad_literal("numeric")),
        other => Err(Diag::error(format!("expected a literal, found {}", other.describe()))
            .with_primary_label(span.clone(), "not a literal")
            .with_code("udf::ddl::literal")),
    }
}

fn parse_literal_list(
    cursor: &mut TokenCursor,
    mut item: impl FnMut(&mut TokenCursor, usize) -> Result<Value, Diag>,
) -> Result<Vec<Value>, Diag> {
    cursor.expect(&SqlToken::LParen, "`(`")?;
    let mut items = Vec::new();
    if cursor.eat(&SqlToken::RParen) {
        return Ok(items);
    }
    loop {
        items.push(item(cursor, items.len())?);
        if cursor.eat(&SqlToken::RParen) {
            return Ok(items);
        }
        cursor.expect(&SqlToken::Comma, "`,` or `)`")?;
    }
}

fn number_literal(text: &str, ty: &SqlType) -> Option<Value> {
    let is_integral = !text.contains(['.', 'e', 'E']);
    match ty {
        SqlType::Scalar(ScalarKind::Decimal) => Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .ok()
            .map(Value::Decimal),
        SqlType::Scalar(ScalarKind::Double) => text.parse().ok().map(Value::Float),
        _ if is_integral => text.parse().ok().map(Value::Integer),
        _ => text.parse().ok().map(Value::Float),
    }
}
