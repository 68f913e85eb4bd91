//! SQL-side type descriptors.

use crate::ddl::lexer::{SqlToken, TokenCursor};
use crate::diag::Diag;
use std::fmt;

/// Scalar SQL kinds supported across the native/SQL boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Double,
    String,
    Boolean,
    Date,
    Timestamp,
    Decimal,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Integer => "INTEGER",
            ScalarKind::Double => "DOUBLE",
            ScalarKind::String => "STRING",
            ScalarKind::Boolean => "BOOLEAN",
            ScalarKind::Date => "DATE",
            ScalarKind::Timestamp => "TIMESTAMP",
            ScalarKind::Decimal => "DECIMAL",
        }
    }

    /// Resolves a catalog type keyword, including the aliases catalogs report.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword.to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" | "BIGINT" | "LONG" | "SMALLINT" | "SHORT" | "TINYINT" | "BYTE" => {
                ScalarKind::Integer
            }
            "DOUBLE" | "FLOAT" | "REAL" => ScalarKind::Double,
            "STRING" | "VARCHAR" | "CHAR" => ScalarKind::String,
            "BOOLEAN" | "BOOL" => ScalarKind::Boolean,
            "DATE" => ScalarKind::Date,
            "TIMESTAMP" | "TIMESTAMP_NTZ" | "TIMESTAMP_LTZ" => ScalarKind::Timestamp,
            "DECIMAL" | "DEC" | "NUMERIC" => ScalarKind::Decimal,
            _ => return None,
        };
        Some(kind)
    }
}

/// A fully resolved SQL type.
///
/// Collection element types are themselves `SqlType`s, so an unresolved
/// element type cannot be represented at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    Scalar(ScalarKind),
    Array(Box<SqlType>),
    Map(Box<SqlType>, Box<SqlType>),
}

impl SqlType {
    pub const INTEGER: SqlType = SqlType::Scalar(ScalarKind::Integer);
    pub const DOUBLE: SqlType = SqlType::Scalar(ScalarKind::Double);
    pub const STRING: SqlType = SqlType::Scalar(ScalarKind::String);
    pub const BOOLEAN: SqlType = SqlType::Scalar(ScalarKind::Boolean);
    pub const DATE: SqlType = SqlType::Scalar(ScalarKind::Date);
    pub const TIMESTAMP: SqlType = SqlType::Scalar(ScalarKind::Timestamp);
    pub const DECIMAL: SqlType = SqlType::Scalar(ScalarKind::Decimal);

    pub fn array(element: SqlType) -> Self {
        SqlType::Array(Box::new(element))
    }

    pub fn map(key: SqlType, value: SqlType) -> Self {
        SqlType::Map(Box::new(key), Box::new(value))
    }

    /// True for `ARRAY` and `MAP`, which travel as JSON on the execution path.
    pub fn is_complex(&self) -> bool {
        !matches!(self, SqlType::Scalar(_))
    }

    /// True for `DATE` and `TIMESTAMP`.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SqlType::Scalar(ScalarKind::Date) | SqlType::Scalar(ScalarKind::Timestamp)
        )
    }

    /// Parses catalog type text such as `ARRAY<MAP<STRING, DOUBLE>>`.
    pub fn parse(text: &str) -> Result<SqlType, Diag> {
        let mut cursor = TokenCursor::lex(text)?;
        let ty = parse_sql_type(&mut cursor)?;
        if let Some((token, span)) = cursor.bump() {
            return Err(Diag::error(format!("unexpected {} after type", token.describe()))
                .with_primary_label(span, "trailing input")
                .with_code("udf::sql::trailing_input"));
        }
        Ok(ty)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Scalar(kind) => f.write_str(kind.as_str()),
            SqlType::Array(element) => write!(f, "ARRAY<{element}>"),
            SqlType::Map(key, value) => write!(f, "MAP<{key}, {value}>"),
        }
    }
}

/// Reads one SQL type from the cursor.
pub(crate) fn parse_sql_type(cursor: &mut TokenCursor) -> Result<SqlType, Diag> {
    let (keyword, span) = cursor.expect_ident("a type name")?;
    match keyword.to_ascii_uppercase().as_str() {
        "ARRAY" => {
            cursor.expect(&SqlToken::Lt, "`<` after ARRAY")?;
            let element = parse_sql_type(cursor)?;
            cursor.expect(&SqlToken::Gt, "`>` closing ARRAY")?;
            Ok(SqlType::array(element))
        }
        "MAP" => {
            cursor.expect(&SqlToken::Lt, "`<` after MAP")?;
            let key = parse_sql_type(cursor)?;
            cursor.expect(&SqlToken::Comma, "`,` between MAP key and value types")?;
            let value = parse_sql_type(cursor)?;
            cursor.expect(&SqlToken::Gt, "`>` closing MAP")?;
            Ok(SqlType::map(key, value))
        }
        other => {
            let kind = ScalarKind::from_keyword(other).ok_or_else(|| {
                Diag::error(format!("unsupported SQL type `{keyword}`"))
                    .with_primary_label(span, "not a supported type")
                    .with_help("supported types are INTEGER, DOUBLE, STRING, BOOLEAN, DATE, TIMESTAMP, DECIMAL, ARRAY<T> and MAP<K, V>")
                    .with_code("udf::sql::unsupported_type")
            })?;
            // Precision, scale and length modifiers are accepted and dropped.
            if matches!(kind, ScalarKind::Decimal | ScalarKind::String)
                && cursor.eat(&SqlToken::LParen)
            {
                while !cursor.eat(&SqlToken::RParen) {
                    if cursor.bump().is_none() {
                        return Err(Diag::error("unclosed type modifier list")
                            .with_primary_label(cursor.end_span(), "expected `)`")
                            .with_code("udf::sql::unclosed"));
                    }
                }
            }
            Ok(SqlType::Scalar(kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested_types() {
        let ty = SqlType::map(SqlType::STRING, SqlType::array(SqlType::DOUBLE));
        assert_eq!(ty.to_string(), "MAP<STRING, ARRAY<DOUBLE>>");
    }

    #[test]
    fn parse_reads_back_display() {
        for ty in [
            SqlType::INTEGER,
            SqlType::DECIMAL,
            SqlType::array(SqlType::TIMESTAMP),
            SqlType::map(SqlType::STRING, SqlType::map(SqlType::INTEGER, SqlType::BOOLEAN)),
        ] {
            assert_eq!(SqlType::parse(&ty.to_string()), Ok(ty));
        }
    }

    #[test]
    fn parse_accepts_catalog_aliases() {
        assert_eq!(SqlType::parse("bigint"), Ok(SqlType::INTEGER));
        assert_eq!(SqlType::parse("DECIMAL(10, 2)"), Ok(SqlType::DECIMAL));
        assert_eq!(SqlType::parse("VARCHAR(20)"), Ok(SqlType::STRING));
        assert_eq!(SqlType::parse("array<float>"), Ok(SqlType::array(SqlType::DOUBLE)));
        assert_eq!(SqlType::parse("TIMESTAMP_NTZ"), Ok(SqlType::TIMESTAMP));
    }

    #[test]
    fn parse_rejects_unknown_and_unclosed() {
        let err = SqlType::parse("INTERVAL").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("udf::sql::unsupported_type"));
        assert!(SqlType::parse("ARRAY<INT").is_err());
        assert!(SqlType::parse("INT INT").is_err());
    }
}
