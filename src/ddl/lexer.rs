//! Tokens for catalog DDL headers and SQL type text.

use crate::diag::Diag;
use crate::span::Span;
use logos::{Lexer, Logos};
use smol_str::SmolStr;

/// A SQL token. Keywords are plain identifiers, matched case-insensitively
/// by the parser.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"--[^\n]*")]
pub enum SqlToken {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
    #[token(";")]
    Semicolon,
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),
    #[regex(r"'([^']|'')*'", unquote)]
    Str(String),
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| SmolStr::new(lex.slice()))]
    #[regex(r"`[^`]+`", |lex| { let s = lex.slice(); SmolStr::new(&s[1..s.len() - 1]) })]
    Ident(SmolStr),
}

fn unquote(lex: &mut Lexer<SqlToken>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].replace("''", "'")
}

impl SqlToken {
    /// Human-readable token description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            SqlToken::LParen => "`(`".into(),
            SqlToken::RParen => "`)`".into(),
            SqlToken::Lt => "`<`".into(),
            SqlToken::Gt => "`>`".into(),
            SqlToken::Comma => "`,`".into(),
            SqlToken::Dot => "`.`".into(),
            SqlToken::Minus => "`-`".into(),
            SqlToken::Semicolon => "`;`".into(),
            SqlToken::Number(n) => format!("number `{n}`"),
            SqlToken::Str(_) => "string literal".into(),
            SqlToken::Ident(name) => format!("`{name}`"),
        }
    }

    /// True when this token is the identifier `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, SqlToken::Ident(name) if name.eq_ignore_ascii_case(keyword))
    }
}

/// A fully lexed token stream with one-token lookahead.
#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Vec<(SqlToken, Span)>,
    pos: usize,
    /// Offset added to every span, so diagnostics point into the full text.
    base: usize,
    end: usize,
}

impl TokenCursor {
    /// Lexes `text`, failing on the first unrecognised character.
    pub fn lex(text: &str) -> Result<Self, Diag> {
        Self::lex_at(text, 0)
    }

    /// Lexes a slice that starts at byte `base` of a larger text.
    pub fn lex_at(text: &str, base: usize) -> Result<Self, Diag> {
        let mut tokens = Vec::new();
        for (result, span) in SqlToken::lexer(text).spanned() {
            let span = span.start + base..span.end + base;
            match result {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    let snippet = text.get(span.start - base..span.end - base).unwrap_or("");
                    return Err(Diag::error(format!("unexpected character `{snippet}`"))
                        .with_primary_label(span, "not valid here")
                        .with_code("udf::sql::invalid_character"));
                }
            }
        }
        Ok(Self {
            tokens,
            pos: 0,
            base,
            end: base + text.len(),
        })
    }

    pub fn peek(&self) -> Option<&SqlToken> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&SqlToken> {
        self.tokens.get(self.pos + n).map(|(token, _)| token)
    }

    /// Consumes and returns the next token.
    pub fn bump(&mut self) -> Option<(SqlToken, Span)> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the next token, or an empty span at end of input.
    pub fn here(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.clone())
            .unwrap_or_else(|| self.end_span())
    }

    pub fn end_span(&self) -> Span {
        self.end..self.end
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Consumes the next token if it equals `token`.
    pub fn eat(&mut self, token: &SqlToken) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes the next token if it is the identifier `keyword`.
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, token: &SqlToken, what: &str) -> Result<Span, Diag> {
        let span = self.here();
        if self.eat(token) {
            Ok(span)
        } else {
            Err(self.unexpected(what))
        }
    }

    pub fn expect_keyword(&mut self, keyword: &str) -> Result<Span, Diag> {
        let span = self.here();
        if self.eat_keyword(keyword) {
            Ok(span)
        } else {
            Err(self.unexpected(&format!("`{keyword}`")))
        }
    }

    pub fn expect_ident(&mut self, what: &str) -> Result<(SmolStr, Span), Diag> {
        match self.peek() {
            Some(SqlToken::Ident(name)) => {
                let name = name.clone();
                let span = self.here();
                self.pos += 1;
                Ok((name, span))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Builds an "expected X" diagnostic at the current position.
    pub fn unexpected(&self, what: &str) -> Diag {
        let found = self
            .peek()
            .map(SqlToken::describe)
            .unwrap_or_else(|| "end of input".to_string());
        Diag::error(format!("expected {what}, found {found}"))
            .with_primary_label(self.here(), format!("expected {what}"))
            .with_code("udf::sql::unexpected_token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SqlToken> {
        SqlToken::lexer(text).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn lexes_quoted_strings_with_doubled_quotes() {
        assert_eq!(
            kinds("COMMENT 'it''s'"),
            vec![
                SqlToken::Ident("COMMENT".into()),
                SqlToken::Str("it's".into())
            ]
        );
    }

    #[test]
    fn lexes_numbers_and_nested_angle_brackets() {
        assert_eq!(
            kinds("ARRAY<MAP<STRING,INT>> -1.5e3"),
            vec![
                SqlToken::Ident("ARRAY".into()),
                SqlToken::Lt,
                SqlToken::Ident("MAP".into()),
                SqlToken::Lt,
                SqlToken::Ident("STRING".into()),
                SqlToken::Comma,
                SqlToken::Ident("INT".into()),
                SqlToken::Gt,
                SqlToken::Gt,
                SqlToken::Minus,
                SqlToken::Number("1.5e3".into()),
            ]
        );
    }

    #[test]
    fn cursor_reports_offsets_relative_to_base() {
        let err = TokenCursor::lex_at("a # b", 10).unwrap_err();
        assert_eq!(err.primary_span(), Some(12..13));
    }

    #[test]
    fn cursor_keywords_are_case_insensitive() {
        let mut cursor = TokenCursor::lex("create Or replace").unwrap();
        assert!(cursor.eat_keyword("CREATE"));
        assert!(cursor.eat_keyword("or"));
        assert!(cursor.expect_keyword("REPLACE").is_ok());
        assert!(cursor.is_done());
        assert!(cursor.expect_ident("a name").is_err());
    }
}
