//! Catalog DDL: writing `CREATE OR REPLACE FUNCTION` statements and reading
//! them back.

pub mod lexer;
pub mod parse;
pub mod render;

pub use parse::{ParsedFunction, extract_function_name, parse_create_function, parse_create_function_with_body};
pub use render::{CreateFunction, dedent, parameter_clause, quote_string, sql_literal};
