//! # sqltree-parser
//!
//! Turns Trino-dialect SQL text into `sqltree-core` trees.
//!
//! This crate provides:
//! - A lexer with byte spans on every token
//! - A hand-written recursive descent parser with Pratt expression parsing
//! - Entry points for the three start rules: a query, a standalone
//!   expression and a data type
//!
//! Parsing accepts everything the `sqltree-core` renderer prints, so
//! rendering a parsed tree and parsing the result gives back the same tree:
//!
//! ```rust
//! use sqltree_parser::parse_query;
//!
//! let query = parse_query("select a + b * 2 from t where x between 1 and 10").unwrap();
//! let sql = query.to_string();
//! assert_eq!(
//!     sql,
//!     "SELECT \"a\" + \"b\" * 2 FROM \"t\" WHERE \"x\" BETWEEN 1 AND 10"
//! );
//! assert_eq!(parse_query(&sql).unwrap(), query);
//! ```

pub mod lexer;
pub mod parser;

use sqltree_core::ast::{DataType, Expr, Query};
use tracing::{debug, trace};

pub use lexer::{Keyword, Lexer, Span, Token, TokenKind};
pub use parser::{ParseError, Parser};

/// Which grammar rule a parse starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRule {
    /// A full query, optionally followed by `;`.
    Query,
    /// A standalone expression.
    Expression,
    /// A data type such as `ARRAY(DECIMAL(10, 2))`.
    DataType,
}

/// The tree produced by [`parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Query(Query),
    Expression(Expr),
    DataType(DataType),
}

/// Parses `sql` starting from `rule`.
///
/// # Errors
///
/// Returns a [`ParseError`] locating the first token that does not fit the
/// grammar, or any trailing input.
pub fn parse(sql: &str, rule: StartRule) -> parser::Result<Parsed> {
    match rule {
        StartRule::Query => parse_query(sql).map(Parsed::Query),
        StartRule::Expression => parse_expression(sql).map(Parsed::Expression),
        StartRule::DataType => parse_data_type(sql).map(Parsed::DataType),
    }
}

/// Parses a query.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_query(sql: &str) -> parser::Result<Query> {
    run(sql, StartRule::Query, Parser::parse_query_statement)
}

/// Parses a standalone expression.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_expression(sql: &str) -> parser::Result<Expr> {
    run(sql, StartRule::Expression, Parser::parse_expression_statement)
}

/// Parses a data type.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_data_type(sql: &str) -> parser::Result<DataType> {
    run(sql, StartRule::DataType, Parser::parse_data_type_statement)
}

fn run<'a, T>(
    sql: &'a str,
    rule: StartRule,
    statement: impl FnOnce(&mut Parser<'a>) -> parser::Result<T>,
) -> parser::Result<T> {
    debug!(?rule, len = sql.len(), "parsing SQL");
    let parsed = statement(&mut Parser::new(sql));
    match &parsed {
        Ok(_) => trace!(?rule, "parse succeeded"),
        Err(error) => debug!(?rule, %error, "parse failed"),
    }
    parsed
}
