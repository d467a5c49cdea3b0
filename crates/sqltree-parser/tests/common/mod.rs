#![allow(dead_code)]

use sqltree_core::ast::{DataType, Expr, Query, QueryBody, Select};
use sqltree_core::render::render;
use sqltree_core::PrintOptions;
use sqltree_parser::{parse_data_type, parse_expression, parse_query, ParseError};

pub fn query(sql: &str) -> Query {
    parse_query(sql).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn query_err(sql: &str) -> ParseError {
    parse_query(sql).expect_err(&format!("Expected parse error for: {sql}"))
}

pub fn expr(sql: &str) -> Expr {
    parse_expression(sql).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn expr_err(sql: &str) -> ParseError {
    parse_expression(sql).expect_err(&format!("Expected parse error for: {sql}"))
}

pub fn data_type(sql: &str) -> DataType {
    parse_data_type(sql).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn select(sql: &str) -> Select {
    match query(sql).body {
        QueryBody::Select(select) => *select,
        other => panic!("Expected SELECT, got {other:?}"),
    }
}

/// Parses `sql`, renders it in both print modes and checks that each
/// rendering parses back to the same tree and re-renders identically.
pub fn round_trip(sql: &str) {
    let tree = query(sql);
    for options in [PrintOptions::default(), PrintOptions::pretty()] {
        let rendered = render(&tree, &options);
        let reparsed = parse_query(&rendered).unwrap_or_else(|e| {
            panic!("Rendered SQL does not parse.\n  Input:    {sql}\n  Rendered: {rendered}\n  Error:    {e}")
        });
        assert_eq!(
            reparsed, tree,
            "Round-trip changed the tree.\n  Input:    {sql}\n  Rendered: {rendered}"
        );
        assert_eq!(render(&reparsed, &options), rendered);
    }
}

/// Same as [`round_trip`] for a standalone expression.
pub fn expr_round_trip(sql: &str) {
    let tree = expr(sql);
    let rendered = tree.to_string();
    let reparsed = parse_expression(&rendered).unwrap_or_else(|e| {
        panic!("Rendered SQL does not parse.\n  Input:    {sql}\n  Rendered: {rendered}\n  Error:    {e}")
    });
    assert_eq!(
        reparsed, tree,
        "Round-trip changed the tree.\n  Input:    {sql}\n  Rendered: {rendered}"
    );
}
