#![allow(dead_code)]

use sqltree_core::ast::{DataType, Expr, Identifier, QualifiedName, Query};
use sqltree_core::render::render;
use sqltree_core::{
    resolve_query, MemoryCatalog, PrintOptions, ResolutionContext, ResolutionError, Schema,
};
use sqltree_parser::{parse_expression, parse_query};

/// Routes `tracing` output to the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn query(sql: &str) -> Query {
    parse_query(sql).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn expr(sql: &str) -> Expr {
    parse_expression(sql).unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

/// Parses and renders `sql` on a single line.
pub fn render_default(sql: &str) -> String {
    render(&query(sql), &PrintOptions::default())
}

/// Parses and renders `sql` in pretty mode.
pub fn render_pretty(sql: &str) -> String {
    render(&query(sql), &PrintOptions::pretty())
}

fn columns(columns: &[(&str, DataType)]) -> Vec<(Identifier, DataType)> {
    columns
        .iter()
        .map(|(name, data_type)| (Identifier::new(*name), data_type.clone()))
        .collect()
}

fn name(dotted: &str) -> QualifiedName {
    QualifiedName::from_dotted(dotted).unwrap()
}

/// A small shop catalog:
///
/// - `shop.orders(id BIGINT, customer_id INTEGER, total DECIMAL(10,2), placed_at TIMESTAMP(3))`
/// - `shop.customers(customer_id BIGINT, name VARCHAR, country CHAR(2))`
/// - `shop.items(order_id BIGINT, sku VARCHAR(16), tags ARRAY(VARCHAR))`
pub fn shop_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_table(
            name("shop.orders"),
            columns(&[
                ("id", DataType::Bigint),
                ("customer_id", DataType::Integer),
                ("total", DataType::decimal(10, 2)),
                ("placed_at", DataType::timestamp(3)),
            ]),
        )
        .with_table(
            name("shop.customers"),
            columns(&[
                ("customer_id", DataType::Bigint),
                ("name", DataType::Varchar(None)),
                ("country", DataType::Char(2)),
            ]),
        )
        .with_table(
            name("shop.items"),
            columns(&[
                ("order_id", DataType::Bigint),
                ("sku", DataType::Varchar(Some(16))),
                ("tags", DataType::array(DataType::Varchar(None))),
            ]),
        )
}

/// Parses `sql` and resolves it against [`shop_catalog`].
pub fn try_resolve(sql: &str) -> Result<Schema, ResolutionError> {
    init_tracing();
    let catalog = shop_catalog();
    resolve_query(&query(sql), &ResolutionContext::new(&catalog))
}

pub fn resolve_sql(sql: &str) -> Schema {
    try_resolve(sql).unwrap_or_else(|e| panic!("Failed to resolve: {sql}\nError: {e}"))
}

pub fn resolve_err(sql: &str) -> ResolutionError {
    try_resolve(sql).expect_err(&format!("Expected resolution error for: {sql}"))
}

/// Field names of `schema`, with `?` for anonymous fields.
pub fn field_names(schema: &Schema) -> Vec<String> {
    schema
        .fields
        .iter()
        .map(|field| {
            field
                .name
                .as_ref()
                .map_or_else(|| String::from("?"), |name| name.value.clone())
        })
        .collect()
}

pub fn field_types(schema: &Schema) -> Vec<DataType> {
    schema
        .fields
        .iter()
        .map(|field| field.data_type.clone())
        .collect()
}
