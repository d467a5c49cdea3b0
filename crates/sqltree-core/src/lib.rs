//! # sqltree-core
//!
//! An object model for Trino-dialect SQL queries.
//!
//! This crate provides:
//! - Immutable expression, relation and query trees that never store
//!   parentheses
//! - A precedence-aware renderer with a single-line and a pretty mode
//! - Schema resolution: the output columns of any relation, against a
//!   pluggable catalog
//! - A typestate builder for SELECT queries
//!
//! Parsing SQL text into these trees lives in the `sqltree-parser` crate.
//!
//! ## Rendering
//!
//! Grouping is derived from operator precedence, so a tree built without
//! parentheses still renders faithfully:
//!
//! ```rust
//! use sqltree_core::ast::Expr;
//!
//! let sum = Expr::column("a").add(Expr::column("b"));
//! let expr = sum.mul(Expr::integer(2));
//! assert_eq!(expr.to_string(), "(\"a\" + \"b\") * 2");
//! ```
//!
//! ## Building queries
//!
//! ```rust
//! use sqltree_core::builder::{col, lit_int, select, table};
//!
//! let query = select(vec![col("id")])
//!     .from(table("users"))
//!     .filter(col("age").gt(lit_int(18)))
//!     .limit(10)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     query.to_string(),
//!     "SELECT \"id\" FROM \"users\" WHERE \"age\" > 18 LIMIT 10"
//! );
//! ```

pub mod ast;
pub mod builder;
pub mod config;
pub mod error;
pub mod render;
pub mod resolve;
pub mod schema;

pub use ast::{DataType, Expr, Identifier, QualifiedName, Query, Relation};
pub use builder::{col, select};
pub use config::{PrintMode, PrintOptions, ResolveOptions};
pub use error::{ConfigError, ConstructionError, ResolutionError};
pub use render::{render, Render};
pub use resolve::{resolve, resolve_query, Catalog, MemoryCatalog, ResolutionContext};
pub use schema::{Schema, SchemaField};

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_trees_are_thread_safe() {
        assert_send_sync::<Expr>();
        assert_send_sync::<Relation>();
        assert_send_sync::<Query>();
        assert_send_sync::<Schema>();
        assert_send_sync::<MemoryCatalog>();
        assert_send_sync::<ResolutionError>();
    }
}
