//! Rendering of trees back to SQL text.
//!
//! Output is deterministic and minimally parenthesized: grouping is derived
//! from [`Precedence`](crate::ast::Precedence) alone. Two layouts are
//! supported, see [`PrintMode`](crate::config::PrintMode).
//!
//! ```rust
//! use sqltree_core::ast::Expr;
//! use sqltree_core::render::Render;
//! use sqltree_core::PrintOptions;
//!
//! let expr = Expr::column("a").add(Expr::column("b")).mul(Expr::integer(2));
//! assert_eq!(expr.render(&PrintOptions::default()), "(\"a\" + \"b\") * 2");
//! ```

mod expr;
mod printer;
mod query;
mod relation;

use core::fmt;

pub use expr::{is_niladic_function, literal_sql, quote_string};
pub use printer::{pad, parenthesize, parenthesize_after, StatementPrinter};

use crate::ast::{DataType, Expr, Identifier, Precedence, QualifiedName, Query, Relation};
use crate::config::PrintOptions;

/// Renders nodes for one set of [`PrintOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    options: PrintOptions,
}

impl Renderer {
    /// Creates a renderer.
    #[must_use]
    pub const fn new(options: PrintOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    #[must_use]
    pub const fn options(&self) -> &PrintOptions {
        &self.options
    }

    fn is_pretty(&self) -> bool {
        self.options.is_pretty()
    }

    /// Separator between a clause and its continuation: a newline in pretty
    /// mode, a space otherwise.
    fn break_or_space(&self) -> &'static str {
        if self.is_pretty() {
            "\n"
        } else {
            " "
        }
    }
}

/// Nodes that can be turned back into SQL.
pub trait Render {
    /// Renders the node with the given options.
    fn render(&self, options: &PrintOptions) -> String;
}

impl Render for Expr {
    fn render(&self, options: &PrintOptions) -> String {
        Renderer::new(*options).expr(self)
    }
}

impl Render for Relation {
    fn render(&self, options: &PrintOptions) -> String {
        Renderer::new(*options).relation(self)
    }
}

impl Render for Query {
    fn render(&self, options: &PrintOptions) -> String {
        Renderer::new(*options).query(self)
    }
}

impl Render for DataType {
    fn render(&self, _options: &PrintOptions) -> String {
        self.to_sql()
    }
}

impl Render for Identifier {
    fn render(&self, _options: &PrintOptions) -> String {
        self.to_sql()
    }
}

impl Render for QualifiedName {
    fn render(&self, _options: &PrintOptions) -> String {
        self.to_sql()
    }
}

/// Renders `node` with `options`.
#[must_use]
pub fn render<T: Render + ?Sized>(node: &T, options: &PrintOptions) -> String {
    node.render(options)
}

/// Renders `expr` as if it occupied a slot requiring `ambient` precedence,
/// parenthesizing it when its own tier is lower.
#[must_use]
pub fn render_with_precedence(expr: &Expr, options: &PrintOptions, ambient: Precedence) -> String {
    Renderer::new(*options).expr_at(expr, ambient)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&PrintOptions::default()))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&PrintOptions::default()))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&PrintOptions::default()))
    }
}
