//! Query rendering: WITH, SELECT, set operations and the trailing
//! ORDER BY / OFFSET / LIMIT clauses.

use super::expr::identifier_list;
use super::printer::{parenthesize, parenthesize_after, StatementPrinter};
use super::Renderer;
use crate::ast::{
    Cte, Expr, GroupBy, GroupingElement, Limit, Query, QueryBody, Select, SelectItem,
    SetOperation, SetQuantifier, Side, With,
};

impl Renderer {
    /// Renders a full query.
    #[must_use]
    pub fn query(&self, query: &Query) -> String {
        let mut printer = StatementPrinter::new();
        if let Some(with) = &query.with {
            printer.add_entry("WITH", self.with(with));
        }
        match &query.body {
            QueryBody::Select(select) => self.select_entries(select, &mut printer),
            QueryBody::Table(name) => printer.add_entry("TABLE", name.to_sql()),
            QueryBody::Values(values) => printer.add_entry("VALUES", self.expr_list(values.rows())),
            QueryBody::SetOperation(operation) => printer.add_raw(self.set_operation(operation)),
            QueryBody::Nested(inner) => printer.add_raw(parenthesize(&self.query(inner))),
        }
        if !query.order_by.is_empty() {
            printer.add_entry("ORDER", format!("BY {}", self.order_terms(&query.order_by)));
        }
        if let Some(offset) = query.offset {
            printer.add_entry("OFFSET", offset.to_string());
        }
        match query.limit {
            Some(Limit::Count(count)) => printer.add_entry("LIMIT", count.to_string()),
            Some(Limit::All) => printer.add_entry("LIMIT", "ALL"),
            None => {}
        }
        printer.finish(self.options())
    }

    /// Renders a `VALUES` list on its own.
    pub(crate) fn values(&self, rows: &[Expr]) -> String {
        let mut printer = StatementPrinter::new();
        printer.add_entry("VALUES", self.expr_list(rows));
        printer.finish(self.options())
    }

    /// Renders `left op [ALL] right` without surrounding parentheses.
    #[must_use]
    pub fn set_operation(&self, operation: &SetOperation) -> String {
        let left = self.set_operand(operation, &operation.left, Side::Left);
        let right = self.set_operand(operation, &operation.right, Side::Right);
        let mut keyword = String::from(operation.operator.as_str());
        if operation.quantifier == SetQuantifier::All {
            keyword.push_str(" ALL");
        }
        let separator = self.break_or_space();
        format!("{left}{separator}{keyword}{separator}{right}")
    }

    fn set_operand(&self, parent: &SetOperation, operand: &Query, side: Side) -> String {
        let sql = self.query(operand);
        let wrap = operand.has_modifiers()
            || match &operand.body {
                QueryBody::SetOperation(child) => {
                    let (child_prec, parent_prec) =
                        (child.operator.precedence(), parent.operator.precedence());
                    match side {
                        Side::Left => child_prec < parent_prec,
                        Side::Right => child_prec <= parent_prec,
                    }
                }
                _ => false,
            };
        if wrap {
            parenthesize(&sql)
        } else {
            sql
        }
    }

    fn with(&self, with: &With) -> String {
        let separator = if self.is_pretty() { ",\n" } else { ", " };
        let ctes = with
            .ctes
            .iter()
            .map(|cte| self.cte(cte))
            .collect::<Vec<_>>()
            .join(separator);
        if with.recursive {
            format!("RECURSIVE {ctes}")
        } else {
            ctes
        }
    }

    fn cte(&self, cte: &Cte) -> String {
        let mut prefix = cte.name.to_sql();
        if !cte.columns.is_empty() {
            prefix.push_str(&format!(" ({})", identifier_list(&cte.columns)));
        }
        prefix.push_str(" AS ");
        parenthesize_after(&prefix, &self.query(&cte.query))
    }

    fn select_entries(&self, select: &Select, printer: &mut StatementPrinter) {
        let items = select
            .items
            .iter()
            .map(|item| self.select_item(item))
            .collect::<Vec<_>>()
            .join(", ");
        printer.add_entry(
            "SELECT",
            format!("{}{items}", Self::quantifier_prefix(select.quantifier)),
        );
        if !select.from.is_empty() {
            let from = select
                .from
                .iter()
                .map(|relation| self.relation(relation))
                .collect::<Vec<_>>()
                .join(", ");
            printer.add_entry("FROM", from);
        }
        if let Some(condition) = &select.where_clause {
            printer.add_entry("WHERE", self.expr(condition));
        }
        if let Some(group_by) = &select.group_by {
            printer.add_entry("GROUP", format!("BY {}", self.group_by(group_by)));
        }
        if let Some(having) = &select.having {
            printer.add_entry("HAVING", self.expr(having));
        }
        if !select.windows.is_empty() {
            let windows = select
                .windows
                .iter()
                .map(|window| self.named_window(window))
                .collect::<Vec<_>>()
                .join(", ");
            printer.add_entry("WINDOW", windows);
        }
    }

    fn select_item(&self, item: &SelectItem) -> String {
        match item {
            SelectItem::Expr { expr, alias: None } => self.expr(expr),
            SelectItem::Expr {
                expr,
                alias: Some(alias),
            } => format!("{} AS {}", self.expr(expr), alias.to_sql()),
            SelectItem::Wildcard { qualifier, aliases } => {
                let mut sql = match qualifier {
                    Some(qualifier) => format!("{}.*", qualifier.to_sql()),
                    None => String::from("*"),
                };
                if !aliases.is_empty() {
                    sql.push_str(&format!(" AS ({})", identifier_list(aliases)));
                }
                sql
            }
        }
    }

    fn group_by(&self, group_by: &GroupBy) -> String {
        let elements = group_by
            .elements
            .iter()
            .map(|element| self.grouping_element(element))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}{elements}", Self::quantifier_prefix(group_by.quantifier))
    }

    fn grouping_element(&self, element: &GroupingElement) -> String {
        match element {
            GroupingElement::Expr(expr) => self.expr(expr),
            GroupingElement::Rollup(exprs) => format!("ROLLUP ({})", self.expr_list(exprs)),
            GroupingElement::Cube(exprs) => format!("CUBE ({})", self.expr_list(exprs)),
            GroupingElement::GroupingSets(sets) => {
                let sets = sets
                    .iter()
                    .map(|set| format!("({})", self.expr_list(set)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("GROUPING SETS ({sets})")
            }
        }
    }
}
