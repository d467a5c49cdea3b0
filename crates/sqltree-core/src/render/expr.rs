//! Expression rendering.

use super::printer::{pad, parenthesize};
use super::Renderer;
use crate::ast::{
    binary_operand_needs_parens, needs_parens, BinaryOp, Expr, FrameBound, FunctionCall,
    Identifier, Literal, NamedWindow, OrderDirection, OrderTerm, Over, Precedence,
    QualifiedName, SetQuantifier, Side, UnaryOp, WindowFrame, WindowSpec,
};

/// Functions written without an argument list.
const NILADIC_FUNCTIONS: &[&str] = &[
    "current_date",
    "current_time",
    "current_timestamp",
    "localtime",
    "localtimestamp",
];

/// Returns true if `name` is a function spelled without parentheses.
#[must_use]
pub fn is_niladic_function(name: &str) -> bool {
    NILADIC_FUNCTIONS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}

impl Renderer {
    /// Renders an expression in a slot that accepts any precedence.
    #[must_use]
    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(lit) => literal_sql(lit),
            Expr::Column(name) => name.to_sql(),
            Expr::Parameter(_) => String::from("?"),
            Expr::Wildcard(None) => String::from("*"),
            Expr::Wildcard(Some(qualifier)) => format!("{}.*", qualifier.to_sql()),
            Expr::Binary { left, op, right } => self.binary(left, *op, right),
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::IsNull { expr, negated } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} IS {not}NULL", self.predicate_operand(expr))
            }
            Expr::IsDistinctFrom {
                left,
                right,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!(
                    "{} IS {not}DISTINCT FROM {}",
                    self.predicate_operand(left),
                    self.predicate_operand(right)
                )
            }
            Expr::Like {
                expr,
                pattern,
                escape,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                let mut sql = format!(
                    "{} {not}LIKE {}",
                    self.predicate_operand(expr),
                    self.predicate_operand(pattern)
                );
                if let Some(escape) = escape {
                    sql.push_str(" ESCAPE ");
                    sql.push_str(&self.predicate_operand(escape));
                }
                sql
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!(
                    "{} {not}BETWEEN {} AND {}",
                    self.predicate_operand(expr),
                    self.predicate_operand(low),
                    self.predicate_operand(high)
                )
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!(
                    "{} {not}IN ({})",
                    self.predicate_operand(expr),
                    self.expr_list(list)
                )
            }
            Expr::InSubquery {
                expr,
                query,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!(
                    "{} {not}IN {}",
                    self.predicate_operand(expr),
                    parenthesize(&self.query(query))
                )
            }
            Expr::Exists(query) => format!("EXISTS {}", parenthesize(&self.query(query))),
            Expr::Subquery(query) => parenthesize(&self.query(query)),
            Expr::Function(call) => self.function(call),
            Expr::Cast {
                expr,
                data_type,
                safe,
            } => {
                let name = if *safe { "TRY_CAST" } else { "CAST" };
                format!("{name}({} AS {data_type})", self.expr(expr))
            }
            Expr::Case {
                operand,
                when_clauses,
                else_clause,
            } => self.case(operand.as_deref(), when_clauses, else_clause.as_deref()),
            Expr::Array(elements) => format!("ARRAY[{}]", self.expr_list(elements)),
            Expr::Row(elements) if elements.len() == 1 => {
                format!("ROW ({})", self.expr_list(elements))
            }
            Expr::Row(elements) if elements.is_empty() => String::from("ROW ()"),
            Expr::Row(elements) => format!("({})", self.expr_list(elements)),
            Expr::Subscript { base, index } => {
                format!(
                    "{}[{}]",
                    self.expr_at(base, Precedence::Postfix),
                    self.expr(index)
                )
            }
            Expr::Dereference { base, field } => {
                // A bare name followed by `.field` would read as a longer name.
                let base_sql = if matches!(**base, Expr::Column(_)) {
                    parenthesize(&self.expr(base))
                } else {
                    self.expr_at(base, Precedence::Postfix)
                };
                format!("{base_sql}.{}", field.to_sql())
            }
            Expr::Lambda { params, body } => {
                let params_sql = if params.len() == 1 {
                    params[0].to_sql()
                } else {
                    format!("({})", identifier_list(params))
                };
                format!("{params_sql} -> {}", self.expr(body))
            }
            Expr::Interval {
                value,
                negative,
                from,
                to,
            } => {
                let sign = if *negative { "-" } else { "" };
                let mut sql = format!("INTERVAL {sign}{} {}", quote_string(value), from.as_str());
                if let Some(to) = to {
                    sql.push_str(" TO ");
                    sql.push_str(to.as_str());
                }
                sql
            }
            Expr::TypedLiteral { type_name, value } => {
                format!("{type_name} {}", quote_string(value))
            }
        }
    }

    /// Renders `expr` in a slot requiring at least `required` precedence.
    #[must_use]
    pub fn expr_at(&self, expr: &Expr, required: Precedence) -> String {
        let sql = self.expr(expr);
        if needs_parens(expr, required) {
            parenthesize(&sql)
        } else {
            sql
        }
    }

    /// Renders a comma-separated list at the lowest precedence.
    pub(crate) fn expr_list(&self, exprs: &[Expr]) -> String {
        exprs
            .iter()
            .map(|expr| self.expr(expr))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn predicate_operand(&self, expr: &Expr) -> String {
        self.expr_at(expr, Precedence::Concat)
    }

    fn binary(&self, left: &Expr, op: BinaryOp, right: &Expr) -> String {
        let left_sql = self.binary_operand(op, left, Side::Left);
        let right_sql = self.binary_operand(op, right, Side::Right);
        if op.is_logical() {
            format!(
                "{left_sql}{}{} {right_sql}",
                self.break_or_space(),
                op.as_str()
            )
        } else {
            format!("{left_sql} {} {right_sql}", op.as_str())
        }
    }

    fn binary_operand(&self, parent: BinaryOp, child: &Expr, side: Side) -> String {
        let sql = self.expr(child);
        if binary_operand_needs_parens(parent, child, side) {
            parenthesize(&sql)
        } else {
            sql
        }
    }

    fn unary(&self, op: UnaryOp, operand: &Expr) -> String {
        match op {
            UnaryOp::Not => format!("NOT {}", self.expr_at(operand, Precedence::Not)),
            UnaryOp::Minus | UnaryOp::Plus => {
                let sql = self.expr(operand);
                let operand_sql =
                    if needs_parens(operand, Precedence::Unary) || operand.starts_with_sign() {
                        parenthesize(&sql)
                    } else {
                        sql
                    };
                format!("{}{operand_sql}", op.as_str())
            }
        }
    }

    fn function(&self, call: &FunctionCall) -> String {
        let name = function_name(&call.name);
        let is_bare = call.args.is_empty()
            && call.quantifier.is_none()
            && call.order_by.is_empty()
            && call.filter.is_none()
            && call.null_treatment.is_none()
            && call.over.is_none()
            && call.name.len() == 1
            && !call.name.name().delimited
            && is_niladic_function(&call.name.name().value);
        if is_bare {
            return name;
        }

        let mut sql = format!("{name}(");
        if let Some(quantifier) = call.quantifier {
            sql.push_str(quantifier.as_str());
            sql.push(' ');
        }
        sql.push_str(&self.expr_list(&call.args));
        if !call.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_terms(&call.order_by));
        }
        sql.push(')');
        if let Some(filter) = &call.filter {
            sql.push_str(&format!(" FILTER (WHERE {})", self.expr(filter)));
        }
        if let Some(treatment) = call.null_treatment {
            sql.push(' ');
            sql.push_str(treatment.as_str());
        }
        match &call.over {
            Some(Over::Named(name)) => {
                sql.push_str(" OVER ");
                sql.push_str(&name.to_sql());
            }
            Some(Over::Spec(spec)) => {
                sql.push_str(&format!(" OVER ({})", self.window_spec(spec)));
            }
            None => {}
        }
        sql
    }

    fn case(
        &self,
        operand: Option<&Expr>,
        when_clauses: &[(Expr, Expr)],
        else_clause: Option<&Expr>,
    ) -> String {
        let mut branches: Vec<String> = when_clauses
            .iter()
            .map(|(condition, result)| {
                format!("WHEN {} THEN {}", self.expr(condition), self.expr(result))
            })
            .collect();
        if let Some(else_clause) = else_clause {
            branches.push(format!("ELSE {}", self.expr(else_clause)));
        }
        let head = match operand {
            Some(operand) => format!("CASE {}", self.expr(operand)),
            None => String::from("CASE"),
        };
        if self.is_pretty() {
            let indent = " ".repeat(self.options().indent);
            let body = pad(&branches.join("\n"), self.options().indent);
            format!("{head}\n{indent}{body}\nEND")
        } else {
            format!("{head} {} END", branches.join(" "))
        }
    }

    /// Renders ORDER BY terms as a comma-separated list.
    pub(crate) fn order_terms(&self, terms: &[OrderTerm]) -> String {
        terms
            .iter()
            .map(|term| self.order_term(term))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn order_term(&self, term: &OrderTerm) -> String {
        let mut sql = self.expr(&term.expr);
        if term.direction != OrderDirection::Asc {
            sql.push(' ');
            sql.push_str(term.direction.as_str());
        }
        if let Some(nulls) = term.nulls {
            sql.push(' ');
            sql.push_str(nulls.as_str());
        }
        sql
    }

    /// Renders the inside of an `OVER (...)` clause.
    pub(crate) fn window_spec(&self, spec: &WindowSpec) -> String {
        let mut parts = Vec::new();
        if let Some(existing) = &spec.existing {
            parts.push(existing.to_sql());
        }
        if !spec.partition_by.is_empty() {
            parts.push(format!("PARTITION BY {}", self.expr_list(&spec.partition_by)));
        }
        if !spec.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_terms(&spec.order_by)));
        }
        if let Some(frame) = &spec.frame {
            parts.push(self.window_frame(frame));
        }
        parts.join(" ")
    }

    /// Renders a `WINDOW` clause entry.
    pub(crate) fn named_window(&self, window: &NamedWindow) -> String {
        format!("{} AS ({})", window.name.to_sql(), self.window_spec(&window.spec))
    }

    fn window_frame(&self, frame: &WindowFrame) -> String {
        match &frame.end {
            Some(end) => format!(
                "{} BETWEEN {} AND {}",
                frame.units.as_str(),
                self.frame_bound(&frame.start),
                self.frame_bound(end)
            ),
            None => format!("{} {}", frame.units.as_str(), self.frame_bound(&frame.start)),
        }
    }

    fn frame_bound(&self, bound: &FrameBound) -> String {
        match bound {
            FrameBound::UnboundedPreceding => String::from("UNBOUNDED PRECEDING"),
            FrameBound::Preceding(offset) => {
                format!("{} PRECEDING", self.expr_at(offset, Precedence::Concat))
            }
            FrameBound::CurrentRow => String::from("CURRENT ROW"),
            FrameBound::Following(offset) => {
                format!("{} FOLLOWING", self.expr_at(offset, Precedence::Concat))
            }
            FrameBound::UnboundedFollowing => String::from("UNBOUNDED FOLLOWING"),
        }
    }

    /// Renders a `DISTINCT `/`ALL ` prefix, or nothing.
    pub(crate) fn quantifier_prefix(quantifier: Option<SetQuantifier>) -> &'static str {
        match quantifier {
            Some(SetQuantifier::Distinct) => "DISTINCT ",
            Some(SetQuantifier::All) => "ALL ",
            None => "",
        }
    }
}

/// Renders a literal.
#[must_use]
pub fn literal_sql(lit: &Literal) -> String {
    match lit {
        Literal::Null => String::from("NULL"),
        Literal::Boolean(true) => String::from("TRUE"),
        Literal::Boolean(false) => String::from("FALSE"),
        Literal::Integer(n) => n.to_string(),
        Literal::Decimal(text) => text.clone(),
        Literal::Double(value) if value.is_nan() => String::from("nan()"),
        Literal::Double(value) if value.is_infinite() => {
            if value.is_sign_negative() {
                String::from("-infinity()")
            } else {
                String::from("infinity()")
            }
        }
        Literal::Double(value) => format!("{value:E}"),
        Literal::String(text) => quote_string(text),
        Literal::Binary(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}

/// Quotes text as an SQL string literal.
#[must_use]
pub fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn function_name(name: &QualifiedName) -> String {
    name.parts()
        .iter()
        .map(|part| {
            if part.delimited {
                part.to_sql()
            } else {
                part.value.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Renders identifiers as a comma-separated list.
pub(crate) fn identifier_list(idents: &[Identifier]) -> String {
    idents
        .iter()
        .map(Identifier::to_sql)
        .collect::<Vec<_>>()
        .join(", ")
}
