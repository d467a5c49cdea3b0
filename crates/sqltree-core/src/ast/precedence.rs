//! Operator precedence and associativity.
//!
//! Every expression kind maps to a fixed [`Precedence`] tier. The renderer
//! uses the table to decide where parentheses are needed, and the parser
//! derives its binding powers from the same table so the two always agree.

use super::expression::{BinaryOp, Expr, Literal, UnaryOp};

/// Precedence tiers, lowest binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// `x -> body`
    Lambda,
    /// `OR`
    Or,
    /// `AND`
    And,
    /// Prefix `NOT`
    Not,
    /// Comparisons, `IS`, `LIKE`, `BETWEEN`, `IN`
    Comparison,
    /// `||`
    Concat,
    /// `+ -`
    Additive,
    /// `* / %`
    Multiplicative,
    /// Prefix `+ -`
    Unary,
    /// Subscript and field dereference
    Postfix,
    /// Literals, names, calls and anything self-delimiting
    Atomic,
}

impl Precedence {
    /// The weakest tier; a slot requiring it never parenthesizes.
    pub const LOWEST: Self = Self::Lambda;

    /// Numeric rank of the tier, usable as a Pratt binding power.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }
}

/// How operators of equal precedence group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a op b op c` is `(a op b) op c`.
    Left,
    /// `a op b op c` is `a op (b op c)`.
    Right,
    /// Chaining requires explicit parentheses.
    None,
}

/// Which operand of a binary node a child occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Left operand.
    Left,
    /// Right operand.
    Right,
}

impl BinaryOp {
    /// Returns the precedence tier of the operator.
    #[must_use]
    pub const fn precedence(&self) -> Precedence {
        match self {
            Self::Or => Precedence::Or,
            Self::And => Precedence::And,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq => {
                Precedence::Comparison
            }
            Self::Concat => Precedence::Concat,
            Self::Add | Self::Sub => Precedence::Additive,
            Self::Mul | Self::Div | Self::Mod => Precedence::Multiplicative,
        }
    }

    /// Returns how the operator groups with itself.
    #[must_use]
    pub const fn associativity(&self) -> Associativity {
        match self.precedence() {
            Precedence::Comparison => Associativity::None,
            _ => Associativity::Left,
        }
    }

    /// Returns true when `a op (b op c)` equals `(a op b) op c`.
    #[must_use]
    pub const fn is_associative(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Mul | Self::And | Self::Or | Self::Concat
        )
    }
}

impl UnaryOp {
    /// Returns the precedence tier of the operator.
    #[must_use]
    pub const fn precedence(&self) -> Precedence {
        match self {
            Self::Not => Precedence::Not,
            Self::Minus | Self::Plus => Precedence::Unary,
        }
    }
}

impl Expr {
    /// Returns the precedence tier of this node.
    #[must_use]
    pub fn precedence(&self) -> Precedence {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary { op, .. } => op.precedence(),
            Self::Literal(lit) if lit.is_negative() => Precedence::Unary,
            Self::IsNull { .. }
            | Self::IsDistinctFrom { .. }
            | Self::Like { .. }
            | Self::Between { .. }
            | Self::InList { .. }
            | Self::InSubquery { .. } => Precedence::Comparison,
            Self::Subscript { .. } | Self::Dereference { .. } => Precedence::Postfix,
            Self::Lambda { .. } => Precedence::Lambda,
            _ => Precedence::Atomic,
        }
    }

    /// Returns true if the rendered text of this node begins with a sign, so
    /// that a prefix `-` in front of it would read as a comment marker.
    #[must_use]
    pub fn starts_with_sign(&self) -> bool {
        match self {
            Self::Unary {
                op: UnaryOp::Minus | UnaryOp::Plus,
                ..
            } => true,
            Self::Literal(lit) => lit.is_negative(),
            _ => false,
        }
    }
}

impl Literal {
    /// Returns true for numeric literals below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Integer(n) => *n < 0,
            Self::Double(f) => f.is_sign_negative(),
            Self::Decimal(text) => text.starts_with('-'),
            _ => false,
        }
    }
}

/// Decides whether `child`, placed at `side` of a `parent` binary operator,
/// must be parenthesized.
#[must_use]
pub fn binary_operand_needs_parens(parent: BinaryOp, child: &Expr, side: Side) -> bool {
    let child_prec = child.precedence();
    let parent_prec = parent.precedence();
    if child_prec != parent_prec {
        return child_prec < parent_prec;
    }
    match (parent.associativity(), side) {
        (Associativity::None, _) => true,
        (Associativity::Left, Side::Left) | (Associativity::Right, Side::Right) => false,
        _ => !matches!(child, Expr::Binary { op, .. } if *op == parent && parent.is_associative()),
    }
}

/// Decides whether `child` must be parenthesized in a slot that requires at
/// least `required` precedence.
#[must_use]
pub fn needs_parens(child: &Expr, required: Precedence) -> bool {
    child.precedence() < required
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Precedence::Or < Precedence::And);
        assert!(Precedence::And < Precedence::Not);
        assert!(Precedence::Not < Precedence::Comparison);
        assert!(Precedence::Comparison < Precedence::Concat);
        assert!(Precedence::Concat < Precedence::Additive);
        assert!(Precedence::Additive < Precedence::Multiplicative);
        assert!(Precedence::Multiplicative < Precedence::Unary);
        assert!(Precedence::Unary < Precedence::Postfix);
        assert!(Precedence::Postfix < Precedence::Atomic);
    }

    #[test]
    fn test_binary_op_precedence() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::And.precedence() > BinaryOp::Or.precedence());
        assert!(BinaryOp::Eq.precedence() > BinaryOp::And.precedence());
        assert_eq!(BinaryOp::Lt.associativity(), Associativity::None);
        assert_eq!(BinaryOp::Sub.associativity(), Associativity::Left);
    }

    #[test]
    fn test_same_associative_operator_on_right() {
        let child = Expr::integer(2).add(Expr::integer(3));
        assert!(!binary_operand_needs_parens(BinaryOp::Add, &child, Side::Right));
        assert!(binary_operand_needs_parens(BinaryOp::Sub, &child, Side::Right));
        assert!(!binary_operand_needs_parens(BinaryOp::Sub, &child, Side::Left));
    }

    #[test]
    fn test_non_associative_comparison() {
        let child = Expr::column("a").eq(Expr::column("b"));
        assert!(binary_operand_needs_parens(BinaryOp::Eq, &child, Side::Left));
        assert!(binary_operand_needs_parens(BinaryOp::Eq, &child, Side::Right));
        assert!(!binary_operand_needs_parens(BinaryOp::And, &child, Side::Right));
    }

    #[test]
    fn test_negative_literal_is_unary() {
        assert_eq!(Expr::integer(-1).precedence(), Precedence::Unary);
        assert!(Expr::integer(-1).starts_with_sign());
        assert_eq!(Expr::integer(1).precedence(), Precedence::Atomic);
    }
}
