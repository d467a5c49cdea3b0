//! Binding powers for the Pratt expression parser.
//!
//! Powers are the ranks of the core [`Precedence`] tiers, so the parser and
//! the renderer agree on grouping by construction.

use sqltree_core::ast::{Associativity, BinaryOp, Precedence, UnaryOp};

use crate::lexer::{Keyword, TokenKind};

/// Binding power that admits every expression, lambdas included.
pub const LOWEST: u8 = Precedence::Lambda.rank();

/// Binding power of IS, IN, LIKE and BETWEEN.
pub const PREDICATE: u8 = Precedence::Comparison.rank();

/// Binding power required of predicate operands and frame offsets.
pub const PREDICATE_OPERAND: u8 = Precedence::Concat.rank();

/// Binding power of subscripts and field dereferences.
pub const POSTFIX: u8 = Precedence::Postfix.rank();

/// Converts a token to a binary operator.
#[must_use]
pub const fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        TokenKind::Concat => Some(BinaryOp::Concat),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        _ => None,
    }
}

/// Converts a token to a prefix operator.
#[must_use]
pub const fn token_to_unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Minus),
        TokenKind::Plus => Some(UnaryOp::Plus),
        TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
        _ => None,
    }
}

/// Returns `(left_bp, right_bp)` for a binary operator.
///
/// Every binary operator is parsed left-associatively: the right operand
/// must bind one tier tighter than the operator itself.
#[must_use]
pub const fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    let rank = op.precedence().rank();
    (rank, rank + 1)
}

/// Returns the binding power required of a prefix operator's operand.
#[must_use]
pub const fn prefix_binding_power(op: UnaryOp) -> u8 {
    op.precedence().rank()
}

/// Returns true for operators that cannot be chained without parentheses.
#[must_use]
pub fn is_non_associative(op: BinaryOp) -> bool {
    op.associativity() == Associativity::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        let (add, _) = infix_binding_power(BinaryOp::Add);
        let (mul, _) = infix_binding_power(BinaryOp::Mul);
        let (and, _) = infix_binding_power(BinaryOp::And);
        let (or, _) = infix_binding_power(BinaryOp::Or);
        let (eq, _) = infix_binding_power(BinaryOp::Eq);
        let (concat, _) = infix_binding_power(BinaryOp::Concat);
        assert!(mul > add);
        assert!(and > or);
        assert!(eq > and);
        assert!(add > concat);
        assert!(concat > eq);
    }

    #[test]
    fn test_left_associativity() {
        let (left, right) = infix_binding_power(BinaryOp::Sub);
        assert!(left < right);
    }

    #[test]
    fn test_token_to_binary_op() {
        assert_eq!(token_to_binary_op(&TokenKind::Plus), Some(BinaryOp::Add));
        assert_eq!(token_to_binary_op(&TokenKind::Concat), Some(BinaryOp::Concat));
        assert_eq!(token_to_binary_op(&TokenKind::NotEq), Some(BinaryOp::NotEq));
        assert_eq!(token_to_binary_op(&TokenKind::LeftParen), None);
    }

    #[test]
    fn test_token_to_unary_op() {
        assert_eq!(token_to_unary_op(&TokenKind::Minus), Some(UnaryOp::Minus));
        assert_eq!(
            token_to_unary_op(&TokenKind::Keyword(Keyword::Not)),
            Some(UnaryOp::Not)
        );
        assert_eq!(token_to_unary_op(&TokenKind::Star), None);
    }

    #[test]
    fn test_prefix_operands() {
        assert_eq!(prefix_binding_power(UnaryOp::Not), Precedence::Not.rank());
        assert!(prefix_binding_power(UnaryOp::Minus) > PREDICATE_OPERAND);
        assert!(POSTFIX > prefix_binding_power(UnaryOp::Minus));
    }

    #[test]
    fn test_comparisons_do_not_chain() {
        assert!(is_non_associative(BinaryOp::Lt));
        assert!(!is_non_associative(BinaryOp::Add));
    }
}
