//! SQL parser implementation.

use sqltree_core::ast::{
    Cte, DataType, Expr, FrameBound, FrameUnits, FunctionCall, GroupBy, GroupingElement,
    Identifier, IntervalField, JoinCriteria, JoinType, Limit, Literal, NamedWindow, NullOrdering,
    NullTreatment, OrderDirection, OrderTerm, Over, QualifiedName, Query, QueryBody, Relation,
    RowField, SampleMethod, Select, SelectItem, SetOperation, SetOperator, SetQuantifier, Unnest,
    ValuesQuery, WindowFrame, WindowSpec, With, DEFAULT_DECIMAL_PRECISION, DEFAULT_TIME_PRECISION,
    MAX_CHAR_LENGTH, MAX_DECIMAL_PRECISION,
};
use sqltree_core::error::ConstructionError;
use sqltree_core::render::is_niladic_function;
use tracing::trace;

use super::error::{ParseError, Result};
use super::pratt::{
    infix_binding_power, is_non_associative, prefix_binding_power, token_to_binary_op,
    token_to_unary_op, LOWEST, POSTFIX, PREDICATE, PREDICATE_OPERAND,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Deepest nesting of expressions, queries, relations and types accepted.
const MAX_DEPTH: usize = 64;

/// Largest fractional-second precision of TIME and TIMESTAMP.
const MAX_TIME_PRECISION: u32 = 12;

/// Position to rewind to after a failed speculative parse.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: usize,
    param_counter: usize,
}

/// SQL parser over a tokenized input.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// Parameter counter for ? placeholders.
    param_counter: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        let tokens = Lexer::new(input).tokenize();
        Self {
            input,
            tokens,
            pos: 0,
            param_counter: 0,
            depth: 0,
        }
    }

    /// Parses the whole input as one query, with an optional trailing `;`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the input is not a single valid query.
    pub fn parse_query_statement(&mut self) -> Result<Query> {
        let query = self.parse_query()?;
        self.finish()?;
        Ok(query)
    }

    /// Parses the whole input as one expression.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the input is not a single valid expression.
    pub fn parse_expression_statement(&mut self) -> Result<Expr> {
        let expr = self.parse_expression(LOWEST)?;
        self.finish()?;
        Ok(expr)
    }

    /// Parses the whole input as one data type.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the input is not a single valid type.
    pub fn parse_data_type_statement(&mut self) -> Result<DataType> {
        let data_type = self.parse_data_type()?;
        self.finish()?;
        Ok(data_type)
    }

    fn finish(&mut self) -> Result<()> {
        self.eat(&TokenKind::Semicolon);
        if self.peek().is_eof() {
            Ok(())
        } else {
            Err(self.error_here("end of input"))
        }
    }

    // ===================================================================
    // Queries
    // ===================================================================

    /// Parses a query: `[WITH ...] body [ORDER BY ...] [OFFSET n] [LIMIT n]`.
    fn parse_query(&mut self) -> Result<Query> {
        self.nested(|p| {
            let with = if p.check_keyword(Keyword::With) {
                Some(p.parse_with()?)
            } else {
                None
            };
            let term = p.parse_query_expression()?;

            let order_by = if p.eat_keyword(Keyword::Order) {
                p.expect_keyword(Keyword::By)?;
                p.parse_order_terms()?
            } else {
                vec![]
            };
            let offset = if p.eat_keyword(Keyword::Offset) {
                let count = p.parse_count()?;
                if !p.eat_word("ROWS") {
                    p.eat_word("ROW");
                }
                Some(count)
            } else {
                None
            };
            let limit = if p.eat_keyword(Keyword::Limit) {
                if p.eat_keyword(Keyword::All) {
                    Some(Limit::All)
                } else {
                    Some(Limit::Count(p.parse_count()?))
                }
            } else {
                None
            };

            if with.is_none() && order_by.is_empty() && offset.is_none() && limit.is_none() {
                return Ok(term);
            }
            let mut query = if term.has_modifiers() {
                Query::new(QueryBody::Nested(Box::new(term)))
            } else {
                term
            };
            query.with = with;
            query.order_by = order_by;
            query.offset = offset;
            query.limit = limit;
            Ok(query)
        })
    }

    fn parse_with(&mut self) -> Result<With> {
        self.expect_keyword(Keyword::With)?;
        let recursive = self.eat_word("RECURSIVE");
        let mut ctes = vec![self.parse_cte()?];
        while self.eat(&TokenKind::Comma) {
            ctes.push(self.parse_cte()?);
        }
        Ok(With { recursive, ctes })
    }

    fn parse_cte(&mut self) -> Result<Cte> {
        let name = self.parse_identifier()?;
        let columns = if self.check(&TokenKind::LeftParen) {
            self.parse_identifier_list()?
        } else {
            vec![]
        };
        self.expect_keyword(Keyword::As)?;
        let query = self.parse_parenthesized_query()?;
        Ok(Cte {
            name,
            columns,
            query: Box::new(query),
        })
    }

    /// UNION and EXCEPT, left-associative over INTERSECT terms.
    fn parse_query_expression(&mut self) -> Result<Query> {
        let mut left = self.parse_query_term()?;
        loop {
            let operator = if self.eat_keyword(Keyword::Union) {
                SetOperator::Union
            } else if self.eat_keyword(Keyword::Except) {
                SetOperator::Except
            } else {
                break;
            };
            let all = self.parse_set_quantifier() == Some(SetQuantifier::All);
            let right = self.parse_query_term()?;
            left = set_query(operator, all, left, right);
        }
        Ok(left)
    }

    fn parse_query_term(&mut self) -> Result<Query> {
        let mut left = self.parse_query_primary()?;
        while self.eat_keyword(Keyword::Intersect) {
            let all = self.parse_set_quantifier() == Some(SetQuantifier::All);
            let right = self.parse_query_primary()?;
            left = set_query(SetOperator::Intersect, all, left, right);
        }
        Ok(left)
    }

    fn parse_query_primary(&mut self) -> Result<Query> {
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Select) => Ok(Query::select(self.parse_select()?)),
            TokenKind::Keyword(Keyword::Table) => {
                self.advance();
                Ok(Query::table(self.parse_qualified_name()?))
            }
            TokenKind::Keyword(Keyword::Values) => {
                let values = self.parse_values()?;
                Ok(Query::new(QueryBody::Values(values)))
            }
            TokenKind::LeftParen => self.parse_parenthesized_query(),
            _ => Err(self.error_here("SELECT, TABLE, VALUES or '('")),
        }
    }

    fn parse_parenthesized_query(&mut self) -> Result<Query> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let query = self.parse_query()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(query)
    }

    fn parse_values(&mut self) -> Result<ValuesQuery> {
        let start = self.current_span();
        self.expect_keyword(Keyword::Values)?;
        let rows = self.parse_expression_list()?;
        ValuesQuery::new(rows).map_err(|e| construction_error(e, start))
    }

    /// Returns the explicit DISTINCT or ALL, if any.
    fn parse_set_quantifier(&mut self) -> Option<SetQuantifier> {
        if self.eat_keyword(Keyword::Distinct) {
            Some(SetQuantifier::Distinct)
        } else if self.eat_keyword(Keyword::All) {
            Some(SetQuantifier::All)
        } else {
            None
        }
    }

    fn parse_select(&mut self) -> Result<Select> {
        let start = self.current_span();
        self.expect_keyword(Keyword::Select)?;
        let quantifier = self.parse_set_quantifier();

        let mut items = vec![self.parse_select_item()?];
        while self.eat(&TokenKind::Comma) {
            items.push(self.parse_select_item()?);
        }
        let mut select = Select::new(items).map_err(|e| construction_error(e, start))?;
        select.quantifier = quantifier;

        if self.eat_keyword(Keyword::From) {
            select.from.push(self.parse_relation()?);
            while self.eat(&TokenKind::Comma) {
                select.from.push(self.parse_relation()?);
            }
        }

        if self.eat_keyword(Keyword::Where) {
            select.where_clause = Some(self.parse_expression(LOWEST)?);
        }

        if self.eat_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            let quantifier = self.parse_set_quantifier();
            let mut elements = vec![self.parse_grouping_element()?];
            while self.eat(&TokenKind::Comma) {
                elements.push(self.parse_grouping_element()?);
            }
            select.group_by = Some(GroupBy {
                quantifier,
                elements,
            });
        }

        if self.eat_keyword(Keyword::Having) {
            select.having = Some(self.parse_expression(LOWEST)?);
        }

        if self.eat_keyword(Keyword::Window) {
            loop {
                let name = self.parse_identifier()?;
                self.expect_keyword(Keyword::As)?;
                self.expect(&TokenKind::LeftParen, "'('")?;
                let spec = self.parse_window_spec()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                select.windows.push(NamedWindow { name, spec });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(select)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        let qualifier = if self.eat(&TokenKind::Star) {
            Some(None)
        } else if self.qualified_wildcard_ahead() {
            let name = self.parse_qualified_name()?;
            self.expect(&TokenKind::Dot, "'.'")?;
            self.expect(&TokenKind::Star, "'*'")?;
            Some(Some(name))
        } else {
            None
        };
        if let Some(qualifier) = qualifier {
            let aliases =
                if self.check_keyword(Keyword::As) && self.peek_at(1) == &TokenKind::LeftParen {
                    self.advance();
                    self.parse_identifier_list()?
                } else {
                    vec![]
                };
            return Ok(SelectItem::Wildcard { qualifier, aliases });
        }

        let expr = self.parse_expression(LOWEST)?;
        let alias = self.parse_optional_alias()?;
        Ok(SelectItem::Expr { expr, alias })
    }

    /// Parses `AS alias` or a bare alias, if present.
    fn parse_optional_alias(&mut self) -> Result<Option<Identifier>> {
        if self.eat_keyword(Keyword::As) {
            return Ok(Some(self.parse_identifier()?));
        }
        if matches!(self.peek_kind(), TokenKind::Identifier { .. }) {
            return Ok(Some(self.parse_identifier()?));
        }
        Ok(None)
    }

    fn parse_grouping_element(&mut self) -> Result<GroupingElement> {
        let start = self.current_span();
        let followed_by_paren = self.peek_at(1) == &TokenKind::LeftParen;
        if self.check_word("ROLLUP") && followed_by_paren {
            self.advance();
            let exprs = self.parse_parenthesized_list()?;
            return GroupingElement::rollup(exprs).map_err(|e| construction_error(e, start));
        }
        if self.check_word("CUBE") && followed_by_paren {
            self.advance();
            let exprs = self.parse_parenthesized_list()?;
            return GroupingElement::cube(exprs).map_err(|e| construction_error(e, start));
        }
        if self.check_word("GROUPING") && self.peek_at(1).is_word("SETS") {
            self.advance();
            self.advance();
            self.expect(&TokenKind::LeftParen, "'('")?;
            let mut sets = vec![self.parse_grouping_set()?];
            while self.eat(&TokenKind::Comma) {
                sets.push(self.parse_grouping_set()?);
            }
            self.expect(&TokenKind::RightParen, "')'")?;
            return GroupingElement::grouping_sets(sets).map_err(|e| construction_error(e, start));
        }
        Ok(GroupingElement::Expr(self.parse_expression(LOWEST)?))
    }

    /// One set of GROUPING SETS: `(a, b)`, `()` or a lone expression.
    fn parse_grouping_set(&mut self) -> Result<Vec<Expr>> {
        if self.check(&TokenKind::LeftParen) {
            let set = self.attempt(|p| {
                let exprs = p.parse_parenthesized_list()?;
                if matches!(p.peek_kind(), TokenKind::Comma | TokenKind::RightParen) {
                    Ok(exprs)
                } else {
                    Err(p.error_here("',' or ')'"))
                }
            });
            if let Ok(set) = set {
                return Ok(set);
            }
        }
        Ok(vec![self.parse_expression(LOWEST)?])
    }

    fn parse_order_terms(&mut self) -> Result<Vec<OrderTerm>> {
        let mut terms = vec![self.parse_order_term()?];
        while self.eat(&TokenKind::Comma) {
            terms.push(self.parse_order_term()?);
        }
        Ok(terms)
    }

    fn parse_order_term(&mut self) -> Result<OrderTerm> {
        let expr = self.parse_expression(LOWEST)?;
        let direction = if self.eat_word("DESC") {
            OrderDirection::Desc
        } else {
            self.eat_word("ASC");
            OrderDirection::Asc
        };
        let nulls = if self.eat_word("NULLS") {
            if self.eat_word("FIRST") {
                Some(NullOrdering::First)
            } else if self.eat_word("LAST") {
                Some(NullOrdering::Last)
            } else {
                return Err(self.error_here("FIRST or LAST"));
            }
        } else {
            None
        };
        Ok(OrderTerm {
            expr,
            direction,
            nulls,
        })
    }

    /// Parses a non-negative row count for OFFSET and LIMIT.
    fn parse_count(&mut self) -> Result<u64> {
        match self.peek_kind() {
            TokenKind::Integer(value) => {
                let value = *value;
                let span = self.current_span();
                self.advance();
                u64::try_from(value)
                    .map_err(|_| ParseError::new("Row count must not be negative", span))
            }
            _ => Err(self.error_here("row count")),
        }
    }

    // ===================================================================
    // Relations
    // ===================================================================

    /// Parses a FROM item: a chain of joins.
    fn parse_relation(&mut self) -> Result<Relation> {
        self.nested(|p| {
            let mut left = p.parse_sampled_relation()?;
            loop {
                let start = p.current_span();
                if p.eat_keyword(Keyword::Cross) {
                    p.expect_keyword(Keyword::Join)?;
                    let right = p.parse_sampled_relation()?;
                    left = left.cross_join(right);
                    continue;
                }

                let natural = p.eat_keyword(Keyword::Natural);
                let join_type = match p.peek_kind() {
                    TokenKind::Keyword(Keyword::Join) => JoinType::Inner,
                    TokenKind::Keyword(Keyword::Inner) => {
                        p.advance();
                        JoinType::Inner
                    }
                    TokenKind::Keyword(Keyword::Left) => {
                        p.advance();
                        p.eat_keyword(Keyword::Outer);
                        JoinType::Left
                    }
                    TokenKind::Keyword(Keyword::Right) => {
                        p.advance();
                        p.eat_keyword(Keyword::Outer);
                        JoinType::Right
                    }
                    TokenKind::Keyword(Keyword::Full) => {
                        p.advance();
                        p.eat_keyword(Keyword::Outer);
                        JoinType::Full
                    }
                    _ if natural => return Err(p.error_here("join type")),
                    _ => break,
                };
                p.expect_keyword(Keyword::Join)?;
                let right = p.parse_sampled_relation()?;

                let criteria = if natural {
                    JoinCriteria::Natural
                } else if p.eat_keyword(Keyword::On) {
                    JoinCriteria::On(p.parse_expression(LOWEST)?)
                } else if p.eat_keyword(Keyword::Using) {
                    JoinCriteria::Using(p.parse_identifier_list()?)
                } else {
                    return Err(p.error_here("ON or USING"));
                };
                left = left
                    .join(right, join_type, criteria)
                    .map_err(|e| construction_error(e, start))?;
            }
            Ok(left)
        })
    }

    fn parse_sampled_relation(&mut self) -> Result<Relation> {
        let relation = self.parse_aliased_relation()?;
        if !self.eat_keyword(Keyword::Tablesample) {
            return Ok(relation);
        }
        let method = if self.eat_word("BERNOULLI") {
            SampleMethod::Bernoulli
        } else if self.eat_word("SYSTEM") {
            SampleMethod::System
        } else {
            return Err(self.error_here("BERNOULLI or SYSTEM"));
        };
        self.expect(&TokenKind::LeftParen, "'('")?;
        let percentage = self.parse_expression(LOWEST)?;
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(relation.sample(method, percentage))
    }

    fn parse_aliased_relation(&mut self) -> Result<Relation> {
        let relation = self.parse_relation_primary()?;
        let Some(alias) = self.parse_optional_alias()? else {
            return Ok(relation);
        };
        let columns = if self.check(&TokenKind::LeftParen) {
            self.parse_identifier_list()?
        } else {
            vec![]
        };
        Ok(relation.alias_with_columns(alias, columns))
    }

    fn parse_relation_primary(&mut self) -> Result<Relation> {
        let start = self.current_span();
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Unnest) => {
                self.advance();
                let args = self.parse_parenthesized_list()?;
                let with_ordinality = self.check_keyword(Keyword::With)
                    && self.peek_at(1).is_word("ORDINALITY");
                if with_ordinality {
                    self.advance();
                    self.advance();
                }
                let unnest =
                    Unnest::new(args, with_ordinality).map_err(|e| construction_error(e, start))?;
                Ok(Relation::Unnest(unnest))
            }
            TokenKind::Keyword(Keyword::Lateral) => {
                self.advance();
                Ok(Relation::lateral(self.parse_parenthesized_query()?))
            }
            TokenKind::LeftParen => {
                if self.query_ahead() {
                    if let Ok(query) = self.attempt(Self::parse_parenthesized_query) {
                        return Ok(relation_from_query(query));
                    }
                }
                self.advance();
                let relation = self.parse_relation()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                Ok(relation)
            }
            TokenKind::Identifier { .. } => Ok(Relation::table(self.parse_qualified_name()?)),
            _ => Err(self.error_here("table name or '('")),
        }
    }

    // ===================================================================
    // Expressions
    // ===================================================================

    /// Parses an expression whose operators all bind at least as tightly as
    /// `min_bp`.
    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr> {
        self.nested(|p| {
            let mut left = p.parse_prefix(min_bp)?;
            // Set once a comparison or predicate was applied at this level.
            let mut compared = false;

            loop {
                // Postfix: subscript and field dereference
                if POSTFIX >= min_bp && p.eat(&TokenKind::LeftBracket) {
                    let index = p.parse_expression(LOWEST)?;
                    p.expect(&TokenKind::RightBracket, "']'")?;
                    left = left.subscript(index);
                    continue;
                }
                if POSTFIX >= min_bp && p.check(&TokenKind::Dot) {
                    p.advance();
                    let field = p.parse_identifier()?;
                    left = left.field(field);
                    continue;
                }

                if let Some(op) = token_to_binary_op(p.peek_kind()) {
                    let (left_bp, right_bp) = infix_binding_power(op);
                    if left_bp < min_bp {
                        break;
                    }
                    if is_non_associative(op) {
                        if compared {
                            return Err(p.error_here("a parenthesized comparison"));
                        }
                        compared = true;
                    }
                    p.advance();
                    let right = p.parse_expression(right_bp)?;
                    left = left.binary(op, right);
                    continue;
                }

                if p.predicate_ahead() {
                    if PREDICATE < min_bp {
                        break;
                    }
                    if compared {
                        return Err(p.error_here("a parenthesized comparison"));
                    }
                    compared = true;
                    left = p.parse_predicate(left)?;
                    continue;
                }

                break;
            }
            Ok(left)
        })
    }

    fn parse_prefix(&mut self, min_bp: u8) -> Result<Expr> {
        if let Some(op) = token_to_unary_op(self.peek_kind()) {
            self.advance();
            let operand = self.parse_expression(prefix_binding_power(op))?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_primary(min_bp)
    }

    fn parse_primary(&mut self, min_bp: u8) -> Result<Expr> {
        let start = self.current_span();
        let expr = match self.peek_kind().clone() {
            TokenKind::Integer(value) => {
                self.advance();
                Expr::integer(value)
            }
            TokenKind::Decimal(text) => {
                self.advance();
                Expr::decimal(text)
            }
            TokenKind::Double(value) => {
                self.advance();
                Expr::double(value)
            }
            TokenKind::String(value) => {
                self.advance();
                Expr::string(value)
            }
            TokenKind::Binary(bytes) => {
                self.advance();
                Expr::Literal(Literal::Binary(bytes))
            }
            TokenKind::Question => {
                self.advance();
                self.param_counter += 1;
                Expr::Parameter(self.param_counter)
            }
            TokenKind::Star => {
                self.advance();
                Expr::Wildcard(None)
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Expr::null()
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Expr::boolean(true)
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Expr::boolean(false)
            }
            TokenKind::Keyword(Keyword::Case) => self.parse_case()?,
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast(false)?,
            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                Expr::Exists(Box::new(self.parse_parenthesized_query()?))
            }
            TokenKind::LeftParen => self.parse_parenthesized(min_bp)?,
            TokenKind::Identifier { value, delimited } => {
                self.parse_word_expression(&value, delimited, min_bp)?
            }
            _ => return Err(self.error_here("expression")),
        };
        trace!(start = start.start, "parsed primary expression");
        Ok(expr)
    }

    /// Parses an expression starting with a name or contextual word.
    fn parse_word_expression(&mut self, word: &str, delimited: bool, min_bp: u8) -> Result<Expr> {
        if min_bp <= LOWEST && self.peek_at(1) == &TokenKind::Arrow {
            let param = self.parse_identifier()?;
            return self.parse_lambda_body(vec![param]);
        }

        if !delimited {
            let next = self.peek_at(1);
            let upper = word.to_ascii_uppercase();
            match upper.as_str() {
                "INTERVAL"
                    if matches!(next, TokenKind::String(_))
                        || (matches!(next, TokenKind::Minus | TokenKind::Plus)
                            && matches!(self.peek_at(2), TokenKind::String(_))) =>
                {
                    return self.parse_interval();
                }
                "ARRAY" if next == &TokenKind::LeftBracket => {
                    self.advance();
                    self.advance();
                    let elements = if self.check(&TokenKind::RightBracket) {
                        vec![]
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect(&TokenKind::RightBracket, "']'")?;
                    return Ok(Expr::Array(elements));
                }
                "ROW" if next == &TokenKind::LeftParen => {
                    self.advance();
                    self.advance();
                    let elements = if self.check(&TokenKind::RightParen) {
                        vec![]
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect(&TokenKind::RightParen, "')'")?;
                    return Ok(Expr::Row(elements));
                }
                "TRY_CAST" if next == &TokenKind::LeftParen => return self.parse_cast(true),
                _ => {}
            }
            if let TokenKind::String(value) = next {
                let value = value.clone();
                self.advance();
                self.advance();
                return Ok(Expr::typed_literal(word, value));
            }
        }

        let name = self.parse_qualified_name()?;
        if self.check(&TokenKind::LeftParen) {
            return self.parse_function_call(name);
        }
        if self.check(&TokenKind::Dot) && self.peek_at(1) == &TokenKind::Star {
            self.advance();
            self.advance();
            return Ok(Expr::Wildcard(Some(name)));
        }
        if name.len() == 1 && !name.name().delimited && is_niladic_function(&name.name().value) {
            return Ok(Expr::Function(FunctionCall::new(name, vec![])));
        }
        Ok(Expr::Column(name))
    }

    fn parse_lambda_body(&mut self, params: Vec<Identifier>) -> Result<Expr> {
        let start = self.current_span();
        self.expect(&TokenKind::Arrow, "'->'")?;
        let body = self.parse_expression(LOWEST)?;
        Expr::lambda(params, body).map_err(|e| construction_error(e, start))
    }

    /// Parses what follows `(`: a lambda parameter list, a subquery, a row
    /// constructor or a grouped expression.
    fn parse_parenthesized(&mut self, min_bp: u8) -> Result<Expr> {
        if min_bp <= LOWEST && self.lambda_parameters_ahead() {
            let params = self.parse_identifier_list()?;
            return self.parse_lambda_body(params);
        }

        if self.query_ahead() {
            match self.attempt(Self::parse_parenthesized_query) {
                Ok(query) => return Ok(Expr::Subquery(Box::new(query))),
                Err(query_error) => {
                    // Not a subquery after all, e.g. `((SELECT 1) + 1)`.
                    return self
                        .parse_grouped_expression()
                        .map_err(|_| query_error);
                }
            }
        }
        self.parse_grouped_expression()
    }

    fn parse_grouped_expression(&mut self) -> Result<Expr> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let first = self.parse_expression(LOWEST)?;
        if self.eat(&TokenKind::Comma) {
            let mut elements = vec![first];
            elements.extend(self.parse_expression_list()?);
            self.expect(&TokenKind::RightParen, "')'")?;
            return Ok(Expr::Row(elements));
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(first)
    }

    /// Parses IS, LIKE, BETWEEN and IN applied to `left`.
    fn parse_predicate(&mut self, left: Expr) -> Result<Expr> {
        let start = self.current_span();
        let left = Box::new(left);

        if self.eat_keyword(Keyword::Is) {
            let negated = self.eat_keyword(Keyword::Not);
            if self.eat_keyword(Keyword::Null) {
                return Ok(Expr::IsNull {
                    expr: left,
                    negated,
                });
            }
            if self.eat_keyword(Keyword::Distinct) {
                self.expect_keyword(Keyword::From)?;
                let right = self.parse_expression(PREDICATE_OPERAND)?;
                return Ok(Expr::IsDistinctFrom {
                    left,
                    right: Box::new(right),
                    negated,
                });
            }
            return Err(self.error_here("NULL or DISTINCT FROM"));
        }

        let negated = self.eat_keyword(Keyword::Not);
        if self.eat_keyword(Keyword::Like) {
            let pattern = self.parse_expression(PREDICATE_OPERAND)?;
            let escape = if self.eat_word("ESCAPE") {
                Some(Box::new(self.parse_expression(PREDICATE_OPERAND)?))
            } else {
                None
            };
            return Ok(Expr::Like {
                expr: left,
                pattern: Box::new(pattern),
                escape,
                negated,
            });
        }
        if self.eat_keyword(Keyword::Between) {
            let low = self.parse_expression(PREDICATE_OPERAND)?;
            self.expect_keyword(Keyword::And)?;
            let high = self.parse_expression(PREDICATE_OPERAND)?;
            return Ok(Expr::Between {
                expr: left,
                low: Box::new(low),
                high: Box::new(high),
                negated,
            });
        }
        if self.eat_keyword(Keyword::In) {
            if self.query_ahead() {
                if let Ok(query) = self.attempt(Self::parse_parenthesized_query) {
                    return Ok(Expr::InSubquery {
                        expr: left,
                        query: Box::new(query),
                        negated,
                    });
                }
            }
            let list = self.parse_parenthesized_list()?;
            if list.is_empty() {
                return Err(construction_error(ConstructionError::EmptyInList, start));
            }
            return Ok(Expr::InList {
                expr: left,
                list,
                negated,
            });
        }
        Err(self.error_here("LIKE, BETWEEN or IN"))
    }

    fn parse_case(&mut self) -> Result<Expr> {
        let start = self.current_span();
        self.expect_keyword(Keyword::Case)?;
        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(self.parse_expression(LOWEST)?)
        };

        let mut when_clauses = Vec::new();
        while self.eat_keyword(Keyword::When) {
            let condition = self.parse_expression(LOWEST)?;
            self.expect_keyword(Keyword::Then)?;
            let result = self.parse_expression(LOWEST)?;
            when_clauses.push((condition, result));
        }
        if when_clauses.is_empty() {
            return Err(self.error_here("WHEN"));
        }
        let else_clause = if self.eat_keyword(Keyword::Else) {
            Some(self.parse_expression(LOWEST)?)
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;
        Expr::case(operand, when_clauses, else_clause).map_err(|e| construction_error(e, start))
    }

    /// Parses `CAST(x AS type)`, or `TRY_CAST(...)` when `safe`.
    fn parse_cast(&mut self, safe: bool) -> Result<Expr> {
        self.advance(); // CAST or TRY_CAST
        self.expect(&TokenKind::LeftParen, "'('")?;
        let expr = self.parse_expression(LOWEST)?;
        self.expect_keyword(Keyword::As)?;
        let data_type = self.parse_data_type()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(Expr::Cast {
            expr: Box::new(expr),
            data_type,
            safe,
        })
    }

    fn parse_interval(&mut self) -> Result<Expr> {
        let start = self.current_span();
        self.advance(); // INTERVAL
        let negative = if self.eat(&TokenKind::Minus) {
            true
        } else {
            self.eat(&TokenKind::Plus);
            false
        };
        let value = match self.peek_kind() {
            TokenKind::String(value) => value.clone(),
            _ => return Err(self.error_here("interval string")),
        };
        self.advance();
        let from = self.parse_interval_field()?;
        let to = if self.eat_word("TO") {
            Some(self.parse_interval_field()?)
        } else {
            None
        };
        Expr::interval(value, negative, from, to).map_err(|e| construction_error(e, start))
    }

    fn parse_interval_field(&mut self) -> Result<IntervalField> {
        let field = match self.peek_kind() {
            TokenKind::Identifier {
                value,
                delimited: false,
            } => match value.to_ascii_uppercase().as_str() {
                "YEAR" => Some(IntervalField::Year),
                "MONTH" => Some(IntervalField::Month),
                "DAY" => Some(IntervalField::Day),
                "HOUR" => Some(IntervalField::Hour),
                "MINUTE" => Some(IntervalField::Minute),
                "SECOND" => Some(IntervalField::Second),
                _ => None,
            },
            _ => None,
        };
        match field {
            Some(field) => {
                self.advance();
                Ok(field)
            }
            None => Err(self.error_here("interval field")),
        }
    }

    fn parse_function_call(&mut self, name: QualifiedName) -> Result<Expr> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut call = FunctionCall::new(name, vec![]);
        if !self.eat(&TokenKind::RightParen) {
            call.quantifier = self.parse_set_quantifier();
            call.args = self.parse_expression_list()?;
            if self.eat_keyword(Keyword::Order) {
                self.expect_keyword(Keyword::By)?;
                call.order_by = self.parse_order_terms()?;
            }
            self.expect(&TokenKind::RightParen, "')'")?;
        }

        if self.check_word("FILTER") && self.peek_at(1) == &TokenKind::LeftParen {
            self.advance();
            self.advance();
            self.expect_keyword(Keyword::Where)?;
            call.filter = Some(Box::new(self.parse_expression(LOWEST)?));
            self.expect(&TokenKind::RightParen, "')'")?;
        }

        if self.peek_at(1).is_word("NULLS") {
            if self.check_word("IGNORE") {
                call.null_treatment = Some(NullTreatment::Ignore);
            } else if self.check_word("RESPECT") {
                call.null_treatment = Some(NullTreatment::Respect);
            }
            if call.null_treatment.is_some() {
                self.advance();
                self.advance();
            }
        }

        if self.eat_word("OVER") {
            if self.eat(&TokenKind::LeftParen) {
                let spec = self.parse_window_spec()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                call.over = Some(Over::Spec(spec));
            } else {
                call.over = Some(Over::Named(self.parse_identifier()?));
            }
        }
        Ok(Expr::Function(call))
    }

    /// Parses the inside of `OVER (...)` or `WINDOW w AS (...)`.
    fn parse_window_spec(&mut self) -> Result<WindowSpec> {
        let mut spec = WindowSpec::default();
        let starts_clause = self.check_keyword(Keyword::Order)
            || (self.check_word("PARTITION") && self.peek_at(1).is_keyword(Keyword::By))
            || self.frame_units_ahead();
        if !starts_clause && matches!(self.peek_kind(), TokenKind::Identifier { .. }) {
            spec.existing = Some(self.parse_identifier()?);
        }
        if self.check_word("PARTITION") {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            spec.partition_by = self.parse_expression_list()?;
        }
        if self.eat_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            spec.order_by = self.parse_order_terms()?;
        }
        if self.frame_units_ahead() {
            spec.frame = Some(self.parse_window_frame()?);
        }
        Ok(spec)
    }

    fn frame_units_ahead(&self) -> bool {
        let kind = self.peek_kind();
        kind.is_word("ROWS") || kind.is_word("RANGE") || kind.is_word("GROUPS")
    }

    fn parse_window_frame(&mut self) -> Result<WindowFrame> {
        let units = if self.eat_word("ROWS") {
            FrameUnits::Rows
        } else if self.eat_word("RANGE") {
            FrameUnits::Range
        } else if self.eat_word("GROUPS") {
            FrameUnits::Groups
        } else {
            return Err(self.error_here("ROWS, RANGE or GROUPS"));
        };
        if self.eat_keyword(Keyword::Between) {
            let start = self.parse_frame_bound()?;
            self.expect_keyword(Keyword::And)?;
            let end = self.parse_frame_bound()?;
            Ok(WindowFrame {
                units,
                start,
                end: Some(end),
            })
        } else {
            Ok(WindowFrame {
                units,
                start: self.parse_frame_bound()?,
                end: None,
            })
        }
    }

    fn parse_frame_bound(&mut self) -> Result<FrameBound> {
        if self.eat_word("UNBOUNDED") {
            if self.eat_word("PRECEDING") {
                return Ok(FrameBound::UnboundedPreceding);
            }
            if self.eat_word("FOLLOWING") {
                return Ok(FrameBound::UnboundedFollowing);
            }
            return Err(self.error_here("PRECEDING or FOLLOWING"));
        }
        if self.check_word("CURRENT") && self.peek_at(1).is_word("ROW") {
            self.advance();
            self.advance();
            return Ok(FrameBound::CurrentRow);
        }
        let offset = Box::new(self.parse_expression(PREDICATE_OPERAND)?);
        if self.eat_word("PRECEDING") {
            Ok(FrameBound::Preceding(offset))
        } else if self.eat_word("FOLLOWING") {
            Ok(FrameBound::Following(offset))
        } else {
            Err(self.error_here("PRECEDING or FOLLOWING"))
        }
    }

    /// Parses a comma-separated list of at least one expression.
    fn parse_expression_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expression(LOWEST)?];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_expression(LOWEST)?);
        }
        Ok(exprs)
    }

    /// Parses `(a, b, ...)`, possibly empty.
    fn parse_parenthesized_list(&mut self) -> Result<Vec<Expr>> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        if self.eat(&TokenKind::RightParen) {
            return Ok(vec![]);
        }
        let exprs = self.parse_expression_list()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(exprs)
    }

    // ===================================================================
    // Data types
    // ===================================================================

    /// Parses a data type such as `DECIMAL(10,2)` or `ARRAY(ROW(x BIGINT))`.
    fn parse_data_type(&mut self) -> Result<DataType> {
        self.nested(|p| {
            let span = p.current_span();
            let word = match p.peek_kind() {
                TokenKind::Identifier {
                    value,
                    delimited: false,
                } => value.to_ascii_uppercase(),
                _ => return Err(p.error_here("data type")),
            };
            p.advance();

            let data_type = match word.as_str() {
                "BOOLEAN" => DataType::Boolean,
                "TINYINT" => DataType::Tinyint,
                "SMALLINT" => DataType::Smallint,
                "INTEGER" | "INT" => DataType::Integer,
                "BIGINT" => DataType::Bigint,
                "REAL" => DataType::Real,
                "DOUBLE" => {
                    p.eat_word("PRECISION");
                    DataType::Double
                }
                "DECIMAL" | "NUMERIC" => p.parse_decimal_parameters()?,
                "VARCHAR" => {
                    if p.check(&TokenKind::LeftParen) {
                        DataType::Varchar(Some(p.parse_length()?))
                    } else {
                        DataType::Varchar(None)
                    }
                }
                "CHAR" => {
                    if p.check(&TokenKind::LeftParen) {
                        DataType::Char(p.parse_length()?)
                    } else {
                        DataType::Char(1)
                    }
                }
                "VARBINARY" => DataType::Varbinary,
                "JSON" => DataType::Json,
                "DATE" => DataType::Date,
                "UNKNOWN" => DataType::Unknown,
                "TIME" => {
                    let (precision, with_time_zone) = p.parse_temporal_parameters()?;
                    DataType::Time {
                        precision,
                        with_time_zone,
                    }
                }
                "TIMESTAMP" => {
                    let (precision, with_time_zone) = p.parse_temporal_parameters()?;
                    DataType::Timestamp {
                        precision,
                        with_time_zone,
                    }
                }
                "INTERVAL" => {
                    let from = p.parse_interval_field()?;
                    if !p.eat_word("TO") {
                        return Err(p.error_here("TO"));
                    }
                    let to = p.parse_interval_field()?;
                    match (from, to) {
                        (IntervalField::Year, IntervalField::Month) => DataType::IntervalYearToMonth,
                        (IntervalField::Day, IntervalField::Second) => DataType::IntervalDayToSecond,
                        _ => {
                            return Err(ParseError::new(
                                format!(
                                    "Unsupported interval type {} TO {}",
                                    from.as_str(),
                                    to.as_str()
                                ),
                                span,
                            ))
                        }
                    }
                }
                "ARRAY" => {
                    if p.eat(&TokenKind::Lt) {
                        let element = p.parse_data_type()?;
                        p.expect(&TokenKind::Gt, "'>'")?;
                        DataType::array(element)
                    } else {
                        p.expect(&TokenKind::LeftParen, "'('")?;
                        let element = p.parse_data_type()?;
                        p.expect(&TokenKind::RightParen, "')'")?;
                        DataType::array(element)
                    }
                }
                "MAP" => {
                    p.expect(&TokenKind::LeftParen, "'('")?;
                    let key = p.parse_data_type()?;
                    p.expect(&TokenKind::Comma, "','")?;
                    let value = p.parse_data_type()?;
                    p.expect(&TokenKind::RightParen, "')'")?;
                    DataType::map(key, value)
                }
                "ROW" => {
                    p.expect(&TokenKind::LeftParen, "'('")?;
                    let mut fields = vec![p.parse_row_field()?];
                    while p.eat(&TokenKind::Comma) {
                        fields.push(p.parse_row_field()?);
                    }
                    p.expect(&TokenKind::RightParen, "')'")?;
                    DataType::Row(fields)
                }
                other => {
                    return Err(ParseError::new(format!("Unknown data type {other}"), span));
                }
            };
            Ok(data_type)
        })
    }

    /// A ROW field: `name type` or a bare `type`.
    fn parse_row_field(&mut self) -> Result<RowField> {
        let anonymous = self.attempt(|p| {
            let data_type = p.parse_data_type()?;
            if matches!(p.peek_kind(), TokenKind::Comma | TokenKind::RightParen) {
                Ok(data_type)
            } else {
                Err(p.error_here("',' or ')'"))
            }
        });
        if let Ok(data_type) = anonymous {
            return Ok(RowField::anonymous(data_type));
        }
        let name = self.parse_identifier()?;
        let data_type = self.parse_data_type()?;
        Ok(RowField::named(name.value, data_type))
    }

    fn parse_decimal_parameters(&mut self) -> Result<DataType> {
        if !self.check(&TokenKind::LeftParen) {
            return Ok(DataType::decimal(DEFAULT_DECIMAL_PRECISION, 0));
        }
        let span = self.current_span();
        self.advance();
        let precision = self.parse_type_parameter()?;
        let scale = if self.eat(&TokenKind::Comma) {
            self.parse_type_parameter()?
        } else {
            0
        };
        self.expect(&TokenKind::RightParen, "')'")?;
        let max = u32::from(MAX_DECIMAL_PRECISION);
        if precision == 0 || precision > max {
            return Err(ParseError::new(
                format!("DECIMAL precision must be between 1 and {max}"),
                span,
            ));
        }
        if scale > precision {
            return Err(ParseError::new(
                "DECIMAL scale must not exceed its precision",
                span,
            ));
        }
        // Both bounded by MAX_DECIMAL_PRECISION above.
        let (precision, scale) = (
            u8::try_from(precision).unwrap_or(MAX_DECIMAL_PRECISION),
            u8::try_from(scale).unwrap_or(MAX_DECIMAL_PRECISION),
        );
        Ok(DataType::decimal(precision, scale))
    }

    /// Parses `(n)` for VARCHAR and CHAR.
    fn parse_length(&mut self) -> Result<u32> {
        let span = self.current_span();
        self.expect(&TokenKind::LeftParen, "'('")?;
        let length = self.parse_type_parameter()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        if length == 0 || length > MAX_CHAR_LENGTH {
            return Err(ParseError::new(
                format!("Length must be between 1 and {MAX_CHAR_LENGTH}"),
                span,
            ));
        }
        Ok(length)
    }

    /// Parses `[(p)] [WITH TIME ZONE | WITHOUT TIME ZONE]`.
    fn parse_temporal_parameters(&mut self) -> Result<(u8, bool)> {
        let mut precision = DEFAULT_TIME_PRECISION;
        if self.check(&TokenKind::LeftParen) {
            let span = self.current_span();
            self.advance();
            let value = self.parse_type_parameter()?;
            self.expect(&TokenKind::RightParen, "')'")?;
            if value > MAX_TIME_PRECISION {
                return Err(ParseError::new(
                    format!("Time precision must be at most {MAX_TIME_PRECISION}"),
                    span,
                ));
            }
            precision = u8::try_from(value).unwrap_or(DEFAULT_TIME_PRECISION);
        }

        let with_time_zone = if self.check_keyword(Keyword::With)
            && self.peek_at(1).is_word("TIME")
        {
            self.advance();
            true
        } else if self.check_word("WITHOUT") && self.peek_at(1).is_word("TIME") {
            self.advance();
            false
        } else {
            return Ok((precision, false));
        };
        self.advance(); // TIME
        if !self.eat_word("ZONE") {
            return Err(self.error_here("ZONE"));
        }
        Ok((precision, with_time_zone))
    }

    fn parse_type_parameter(&mut self) -> Result<u32> {
        match self.peek_kind() {
            TokenKind::Integer(value) => {
                let span = self.current_span();
                let value = u32::try_from(*value)
                    .map_err(|_| ParseError::new("Type parameter out of range", span))?;
                self.advance();
                Ok(value)
            }
            _ => Err(self.error_here("integer type parameter")),
        }
    }

    // ===================================================================
    // Names
    // ===================================================================

    fn parse_identifier(&mut self) -> Result<Identifier> {
        match self.peek_kind() {
            TokenKind::Identifier {
                value,
                delimited: true,
            } => {
                let ident = Identifier::delimited(value.clone());
                self.advance();
                Ok(ident)
            }
            TokenKind::Identifier { value, .. } => {
                let ident = Identifier::new(value.clone());
                self.advance();
                Ok(ident)
            }
            _ => Err(self.error_here("identifier")),
        }
    }

    /// Parses `a.b.c`, stopping before a trailing `.*`.
    fn parse_qualified_name(&mut self) -> Result<QualifiedName> {
        let mut name = QualifiedName::single(self.parse_identifier()?);
        while self.check(&TokenKind::Dot)
            && matches!(self.peek_at(1), TokenKind::Identifier { .. })
        {
            self.advance();
            name = name.child(self.parse_identifier()?);
        }
        Ok(name)
    }

    /// Parses `(a, b, ...)` of identifiers.
    fn parse_identifier_list(&mut self) -> Result<Vec<Identifier>> {
        self.expect(&TokenKind::LeftParen, "'('")?;
        let mut idents = vec![self.parse_identifier()?];
        while self.eat(&TokenKind::Comma) {
            idents.push(self.parse_identifier()?);
        }
        self.expect(&TokenKind::RightParen, "')'")?;
        Ok(idents)
    }

    // ===================================================================
    // Lookahead
    // ===================================================================

    /// Returns true if `(`s are followed by the start of a query.
    fn query_ahead(&self) -> bool {
        let mut offset = 0;
        while self.peek_at(offset) == &TokenKind::LeftParen {
            offset += 1;
        }
        offset > 0
            && matches!(
                self.peek_at(offset),
                TokenKind::Keyword(
                    Keyword::Select | Keyword::With | Keyword::Values | Keyword::Table
                )
            )
    }

    /// Returns true at `(x, y) ->`.
    fn lambda_parameters_ahead(&self) -> bool {
        if self.peek_kind() != &TokenKind::LeftParen {
            return false;
        }
        let mut offset = 1;
        loop {
            if !matches!(self.peek_at(offset), TokenKind::Identifier { .. }) {
                return false;
            }
            match self.peek_at(offset + 1) {
                TokenKind::Comma => offset += 2,
                TokenKind::RightParen => return self.peek_at(offset + 2) == &TokenKind::Arrow,
                _ => return false,
            }
        }
    }

    /// Returns true at `t.*` or `s.t.*`.
    fn qualified_wildcard_ahead(&self) -> bool {
        let mut offset = 0;
        while matches!(self.peek_at(offset), TokenKind::Identifier { .. })
            && self.peek_at(offset + 1) == &TokenKind::Dot
        {
            if self.peek_at(offset + 2) == &TokenKind::Star {
                return true;
            }
            offset += 2;
        }
        false
    }

    fn predicate_ahead(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Is | Keyword::Like | Keyword::Between | Keyword::In) => {
                true
            }
            TokenKind::Keyword(Keyword::Not) => matches!(
                self.peek_at(1),
                TokenKind::Keyword(Keyword::Like | Keyword::Between | Keyword::In)
            ),
            _ => false,
        }
    }

    // ===================================================================
    // Token helpers
    // ===================================================================

    fn peek(&self) -> &Token {
        // The token list always ends with Eof.
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)].kind
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn advance(&mut self) {
        if !self.peek().is_eof() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek_kind().is_keyword(keyword)
    }

    fn check_word(&self, word: &str) -> bool {
        self.peek_kind().is_word(word)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let matched = self.check(kind);
        if matched {
            self.advance();
        }
        matched
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        let matched = self.check_keyword(keyword);
        if matched {
            self.advance();
        }
        matched
    }

    fn eat_word(&mut self, word: &str) -> bool {
        let matched = self.check_word(word);
        if matched {
            self.advance();
        }
        matched
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_here(expected))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error_here(keyword.as_str()))
        }
    }

    fn error_here(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::unexpected(expected, token.kind.clone(), token.span)
    }

    /// Runs `f` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new(
                "Query is nested too deeply",
                self.current_span(),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Runs `f` speculatively, rewinding if it fails.
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let checkpoint = Checkpoint {
            pos: self.pos,
            param_counter: self.param_counter,
        };
        let result = f(self);
        if let Err(error) = &result {
            trace!(
                at = self.current_span().start,
                source = %self.current_span().slice(self.input),
                %error,
                "rewinding speculative parse"
            );
            self.pos = checkpoint.pos;
            self.param_counter = checkpoint.param_counter;
        }
        result
    }
}

fn set_query(operator: SetOperator, all: bool, left: Query, right: Query) -> Query {
    let mut operation = SetOperation::new(operator, left, right);
    if all {
        operation = operation.all();
    }
    Query::new(QueryBody::SetOperation(operation))
}

/// A parenthesized query in FROM: bare VALUES lists and set operations
/// become their own relation kinds.
fn relation_from_query(query: Query) -> Relation {
    if query.has_modifiers() {
        return Relation::query(query);
    }
    match query.body {
        QueryBody::Values(values) => Relation::Values(values),
        QueryBody::SetOperation(operation) => Relation::SetOperation(operation),
        body => Relation::query(Query::new(body)),
    }
}

fn construction_error(error: ConstructionError, span: Span) -> ParseError {
    ParseError::new(error.to_string(), span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqltree_core::ast::{BinaryOp, UnaryOp};

    fn query(sql: &str) -> Query {
        Parser::new(sql).parse_query_statement().unwrap()
    }

    fn expr(sql: &str) -> Expr {
        Parser::new(sql).parse_expression_statement().unwrap()
    }

    fn data_type(sql: &str) -> DataType {
        Parser::new(sql).parse_data_type_statement().unwrap()
    }

    fn select(query: &Query) -> &Select {
        match &query.body {
            QueryBody::Select(select) => select,
            other => panic!("expected SELECT, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_select() {
        let query = query("SELECT id, name FROM users");
        let select = select(&query);
        assert_eq!(select.items.len(), 2);
        assert_eq!(select.from, vec![Relation::table(QualifiedName::single("users"))]);
    }

    #[test]
    fn test_expression_precedence() {
        let parsed = expr("1 + 2 * 3");
        assert_eq!(
            parsed,
            Expr::integer(1).add(Expr::integer(2).mul(Expr::integer(3)))
        );

        let parsed = expr("a OR b AND NOT c = d");
        let expected = Expr::column("a").or(Expr::column("b").and(
            Expr::column("c").eq(Expr::column("d")).not(),
        ));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_left_associative_subtraction() {
        assert_eq!(
            expr("10 - 4 - 3"),
            Expr::integer(10).sub(Expr::integer(4)).sub(Expr::integer(3))
        );
    }

    #[test]
    fn test_chained_comparison_rejected() {
        let err = Parser::new("a = b = c")
            .parse_expression_statement()
            .unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("a parenthesized comparison"));
        assert!(Parser::new("(a = b) = c").parse_expression_statement().is_ok());
    }

    #[test]
    fn test_unary_minus_is_not_folded() {
        assert_eq!(
            expr("-5"),
            Expr::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(Expr::integer(5)),
            }
        );
        assert_eq!(expr("-a[1]"), Expr::column("a").subscript(Expr::integer(1)).neg());
    }

    #[test]
    fn test_predicates() {
        assert_eq!(expr("a IS NOT NULL"), Expr::column("a").is_not_null());
        assert_eq!(
            expr("a + 1 NOT BETWEEN 1 AND 10"),
            Expr::column("a")
                .add(Expr::integer(1))
                .not_between(Expr::integer(1), Expr::integer(10))
        );
        assert_eq!(
            expr("x NOT LIKE 'a%' ESCAPE '!'"),
            Expr::Like {
                expr: Box::new(Expr::column("x")),
                pattern: Box::new(Expr::string("a%")),
                escape: Some(Box::new(Expr::string("!"))),
                negated: true,
            }
        );
        assert_eq!(
            expr("a IS DISTINCT FROM b"),
            Expr::column("a").is_distinct_from(Expr::column("b"))
        );
    }

    #[test]
    fn test_in_list_and_subquery() {
        assert_eq!(
            expr("a IN (1, 2)"),
            Expr::column("a")
                .in_list(vec![Expr::integer(1), Expr::integer(2)])
                .unwrap()
        );
        assert!(matches!(
            expr("a NOT IN (SELECT b FROM t)"),
            Expr::InSubquery { negated: true, .. }
        ));
        assert!(Parser::new("a IN ()").parse_expression_statement().is_err());
    }

    #[test]
    fn test_parameters_are_numbered() {
        let parsed = expr("a = ? AND b = ?");
        let Expr::Binary { left, right, .. } = parsed else {
            panic!("expected AND");
        };
        assert!(matches!(*left, Expr::Binary { ref right, .. } if **right == Expr::Parameter(1)));
        assert!(matches!(*right, Expr::Binary { ref right, .. } if **right == Expr::Parameter(2)));
    }

    #[test]
    fn test_function_call_clauses() {
        let parsed = expr(
            "count(DISTINCT x ORDER BY y DESC) FILTER (WHERE x > 0) \
             IGNORE NULLS OVER (PARTITION BY g ORDER BY y ROWS BETWEEN 1 PRECEDING AND CURRENT ROW)",
        );
        let Expr::Function(call) = parsed else {
            panic!("expected a function call");
        };
        assert_eq!(call.quantifier, Some(SetQuantifier::Distinct));
        assert_eq!(call.order_by, vec![OrderTerm::desc(Expr::column("y"))]);
        assert!(call.filter.is_some());
        assert_eq!(call.null_treatment, Some(NullTreatment::Ignore));
        let Some(Over::Spec(spec)) = call.over else {
            panic!("expected a window spec");
        };
        assert_eq!(spec.partition_by, vec![Expr::column("g")]);
        assert_eq!(
            spec.frame,
            Some(WindowFrame {
                units: FrameUnits::Rows,
                start: FrameBound::Preceding(Box::new(Expr::integer(1))),
                end: Some(FrameBound::CurrentRow),
            })
        );
    }

    #[test]
    fn test_niladic_and_wildcard_calls() {
        assert_eq!(
            expr("current_date"),
            Expr::Function(FunctionCall::new(QualifiedName::single("current_date"), vec![]))
        );
        assert_eq!(
            expr("count(t.*)"),
            Expr::function("count", vec![Expr::Wildcard(Some(QualifiedName::single("t")))])
        );
    }

    #[test]
    fn test_constructors_and_postfix() {
        assert_eq!(
            expr("ARRAY[1, 2][1]"),
            Expr::Array(vec![Expr::integer(1), Expr::integer(2)]).subscript(Expr::integer(1))
        );
        assert_eq!(expr("ROW (1)"), Expr::Row(vec![Expr::integer(1)]));
        assert_eq!(
            expr("(1, 'a')"),
            Expr::Row(vec![Expr::integer(1), Expr::string("a")])
        );
        assert_eq!(expr("(\"r\").\"f\""), Expr::column(Identifier::delimited("r")).field(Identifier::delimited("f")));
    }

    #[test]
    fn test_lambdas() {
        assert_eq!(
            expr("x -> x + 1"),
            Expr::lambda(vec![Identifier::new("x")], Expr::column("x").add(Expr::integer(1)))
                .unwrap()
        );
        let parsed = expr("reduce(a, 0, (s, x) -> s + x, s -> s)");
        let Expr::Function(call) = parsed else {
            panic!("expected a function call");
        };
        assert!(matches!(&call.args[2], Expr::Lambda { params, .. } if params.len() == 2));
        assert!(Parser::new("(x, x) -> 1").parse_expression_statement().is_err());
    }

    #[test]
    fn test_literals() {
        assert_eq!(expr("1.50"), Expr::decimal("1.50"));
        assert_eq!(expr("1.5E0"), Expr::double(1.5));
        assert_eq!(expr("X'0AFF'"), Expr::Literal(Literal::Binary(vec![0x0a, 0xff])));
        assert_eq!(expr("DATE '2021-01-01'"), Expr::typed_literal("DATE", "2021-01-01"));
        assert_eq!(
            expr("INTERVAL -'1-2' YEAR TO MONTH"),
            Expr::interval("1-2", true, IntervalField::Year, Some(IntervalField::Month)).unwrap()
        );
        assert!(Parser::new("INTERVAL '1' DAY TO YEAR")
            .parse_expression_statement()
            .is_err());
    }

    #[test]
    fn test_case_and_cast() {
        assert!(matches!(
            expr("CASE x WHEN 1 THEN 'a' ELSE 'b' END"),
            Expr::Case { operand: Some(_), .. }
        ));
        assert_eq!(
            expr("TRY_CAST(x AS DECIMAL(10, 2))"),
            Expr::column("x").try_cast(DataType::decimal(10, 2))
        );
        assert!(Parser::new("CASE END").parse_expression_statement().is_err());
    }

    #[test]
    fn test_data_types() {
        assert_eq!(data_type("decimal"), DataType::decimal(38, 0));
        assert_eq!(data_type("CHAR"), DataType::Char(1));
        assert_eq!(data_type("timestamp(6) with time zone"), DataType::Timestamp {
            precision: 6,
            with_time_zone: true,
        });
        assert_eq!(data_type("TIME"), DataType::Time {
            precision: 3,
            with_time_zone: false,
        });
        assert_eq!(
            data_type("MAP(VARCHAR, ARRAY(BIGINT))"),
            DataType::map(DataType::varchar(), DataType::array(DataType::Bigint))
        );
        assert_eq!(
            data_type("ROW(\"a\" BIGINT, date DATE, DOUBLE)"),
            DataType::Row(vec![
                RowField::named("a", DataType::Bigint),
                RowField::named("date", DataType::Date),
                RowField::anonymous(DataType::Double),
            ])
        );
        assert_eq!(data_type("INTERVAL DAY TO SECOND"), DataType::IntervalDayToSecond);
    }

    #[test]
    fn test_invalid_data_types() {
        for sql in ["DECIMAL(0)", "DECIMAL(39,1)", "DECIMAL(5,6)", "VARCHAR(0)", "TIME(13)", "BLOB"] {
            assert!(
                Parser::new(sql).parse_data_type_statement().is_err(),
                "{sql} should be rejected"
            );
        }
    }

    #[test]
    fn test_joins() {
        let query = query(
            "SELECT * FROM a LEFT OUTER JOIN b USING (id) CROSS JOIN c NATURAL FULL JOIN d",
        );
        let Relation::Join(outer) = &select(&query).from[0] else {
            panic!("expected a join");
        };
        assert_eq!(outer.join_type, JoinType::Full);
        assert_eq!(outer.criteria, JoinCriteria::Natural);
        let Relation::Join(middle) = outer.left.as_ref() else {
            panic!("expected a nested join");
        };
        assert_eq!(middle.join_type, JoinType::Cross);
    }

    #[test]
    fn test_join_requires_criteria() {
        let err = Parser::new("SELECT * FROM a JOIN b")
            .parse_query_statement()
            .unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("ON or USING"));
    }

    #[test]
    fn test_relation_forms() {
        let query = query(
            "SELECT * FROM (VALUES 1, 2) AS v (x), UNNEST(ARRAY[1]) WITH ORDINALITY, \
             LATERAL (SELECT 1), t TABLESAMPLE BERNOULLI (10)",
        );
        let from = &select(&query).from;
        assert!(matches!(&from[0], Relation::Aliased(a) if matches!(*a.relation, Relation::Values(_))));
        assert!(matches!(&from[1], Relation::Unnest(u) if u.with_ordinality));
        assert!(matches!(&from[2], Relation::Lateral(_)));
        assert!(matches!(&from[3], Relation::TableSample(_)));
    }

    #[test]
    fn test_parenthesized_join() {
        let query = query("SELECT * FROM a JOIN (b CROSS JOIN c) ON TRUE");
        let Relation::Join(join) = &select(&query).from[0] else {
            panic!("expected a join");
        };
        assert!(matches!(join.right.as_ref(), Relation::Join(_)));
    }

    #[test]
    fn test_set_operations() {
        let parsed = query("SELECT 1 UNION ALL SELECT 2 INTERSECT SELECT 3");
        let QueryBody::SetOperation(union) = &parsed.body else {
            panic!("expected a set operation");
        };
        assert_eq!(union.operator, SetOperator::Union);
        assert_eq!(union.quantifier, SetQuantifier::All);
        assert!(matches!(
            &union.right.body,
            QueryBody::SetOperation(op) if op.operator == SetOperator::Intersect
        ));
    }

    #[test]
    fn test_query_modifiers() {
        let parsed = query("WITH RECURSIVE r (n) AS (SELECT 1) SELECT n FROM r ORDER BY n DESC NULLS LAST OFFSET 2 LIMIT ALL");
        let with = parsed.with.as_ref().unwrap();
        assert!(with.recursive);
        assert_eq!(with.ctes[0].columns, vec![Identifier::new("n")]);
        assert_eq!(
            parsed.order_by,
            vec![OrderTerm::desc(Expr::column("n")).nulls(NullOrdering::Last)]
        );
        assert_eq!(parsed.offset, Some(2));
        assert_eq!(parsed.limit, Some(Limit::All));
    }

    #[test]
    fn test_nested_modifiers() {
        let parsed = query("(SELECT 1 LIMIT 1) ORDER BY 1");
        assert!(matches!(parsed.body, QueryBody::Nested(_)));
        let unwrapped = query("(SELECT 1) LIMIT 1");
        assert!(matches!(unwrapped.body, QueryBody::Select(_)));
    }

    #[test]
    fn test_grouping_and_windows() {
        let parsed = query(
            "SELECT a, sum(b) OVER w FROM t GROUP BY DISTINCT ROLLUP (a), \
             GROUPING SETS ((a, b), (), c) HAVING sum(b) > 1 WINDOW w AS (PARTITION BY a)",
        );
        let select = select(&parsed);
        let group_by = select.group_by.as_ref().unwrap();
        assert_eq!(group_by.quantifier, Some(SetQuantifier::Distinct));
        assert_eq!(
            group_by.elements[1],
            GroupingElement::GroupingSets(vec![
                vec![Expr::column("a"), Expr::column("b")],
                vec![],
                vec![Expr::column("c")],
            ])
        );
        assert_eq!(select.windows[0].name, Identifier::new("w"));
    }

    #[test]
    fn test_select_items() {
        let parsed = query("SELECT *, t.* AS (x, y), a + 1 AS b, c d FROM t");
        let items = &select(&parsed).items;
        assert_eq!(items[0], SelectItem::wildcard());
        assert_eq!(
            items[1],
            SelectItem::Wildcard {
                qualifier: Some(QualifiedName::single("t")),
                aliases: vec![Identifier::new("x"), Identifier::new("y")],
            }
        );
        assert_eq!(items[3], SelectItem::aliased(Expr::column("c"), "d"));
    }

    #[test]
    fn test_subquery_expressions() {
        assert!(matches!(expr("(SELECT 1)"), Expr::Subquery(_)));
        assert!(matches!(
            expr("((SELECT 1) + 1)"),
            Expr::Binary { op: BinaryOp::Add, .. }
        ));
        assert!(matches!(expr("EXISTS (SELECT 1)"), Expr::Exists(_)));
    }

    #[test]
    fn test_trailing_input_rejected() {
        assert!(Parser::new("SELECT 1;").parse_query_statement().is_ok());
        let err = Parser::new("SELECT 1 SELECT 2")
            .parse_query_statement()
            .unwrap_err();
        assert_eq!(err.span.start, 9);
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let sql = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        let err = Parser::new(&sql).parse_expression_statement().unwrap_err();
        assert_eq!(err.message, "Query is nested too deeply");
    }
}
