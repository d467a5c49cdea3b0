//! Token types for the SQL lexer.

use core::fmt;

use super::Span;

/// Reserved words.
///
/// Only words that can never name a column or table are keywords. Contextual
/// words such as `DESC`, `OVER` or `INTERVAL` are lexed as identifiers and
/// recognized by the parser from their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Query clauses
    Select,
    From,
    Where,
    Group,
    Having,
    Order,
    By,
    Limit,
    Offset,
    Window,
    With,
    Values,
    Table,
    Distinct,
    All,
    As,

    // Set operations
    Union,
    Intersect,
    Except,

    // Joins
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Natural,
    On,
    Using,
    Lateral,
    Unnest,
    Tablesample,

    // Predicates and logic
    And,
    Or,
    Not,
    In,
    Is,
    Like,
    Between,
    Exists,
    Null,
    True,
    False,

    // Expressions
    Case,
    When,
    Then,
    Else,
    End,
    Cast,
}

impl Keyword {
    /// Looks up a reserved word, ignoring case.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let keyword = match s.to_ascii_uppercase().as_str() {
            "SELECT" => Self::Select,
            "FROM" => Self::From,
            "WHERE" => Self::Where,
            "GROUP" => Self::Group,
            "HAVING" => Self::Having,
            "ORDER" => Self::Order,
            "BY" => Self::By,
            "LIMIT" => Self::Limit,
            "OFFSET" => Self::Offset,
            "WINDOW" => Self::Window,
            "WITH" => Self::With,
            "VALUES" => Self::Values,
            "TABLE" => Self::Table,
            "DISTINCT" => Self::Distinct,
            "ALL" => Self::All,
            "AS" => Self::As,
            "UNION" => Self::Union,
            "INTERSECT" => Self::Intersect,
            "EXCEPT" => Self::Except,
            "JOIN" => Self::Join,
            "INNER" => Self::Inner,
            "LEFT" => Self::Left,
            "RIGHT" => Self::Right,
            "FULL" => Self::Full,
            "OUTER" => Self::Outer,
            "CROSS" => Self::Cross,
            "NATURAL" => Self::Natural,
            "ON" => Self::On,
            "USING" => Self::Using,
            "LATERAL" => Self::Lateral,
            "UNNEST" => Self::Unnest,
            "TABLESAMPLE" => Self::Tablesample,
            "AND" => Self::And,
            "OR" => Self::Or,
            "NOT" => Self::Not,
            "IN" => Self::In,
            "IS" => Self::Is,
            "LIKE" => Self::Like,
            "BETWEEN" => Self::Between,
            "EXISTS" => Self::Exists,
            "NULL" => Self::Null,
            "TRUE" => Self::True,
            "FALSE" => Self::False,
            "CASE" => Self::Case,
            "WHEN" => Self::When,
            "THEN" => Self::Then,
            "ELSE" => Self::Else,
            "END" => Self::End,
            "CAST" => Self::Cast,
            _ => return None,
        };
        Some(keyword)
    }

    /// Returns the keyword as written in SQL.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Group => "GROUP",
            Self::Having => "HAVING",
            Self::Order => "ORDER",
            Self::By => "BY",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Window => "WINDOW",
            Self::With => "WITH",
            Self::Values => "VALUES",
            Self::Table => "TABLE",
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
            Self::As => "AS",
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
            Self::Join => "JOIN",
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Outer => "OUTER",
            Self::Cross => "CROSS",
            Self::Natural => "NATURAL",
            Self::On => "ON",
            Self::Using => "USING",
            Self::Lateral => "LATERAL",
            Self::Unnest => "UNNEST",
            Self::Tablesample => "TABLESAMPLE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Is => "IS",
            Self::Like => "LIKE",
            Self::Between => "BETWEEN",
            Self::Exists => "EXISTS",
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Case => "CASE",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::End => "END",
            Self::Cast => "CAST",
        }
    }
}

/// Token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal that fits a BIGINT.
    Integer(i64),
    /// Exact numeric literal, kept as written.
    Decimal(String),
    /// Numeric literal with an exponent.
    Double(f64),
    /// String literal, unescaped.
    String(String),
    /// Binary literal (X'...').
    Binary(Vec<u8>),

    /// A name or contextual word. `delimited` is set for `"quoted"` names.
    Identifier { value: String, delimited: bool },
    /// A reserved word.
    Keyword(Keyword),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `||`
    Concat,
    /// `->`
    Arrow,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Semicolon,
    /// `?` parameter placeholder.
    Question,

    /// End of input.
    Eof,
    /// A lexing failure, with its message.
    Error(String),
}

impl TokenKind {
    /// Returns true if this is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Self::Keyword(k) if *k == keyword)
    }

    /// Returns true if this is the undelimited word `word`, ignoring case.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Self::Identifier { value, delimited: false } if value.eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(text) => f.write_str(text),
            Self::Double(value) => write!(f, "{value:E}"),
            Self::String(_) => f.write_str("string literal"),
            Self::Binary(_) => f.write_str("binary literal"),
            Self::Identifier {
                value,
                delimited: true,
            } => write!(f, "\"{value}\""),
            Self::Identifier { value, .. } => f.write_str(value),
            Self::Keyword(keyword) => f.write_str(keyword.as_str()),
            Self::Plus => f.write_str("'+'"),
            Self::Minus => f.write_str("'-'"),
            Self::Star => f.write_str("'*'"),
            Self::Slash => f.write_str("'/'"),
            Self::Percent => f.write_str("'%'"),
            Self::Eq => f.write_str("'='"),
            Self::NotEq => f.write_str("'<>'"),
            Self::Lt => f.write_str("'<'"),
            Self::LtEq => f.write_str("'<='"),
            Self::Gt => f.write_str("'>'"),
            Self::GtEq => f.write_str("'>='"),
            Self::Concat => f.write_str("'||'"),
            Self::Arrow => f.write_str("'->'"),
            Self::LeftParen => f.write_str("'('"),
            Self::RightParen => f.write_str("')'"),
            Self::LeftBracket => f.write_str("'['"),
            Self::RightBracket => f.write_str("']'"),
            Self::Comma => f.write_str("','"),
            Self::Dot => f.write_str("'.'"),
            Self::Semicolon => f.write_str("';'"),
            Self::Question => f.write_str("'?'"),
            Self::Eof => f.write_str("end of input"),
            Self::Error(message) => f.write_str(message),
        }
    }
}

/// A token with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// Where it was found.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}
