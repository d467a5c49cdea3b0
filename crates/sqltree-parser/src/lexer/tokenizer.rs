//! SQL tokenizer.

use super::{Keyword, Span, Token, TokenKind};

/// A lexer that tokenizes SQL input.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the character after the current one.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes `expected` if it is the current character.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            // -- line comment
            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            /* block comment */
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    fn error(&self, message: impl Into<String>) -> Token {
        self.make_token(TokenKind::Error(message.into()))
    }

    /// Scans a bare word: a reserved keyword or an identifier.
    fn scan_word(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = &self.input[self.start..self.pos];
        match Keyword::from_str(text) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_token(TokenKind::Identifier {
                value: String::from(text),
                delimited: false,
            }),
        }
    }

    /// Scans the body of a quoted token whose opening `quote` was consumed,
    /// folding doubled quotes into one.
    fn scan_quoted(&mut self, quote: char) -> Option<String> {
        let mut value = String::new();
        loop {
            match self.advance()? {
                c if c == quote => {
                    if self.eat(quote) {
                        value.push(quote);
                    } else {
                        return Some(value);
                    }
                }
                c => value.push(c),
            }
        }
    }

    fn scan_delimited_identifier(&mut self) -> Token {
        match self.scan_quoted('"') {
            Some(value) if value.is_empty() => self.error("Zero-length delimited identifier"),
            Some(value) => self.make_token(TokenKind::Identifier {
                value,
                delimited: true,
            }),
            None => self.error("Unterminated quoted identifier"),
        }
    }

    fn scan_string(&mut self) -> Token {
        match self.scan_quoted('\'') {
            Some(value) => self.make_token(TokenKind::String(value)),
            None => self.error("Unterminated string literal"),
        }
    }

    /// Scans `X'0AFF'` after the `X` was consumed.
    fn scan_binary(&mut self) -> Token {
        self.advance(); // opening quote
        let Some(text) = self.scan_quoted('\'') else {
            return self.error("Unterminated binary literal");
        };
        let digits: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        if !digits.iter().all(char::is_ascii_hexdigit) {
            return self.error("Invalid character in binary literal");
        }
        if digits.len() % 2 != 0 {
            return self.error("Odd number of hex digits in binary literal");
        }
        let bytes = digits
            .chunks(2)
            .map(|pair| {
                let hex: String = pair.iter().collect();
                u8::from_str_radix(&hex, 16)
            })
            .collect::<Result<Vec<u8>, _>>();
        match bytes {
            Ok(bytes) => self.make_token(TokenKind::Binary(bytes)),
            Err(e) => self.error(format!("Invalid binary literal: {e}")),
        }
    }

    /// Scans a number whose first character was consumed.
    fn scan_number(&mut self, first: char) -> Token {
        let mut has_point = first == '.';
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if !has_point
            && self.peek() == Some('.')
            && !self
                .peek_next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '.')
        {
            has_point = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let mut has_exponent = false;
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            let rest = &self.input[self.pos + 1..];
            let digits_follow = rest
                .strip_prefix(&['+', '-'][..])
                .unwrap_or(rest)
                .starts_with(|c: char| c.is_ascii_digit());
            if digits_follow {
                has_exponent = true;
                self.advance();
                if self.peek().is_some_and(|c| c == '+' || c == '-') {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.input[self.start..self.pos];
        if has_exponent {
            match text.parse::<f64>() {
                Ok(value) => self.make_token(TokenKind::Double(value)),
                Err(e) => self.error(format!("Invalid double literal: {e}")),
            }
        } else if has_point {
            self.make_token(TokenKind::Decimal(String::from(text)))
        } else {
            // Integers beyond BIGINT stay exact.
            match text.parse::<i64>() {
                Ok(value) => self.make_token(TokenKind::Integer(value)),
                Err(_) => self.make_token(TokenKind::Decimal(String::from(text))),
            }
        }
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            '[' => self.make_token(TokenKind::LeftBracket),
            ']' => self.make_token(TokenKind::RightBracket),
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            '+' => self.make_token(TokenKind::Plus),
            '*' => self.make_token(TokenKind::Star),
            '/' => self.make_token(TokenKind::Slash),
            '%' => self.make_token(TokenKind::Percent),
            '?' => self.make_token(TokenKind::Question),
            '=' => self.make_token(TokenKind::Eq),
            '-' => {
                if self.eat('>') {
                    self.make_token(TokenKind::Arrow)
                } else {
                    self.make_token(TokenKind::Minus)
                }
            }
            '<' => {
                if self.eat('=') {
                    self.make_token(TokenKind::LtEq)
                } else if self.eat('>') {
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.make_token(TokenKind::Lt)
                }
            }
            '>' => {
                if self.eat('=') {
                    self.make_token(TokenKind::GtEq)
                } else {
                    self.make_token(TokenKind::Gt)
                }
            }
            '!' => {
                if self.eat('=') {
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.error("Unexpected character '!'")
                }
            }
            '|' => {
                if self.eat('|') {
                    self.make_token(TokenKind::Concat)
                } else {
                    self.error("Unexpected character '|'")
                }
            }
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(c),
            '.' => self.make_token(TokenKind::Dot),
            '\'' => self.scan_string(),
            '"' => self.scan_delimited_identifier(),
            'x' | 'X' if self.peek() == Some('\'') => self.scan_binary(),
            c if c.is_ascii_digit() => self.scan_number(c),
            c if c.is_alphabetic() || c == '_' => self.scan_word(),
            c => self.error(format!("Unexpected character '{c}'")),
        }
    }

    /// Tokenizes the whole input. The last token is always [`TokenKind::Eof`].
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize()
    }

    fn token_kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    fn ident(value: &str) -> TokenKind {
        TokenKind::Identifier {
            value: String::from(value),
            delimited: false,
        }
    }

    #[test]
    fn test_empty_input() {
        let tokens = tokenize("   \n\t  ");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
    }

    #[test]
    fn test_keywords_and_words() {
        assert_eq!(
            token_kinds("select x FROM t order BY x desc"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                ident("x"),
                TokenKind::Keyword(Keyword::From),
                ident("t"),
                TokenKind::Keyword(Keyword::Order),
                TokenKind::Keyword(Keyword::By),
                ident("x"),
                ident("desc"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            token_kinds("a -- trailing\n/* block\n comment */ b"),
            vec![ident("a"), ident("b"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_delimited_identifier() {
        assert_eq!(
            token_kinds(r#""Order ""Id""""#),
            vec![
                TokenKind::Identifier {
                    value: String::from("Order \"Id\""),
                    delimited: true,
                },
                TokenKind::Eof,
            ]
        );
        assert!(matches!(token_kinds("\"\"")[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_string_and_binary_literals() {
        assert_eq!(
            token_kinds("'it''s' X'0aFF'"),
            vec![
                TokenKind::String(String::from("it's")),
                TokenKind::Binary(vec![0x0a, 0xff]),
                TokenKind::Eof,
            ]
        );
        assert!(matches!(token_kinds("X'ABC'")[0], TokenKind::Error(_)));
        assert!(matches!(token_kinds("'open")[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            token_kinds("42 1.50 .5 1.5E0 2e-3 99999999999999999999"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Decimal(String::from("1.50")),
                TokenKind::Decimal(String::from(".5")),
                TokenKind::Double(1.5),
                TokenKind::Double(0.002),
                TokenKind::Decimal(String::from("99999999999999999999")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            token_kinds("<> != <= >= || -> - [ ] ?"),
            vec![
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Concat,
                TokenKind::Arrow,
                TokenKind::Minus,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Question,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("SELECT  \"a\"");
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].span, Span::new(8, 11));
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            token_kinds("a # b")[1],
            TokenKind::Error(String::from("Unexpected character '#'"))
        );
    }
}
