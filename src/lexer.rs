use thiserror::Error;

use crate::ast::{LOGICAL_KEYWORDS, OPERATOR_KEYWORDS, SpannedToken, Token};
use crate::value::{Scalar, Value};

/// Characters of context kept on each side of a lexical error.
const CONTEXT_RADIUS: usize = 10;

/// Byte offset into the query string.
pub type Position = usize;

/// A lexical error: the input could not be split into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Tokenization error at position {position}: {message} (near \"{context}\")")]
pub struct LexError {
    pub message: String,
    pub position: Position,
    /// Up to ten characters either side of `position`
    pub context: String,
}

pub struct Lexer {
    /// Characters paired with their byte offsets
    input: Vec<(usize, char)>,
    len: usize,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.char_indices().collect(),
            len: input.len(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).map(|&(_, c)| c)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).map(|&(_, c)| c)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Byte offset of the character at `index`, or the input length past the end.
    fn byte_offset(&self, index: usize) -> Position {
        self.input.get(index).map(|&(b, _)| b).unwrap_or(self.len)
    }

    fn error_at(&self, index: usize, message: impl Into<String>) -> LexError {
        let start = index.saturating_sub(CONTEXT_RADIUS);
        let end = (index + CONTEXT_RADIUS).min(self.input.len());
        let context = self.input[start.min(end)..end]
            .iter()
            .map(|&(_, c)| c)
            .collect();
        LexError {
            message: message.into(),
            position: self.byte_offset(index),
            context,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_word_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    fn is_identifier_char(ch: char) -> bool {
        Self::is_word_char(ch) || matches!(ch, '.' | '[' | ']')
    }

    /// Whether `word` appears at the cursor and is not followed by a word
    /// character. Does not consume.
    fn matches_keyword(&self, word: &str, ignore_case: bool) -> bool {
        let mut count = 0;
        for expected in word.chars() {
            match self.peek_char(count) {
                Some(ch) if ch == expected => {}
                Some(ch) if ignore_case && ch.to_ascii_lowercase() == expected => {}
                _ => return false,
            }
            count += 1;
        }
        !self.peek_char(count).is_some_and(Self::is_word_char)
    }

    fn consume(&mut self, count: usize) {
        self.position += count;
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if Self::is_identifier_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('\\') => result.push('\\'),
                        Some(c) if c == quote => result.push(c),
                        Some(c) => {
                            return Err(self.error_at(
                                self.position,
                                format!("Invalid escape sequence: \\{}", c),
                            ));
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error_at(start, "Unterminated string: missing closing quote"))
    }

    fn read_number(&mut self) -> Result<Scalar, LexError> {
        let start = self.position;
        let mut number = String::new();

        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() || ch == '.' {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let dots = number.matches('.').count();
        let malformed = dots > 1
            || number.ends_with('.')
            || number.trim_start_matches('-').starts_with('.')
            || self.current_char().is_some_and(Self::is_word_char);
        if malformed {
            return Err(self.error_at(start, format!("Invalid number '{}'", number)));
        }

        if dots == 0 {
            if let Ok(n) = number.parse::<i64>() {
                return Ok(Scalar::Integer(n));
            }
        }
        number
            .parse::<f64>()
            .map(Scalar::Float)
            .map_err(|_| self.error_at(start, format!("Invalid number '{}'", number)))
    }

    /// Speculatively reads `true`, `false` or `null` (any case). Resets the
    /// cursor and returns `None` when the word is something else.
    fn read_word_literal(&mut self) -> Option<Scalar> {
        let saved = self.position;
        for (word, scalar) in [
            ("true", Scalar::Boolean(true)),
            ("false", Scalar::Boolean(false)),
            ("null", Scalar::Null),
        ] {
            if self.matches_keyword(word, true) {
                self.consume(word.len());
                return Some(scalar);
            }
        }
        self.position = saved;
        None
    }

    fn read_scalar(&mut self) -> Result<Scalar, LexError> {
        match self.current_char() {
            Some(q @ ('"' | '\'')) => self.read_string(q).map(Scalar::String),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()
            }
            Some(ch) if Self::is_word_char(ch) => self
                .read_word_literal()
                .ok_or_else(|| self.error_at(self.position, "Invalid array element")),
            Some(ch) => Err(self.error_at(
                self.position,
                format!("Unexpected character '{}' in array", ch),
            )),
            None => Err(self.error_at(self.position, "Unterminated array")),
        }
    }

    fn read_array(&mut self) -> Result<Vec<Scalar>, LexError> {
        let start = self.position;
        self.advance(); // Consume '['
        let mut elements = vec![];

        self.skip_whitespace();
        if self.current_char() == Some(']') {
            self.advance();
            return Ok(elements);
        }

        loop {
            self.skip_whitespace();
            elements.push(self.read_scalar()?);
            self.skip_whitespace();

            match self.current_char() {
                Some(',') => {
                    self.advance();
                    self.skip_whitespace();
                    if self.current_char() == Some(']') {
                        return Err(self.error_at(self.position, "Trailing comma in array"));
                    }
                }
                Some(']') => {
                    self.advance();
                    return Ok(elements);
                }
                Some(_) => {
                    return Err(self.error_at(self.position, "Expected ',' or ']' in array"));
                }
                None => return Err(self.error_at(start, "Unterminated array")),
            }
        }
    }

    fn read_word(&mut self) -> Token {
        for &(keyword, op) in OPERATOR_KEYWORDS {
            if self.matches_keyword(keyword, false) {
                self.consume(keyword.len());
                return Token::Operator(op);
            }
        }

        for &keyword in LOGICAL_KEYWORDS {
            if self.matches_keyword(keyword, false) {
                self.consume(keyword.len());
                return match keyword {
                    "and" => Token::And,
                    "or" => Token::Or,
                    _ => Token::Not,
                };
            }
        }

        if let Some(scalar) = self.read_word_literal() {
            return Token::Literal(Value::Scalar(scalar));
        }

        Token::Identifier(self.read_identifier())
    }

    pub fn next_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_whitespace();
        let position = self.byte_offset(self.position);

        let token = match self.current_char() {
            None => Token::Eof,
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some(',') => {
                self.advance();
                Token::Comma
            }
            Some(q @ ('"' | '\'')) => Token::Literal(Value::Scalar(Scalar::String(
                self.read_string(q)?,
            ))),
            Some('[') => Token::Literal(Value::List(self.read_array()?)),
            Some(ch) if ch.is_ascii_digit() => Token::Literal(Value::Scalar(self.read_number()?)),
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                Token::Literal(Value::Scalar(self.read_number()?))
            }
            Some(ch) if Self::is_word_char(ch) => self.read_word(),
            Some(ch) => {
                return Err(
                    self.error_at(self.position, format!("Unexpected character '{}'", ch))
                );
            }
        };

        tracing::trace!(?token, position, "token");
        Ok(SpannedToken { token, position })
    }

    /// Reads the whole input, ending with a single `Eof` token.
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut tokens = vec![];
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
fn kinds(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect()
}

#[test]
fn test_keywords() {
    use crate::ast::Operator;

    assert_eq!(
        kinds("and or not notIn in"),
        vec![
            Token::And,
            Token::Or,
            Token::Not,
            Token::Operator(Operator::NotIn),
            Token::Operator(Operator::In),
            Token::Eof,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(
        kinds("containsX index order"),
        vec![
            Token::Identifier("containsX".to_string()),
            Token::Identifier("index".to_string()),
            Token::Identifier("order".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_positions_are_byte_offsets() {
    let tokens = Lexer::new("név eq 1").tokenize().unwrap();
    assert_eq!(tokens[0].position, 0);
    assert_eq!(tokens[1].position, 5);
    assert_eq!(tokens[2].position, 8);
}
