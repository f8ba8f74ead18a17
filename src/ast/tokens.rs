use crate::ast::Operator;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Field path
    ///
    /// Word characters plus `_`, `.`, `[` and `]`, so nested and indexed
    /// paths lex as one token.
    ///
    /// # Examples
    /// ```text
    /// age
    /// profile.address.city
    /// addresses[0].city
    /// ```
    Identifier(String),

    /// Comparison keyword
    ///
    /// # Examples
    /// ```text
    /// eq
    /// notIn
    /// startsWith
    /// ```
    Operator(Operator),

    // Logical
    /// Logical AND (word, not symbol)
    And,

    /// Logical OR (word, not symbol)
    Or,

    /// Logical NOT, unary prefix
    Not,

    /// Literal value: string, number, boolean, null or a bracketed list
    ///
    /// # Examples
    /// ```text
    /// "Paris"
    /// 'it\'s'
    /// -1.5
    /// true
    /// null
    /// ["a", "b", 3]
    /// ```
    Literal(Value),

    // Delimiters
    /// Left parenthesis for grouping
    LParen,

    /// Right parenthesis
    RParen,

    /// Comma
    Comma,

    /// End of input
    Eof,
}

impl Token {
    /// Short description used in parse error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Operator(op) => format!("operator '{}'", op),
            Token::And => "'and'".to_string(),
            Token::Or => "'or'".to_string(),
            Token::Not => "'not'".to_string(),
            Token::Literal(Value::Scalar(s)) => format!("{} literal", s.type_name()),
            Token::Literal(value) => format!("{} literal", value.kind_name()),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub position: usize,
}
