use std::mem;

use thiserror::Error;

use crate::{
    ast::{Node, Operator, SpannedToken, Token},
    lexer::{LexError, Lexer, Position},
    value::{Scalar, Value},
};

/// Nesting allowed by default. Parentheses, `not` prefixes and every
/// further operand of an `and`/`or` chain each add a level, so the tree handed
/// to later stages is never deeper than this.
pub const DEFAULT_MAX_NESTING: usize = 256;

/// Errors raised while turning tokens into a tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The lexer failed while the parser was pulling tokens
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Tokens did not match the grammar
    #[error("Parse error at position {position}: {message}, found {found}")]
    Syntax {
        message: String,
        position: Position,
        found: String,
    },

    /// Parentheses, `not` prefixes or chained operands nested past the parser's ceiling
    #[error("Parse error at position {position}: expression nested deeper than {max} levels")]
    NestingTooDeep { max: usize, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(e) => e.position,
            ParseError::Syntax { position, .. } | ParseError::NestingTooDeep { position, .. } => {
                *position
            }
        }
    }
}

pub struct Parser {
    lexer: Lexer,
    current: SpannedToken,
    depth: usize,
    max_nesting: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            depth: 0,
            max_nesting: DEFAULT_MAX_NESTING,
        })
    }

    /// Overrides the nesting ceiling applied to `(`, `not` and `and`/`or` chains.
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    fn advance(&mut self) -> Result<SpannedToken, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current, next))
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            message: message.into(),
            position: self.current.position,
            found: self.current.token.describe(),
        }
    }

    fn expect(&mut self, expected: Token, message: &str) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.error(message));
        }
        self.advance()?;
        Ok(())
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_nesting {
            return Err(ParseError::NestingTooDeep {
                max: self.max_nesting,
                position: self.current.position,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parse `field operator value`, checking the operator/value pairing.
    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let field = match mem::replace(&mut self.current.token, Token::Eof) {
            Token::Identifier(name) => {
                self.advance()?;
                name
            }
            other => {
                self.current.token = other;
                return Err(self.error("Expected field name"));
            }
        };

        let op = match self.current.token {
            Token::Operator(op) => {
                self.advance()?;
                op
            }
            _ => return Err(self.error(format!("Expected operator after field '{}'", field))),
        };

        let value_position = self.current.position;
        let value = match mem::replace(&mut self.current.token, Token::Eof) {
            Token::Literal(value) => {
                self.advance()?;
                value
            }
            other => {
                self.current.token = other;
                return Err(self.error(format!("Expected value after operator '{}'", op)));
            }
        };

        let value = match (op, value) {
            (Operator::In | Operator::NotIn, value @ Value::List(_)) => value,
            (Operator::In | Operator::NotIn, _) => {
                return Err(ParseError::Syntax {
                    message: format!("Operator '{}' requires an array value", op),
                    position: value_position,
                    found: "scalar literal".to_string(),
                });
            }
            (Operator::Between, Value::List(items)) if items.len() == 2 => {
                let mut items = items.into_iter();
                let lower = items.next().unwrap_or(Scalar::Null);
                let upper = items.next().unwrap_or(Scalar::Null);
                Value::Range(lower, upper)
            }
            (Operator::Between, value) => {
                return Err(ParseError::Syntax {
                    message: "Operator 'between' requires an array of exactly 2 values"
                        .to_string(),
                    position: value_position,
                    found: match value {
                        Value::List(items) => format!("array of {} values", items.len()),
                        _ => "scalar literal".to_string(),
                    },
                });
            }
            (_, value) => value,
        };

        Ok(Node::Comparison { field, op, value })
    }

    /// term := comparison | '(' expr ')'
    fn parse_term(&mut self) -> Result<Node, ParseError> {
        if self.check(&Token::LParen) {
            self.enter()?;
            self.advance()?;
            let expr = self.parse_or()?;
            self.expect(Token::RParen, "Expected ')'")?;
            self.leave();
            return Ok(expr);
        }
        self.parse_comparison()
    }

    /// not_expr := 'not' not_expr | term
    fn parse_not(&mut self) -> Result<Node, ParseError> {
        if self.check(&Token::Not) {
            self.enter()?;
            self.advance()?;
            let child = self.parse_not()?; // Right-recursive
            self.leave();
            return Ok(Node::negate(child));
        }
        self.parse_term()
    }

    /// Chains fold left, one tree level per operand, so each fold counts
    /// toward the nesting ceiling until the chain ends.
    fn parse_and(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_not()?;
        let mut folds = 0;

        while self.check(&Token::And) {
            self.enter()?;
            folds += 1;
            self.advance()?;
            let right = self.parse_not()?;
            left = Node::and(left, right);
        }
        self.depth -= folds;
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_and()?;
        let mut folds = 0;

        while self.check(&Token::Or) {
            self.enter()?;
            folds += 1;
            self.advance()?;
            let right = self.parse_and()?;
            left = Node::or(left, right);
        }
        self.depth -= folds;
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<Node, ParseError> {
        self.parse_or()
    }

    /// Parse a complete query; the expression must consume all input.
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        if self.check(&Token::Eof) {
            return Err(self.error("Empty query"));
        }
        let expr = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.error("Unexpected token after expression"));
        }
        Ok(expr)
    }
}
