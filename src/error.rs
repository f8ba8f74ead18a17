//! Error type covering every stage of the pipeline.

use thiserror::Error;

use crate::compile::CompileError;
use crate::complexity::ComplexityError;
use crate::finalize::FinalizeError;
use crate::lexer::LexError;
use crate::parser::ParseError;
use crate::validator::ValidationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QastError {
    #[error(transparent)]
    Tokenization(LexError),

    #[error(transparent)]
    Parse(ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Complexity(#[from] ComplexityError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),
}

/// Which stage rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Tokenization,
    Parse,
    Validation,
    Complexity,
    Compile,
    Finalize,
}

impl QastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QastError::Tokenization(_) => ErrorKind::Tokenization,
            QastError::Parse(_) => ErrorKind::Parse,
            QastError::Validation(_) => ErrorKind::Validation,
            QastError::Complexity(_) => ErrorKind::Complexity,
            QastError::Compile(_) => ErrorKind::Compile,
            QastError::Finalize(_) => ErrorKind::Finalize,
        }
    }

    /// True for errors caused by the query text or policy rather than by
    /// the caller's own configuration or hand-built trees.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Tokenization | ErrorKind::Parse | ErrorKind::Validation | ErrorKind::Complexity
        )
    }
}

impl From<LexError> for QastError {
    fn from(e: LexError) -> Self {
        QastError::Tokenization(e)
    }
}

impl From<ParseError> for QastError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Lex(e) => QastError::Tokenization(e),
            other => QastError::Parse(other),
        }
    }
}

/// Result type for qast operations
pub type QastResult<T> = Result<T, QastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_surfaces_as_tokenization() {
        let lex = LexError {
            message: "Unexpected character '#'".to_string(),
            position: 4,
            context: "age # 3".to_string(),
        };
        let err = QastError::from(ParseError::Lex(lex.clone()));
        assert_eq!(err.kind(), ErrorKind::Tokenization);
        assert_eq!(err, QastError::Tokenization(lex));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_error_messages() {
        let err = QastError::from(CompileError::EmptyList {
            field: "age".to_string(),
            operator: crate::Operator::In,
        });
        assert_eq!(
            err.to_string(),
            "Operator 'in' on field 'age' requires a non-empty list"
        );
        assert!(!err.is_user_error());
    }
}
