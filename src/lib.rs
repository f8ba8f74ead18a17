//! qast - a small filter language compiled to ORM and database filters.
//!
//! ```text
//! age gt 25 and (city eq "Paris" or city eq "Tokyo")
//! ```
//!
//! A query is lexed and parsed into a [`Node`] tree, optionally checked
//! against complexity limits and a field/operator whitelist, then compiled by
//! one backend. The TypeORM and Sequelize outputs go through a
//! [`finalize`] step with the caller's operator table.
//!
//! ```
//! use serde_json::json;
//!
//! let ast = qast::parse(r#"age gt 25 and name eq "John""#).unwrap();
//! let filter = qast::compile_prisma(&ast).unwrap();
//! assert_eq!(filter, json!({"where": {"age": {"gt": 25}, "name": {"equals": "John"}}}));
//! ```
pub mod ast;
pub mod compile;
pub mod complexity;
pub mod error;
pub mod extract;
pub mod finalize;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod printer;
pub mod validator;
pub mod value;

pub use ast::{LogicalKind, Node, Operator, Token};
pub use compile::{
    CompileError, FilterCompiler, SqlQuery, compile_drizzle, compile_mongo, compile_prisma,
    compile_sequelize, compile_sql, compile_typeorm,
};
pub use complexity::{ComplexityError, ComplexityLimits, QueryComplexity, check_complexity, measure};
pub use error::{ErrorKind, QastError, QastResult};
pub use extract::{extract_fields, extract_operators};
pub use finalize::{FinalizeError, finalize_sequelize, finalize_typeorm};
pub use lexer::{LexError, Lexer, Position};
pub use options::{FieldType, FieldTypeDefinition, ParseOptions, WhitelistOptions};
pub use parser::{ParseError, Parser};
pub use printer::to_query_string;
pub use validator::{ValidationError, validate};
pub use value::{Scalar, Value};

/// Parses `query` with default options: no limits and no validation.
pub fn parse(query: &str) -> QastResult<Node> {
    parse_with(query, &ParseOptions::default())
}

/// Parses `query`, then applies the complexity limits and, when enabled, the
/// whitelist from `options`.
pub fn parse_with(query: &str, options: &ParseOptions) -> QastResult<Node> {
    let mut parser = Parser::new(Lexer::new(query))?;
    let ast = parser.parse()?;
    tracing::debug!(query, "parsed filter query");

    let limits = options.limits();
    if !limits.is_unbounded() {
        check_complexity(&ast, &limits)?;
    }

    if options.should_validate() {
        validate(&ast, &options.whitelist)?;
        tracing::debug!(fields = ?extract_fields(&ast), "filter query passed validation");
    }

    Ok(ast)
}
