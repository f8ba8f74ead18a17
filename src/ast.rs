//! # qast - Abstract Syntax Tree
//!
//! This module defines the tokens and the tree produced by parsing a filter
//! query such as
//!
//! ```text
//! age gt 25 and (city eq "Paris" or city eq "Tokyo")
//! ```
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Comparison operators, logical kinds and keyword tables
//! - **[node]** - The `Node` tagged union consumed by every later stage
//!
//! ## Grammar
//!
//! ```text
//! expr       := and_expr ( "or" and_expr )*
//! and_expr   := not_expr ( "and" not_expr )*
//! not_expr   := "not" not_expr | term
//! term       := comparison | "(" expr ")"
//! comparison := IDENT OPKEYWORD VALUE
//! VALUE      := STRING | NUMBER | BOOL | "null" | "[" (VALUE ("," VALUE)*)? "]"
//! ```
//!
//! ## Precedence
//!
//! `or` binds loosest, then `and`, then `not`:
//!
//! ```text
//! a and b or c          // (a and b) or c
//! not a and b           // (not a) and b
//! ```
//!
//! ## Values
//!
//! - `in` / `notIn` always carry a list (`[]` is allowed)
//! - `between` always carries a `[lower, upper]` range; `null` leaves a side open
//! - every other operator carries a scalar
pub mod node;
pub mod operators;
pub mod tokens;

pub use node::Node;
pub use operators::{LOGICAL_KEYWORDS, LogicalKind, OPERATOR_KEYWORDS, Operator};
pub use tokens::{SpannedToken, Token};
