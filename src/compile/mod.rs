//! Backend compilers.
//!
//! Each backend turns a [`Node`] tree into the filter value its target
//! understands. Compilation is pure and deterministic. Backends assume a
//! parser-built (or validated) tree; a hand-built node whose value does not
//! fit its operator is reported as [`CompileError::InvalidNode`].
//!
//! | Backend | Output |
//! |---|---|
//! | [`Prisma`] | `{"where": {...}}` object-merge filter |
//! | [`TypeOrm`] | object (AND) or array (OR) with operator envelopes |
//! | [`Sequelize`] | operator and logical envelopes |
//! | [`Mongo`] | native `$`-operator document |
//! | [`Sql`] / [`Drizzle`] | parenthesized SQL text with positional parameters |
//!
//! The TypeORM and Sequelize outputs still contain envelopes; see
//! [`crate::finalize`] to turn them into real operator calls.

pub mod mongo;
pub mod prisma;
pub mod sequelize;
pub mod sql;
pub mod typeorm;

use serde_json::{Map, Value as Json};
use thiserror::Error;

use crate::ast::{Node, Operator};
use crate::value::Value;

pub use mongo::{Mongo, compile_mongo};
pub use prisma::{Prisma, compile_prisma};
pub use sequelize::{Sequelize, compile_sequelize};
pub use sql::{Drizzle, DrizzleQuery, Sql, SqlQuery, compile_drizzle, compile_sql};
pub use typeorm::{TypeOrm, compile_typeorm};

/// Key of an operator envelope: `{"__qast_operator__": "gt", "value": 5}`
pub const OPERATOR_MARKER: &str = "__qast_operator__";
/// Key of a logical envelope: `{"__qast_logical__": "and", "conditions": [...]}`
pub const LOGICAL_MARKER: &str = "__qast_logical__";
/// Key of a negation envelope: `{"__qast_not__": {...}}`
pub const NOT_MARKER: &str = "__qast_not__";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// A node that the parser could never have produced
    #[error("Invalid node for field '{field}': operator '{operator}' cannot take a {found} value")]
    InvalidNode {
        field: String,
        operator: Operator,
        found: &'static str,
    },

    /// A value the parser accepts but this target has no form for
    #[error("Operator '{operator}' on field '{field}' cannot take a {found} value for this target")]
    UnsupportedValue {
        field: String,
        operator: Operator,
        found: &'static str,
    },

    /// `in` / `notIn` with an empty list where the target cannot express it
    #[error("Operator '{operator}' on field '{field}' requires a non-empty list")]
    EmptyList { field: String, operator: Operator },
}

/// A compiler from the tree to one target representation.
pub trait FilterCompiler {
    type Output;

    fn compile(&self, node: &Node) -> Result<Self::Output, CompileError>;
}

pub(crate) fn invalid_node(field: &str, op: Operator, value: &Value) -> CompileError {
    CompileError::InvalidNode {
        field: field.to_string(),
        operator: op,
        found: value.kind_name(),
    }
}

pub(crate) fn unsupported_value(field: &str, op: Operator, value: &Value) -> CompileError {
    CompileError::UnsupportedValue {
        field: field.to_string(),
        operator: op,
        found: value.kind_name(),
    }
}

/// Builds an operator envelope.
pub(crate) fn envelope(op: &str, value: Json) -> Json {
    let mut map = Map::new();
    map.insert(OPERATOR_MARKER.to_string(), Json::String(op.to_string()));
    map.insert("value".to_string(), value);
    Json::Object(map)
}

pub(crate) fn is_envelope(value: &Json) -> bool {
    value
        .as_object()
        .is_some_and(|m| m.contains_key(OPERATOR_MARKER))
}

/// `{"a": {"b": {"c": condition}}}` for the path `a.b.c`.
pub(crate) fn nest_path(field: &str, condition: Json) -> Map<String, Json> {
    let mut segments = field.split('.').rev();
    let last = segments.next().unwrap_or(field);

    let mut map = Map::new();
    map.insert(last.to_string(), condition);
    for segment in segments {
        let mut outer = Map::new();
        outer.insert(segment.to_string(), Json::Object(map));
        map = outer;
    }
    map
}

/// Single-key map.
pub(crate) fn single(key: &str, value: Json) -> Json {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Json::Object(map)
}
