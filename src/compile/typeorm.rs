//! TypeORM `where` conditions, first phase.
//!
//! Equality is a plain value; every other operator becomes an operator
//! envelope because the real `MoreThan`/`In`/`Like` functions live in
//! TypeORM itself. `and` merges objects, `or` yields an array of objects and
//! `not` wraps the sub-filter in a negation envelope.
//!
//! ```text
//! age gt 25 and name eq "John"  →  {"age": {"__qast_operator__": "gt", "value": 25}, "name": "John"}
//! a eq 1 or b eq 2              →  [{"a": 1}, {"b": 2}]
//! not age gt 30                 →  {"__qast_not__": {"age": {"__qast_operator__": "gt", "value": 30}}}
//! ```
//!
//! An `and` with an array on one side merges the other side into every array
//! element. With arrays on both sides the branches are flattened into one
//! array, which widens the filter: `(a or b) and (c or d)` becomes
//! `a or b or c or d`. That case is logged at `warn` level. When both sides
//! name the same field the two conditions are combined under an `and`
//! envelope. The result still holds
//! envelopes; [`crate::finalize::finalize_typeorm`] materializes them.

use serde_json::{Map, Value as Json};

use super::{
    CompileError, FilterCompiler, NOT_MARKER, OPERATOR_MARKER, envelope, invalid_node,
    is_envelope, nest_path, single,
};
use crate::ast::{LogicalKind, Node, Operator};

pub struct TypeOrm;

impl FilterCompiler for TypeOrm {
    type Output = Json;

    fn compile(&self, node: &Node) -> Result<Json, CompileError> {
        compile_typeorm(node)
    }
}

pub fn compile_typeorm(node: &Node) -> Result<Json, CompileError> {
    let filter = compile_node(node)?;
    tracing::debug!(backend = "typeorm", or_branches = filter.as_array().map(Vec::len), "compiled filter");
    Ok(filter)
}

fn compile_node(node: &Node) -> Result<Json, CompileError> {
    match node {
        Node::Comparison { field, op, value } => {
            if !Node::has_valid_shape(*op, value) {
                return Err(invalid_node(field, *op, value));
            }
            let condition = match op {
                Operator::Eq => value.to_json(),
                op => envelope(op.as_str(), value.to_json()),
            };
            Ok(Json::Object(nest_path(field, condition)))
        }
        Node::Logical {
            kind: LogicalKind::And,
            left,
            right,
        } => Ok(merge_and(compile_node(left)?, compile_node(right)?)),
        Node::Logical {
            kind: LogicalKind::Or,
            left,
            right,
        } => {
            let mut branches = vec![];
            for side in [compile_node(left)?, compile_node(right)?] {
                match side {
                    Json::Array(nested) => branches.extend(nested),
                    other => branches.push(other),
                }
            }
            Ok(Json::Array(branches))
        }
        Node::Not(child) => Ok(single(NOT_MARKER, compile_node(child)?)),
    }
}

fn merge_and(left: Json, right: Json) -> Json {
    match (left, right) {
        (Json::Array(mut left), Json::Array(right)) => {
            tracing::warn!(
                backend = "typeorm",
                left = left.len(),
                right = right.len(),
                "and of two or-groups flattened into a single or-group"
            );
            left.extend(right);
            Json::Array(left)
        }
        (Json::Array(branches), other) | (other, Json::Array(branches)) => Json::Array(
            branches
                .into_iter()
                .map(|branch| merge_and(branch, other.clone()))
                .collect(),
        ),
        (Json::Object(left), Json::Object(right)) => Json::Object(merge_objects(left, right)),
        // Only objects and arrays come out of compile_node
        (left, _) => left,
    }
}

/// Merges two `and`ed objects: relations deep-merge, repeated fields join
/// under an `and` envelope.
pub(crate) fn merge_objects(mut left: Map<String, Json>, right: Map<String, Json>) -> Map<String, Json> {
    for (key, value) in right {
        match left.get_mut(&key) {
            None => {
                left.insert(key, value);
            }
            Some(existing) => {
                let current = existing.take();
                *existing = if key != NOT_MARKER && is_relation(&current) && is_relation(&value) {
                    match (current, value) {
                        (Json::Object(a), Json::Object(b)) => Json::Object(merge_objects(a, b)),
                        (current, _) => current,
                    }
                } else {
                    combine_conditions(current, value)
                };
            }
        }
    }
    left
}

/// Nested relation object, as opposed to a condition on the field itself.
fn is_relation(value: &Json) -> bool {
    value.is_object() && !is_envelope(value)
}

/// Two conditions on one key, joined under an `and` envelope.
fn combine_conditions(mut current: Json, incoming: Json) -> Json {
    let is_and = current
        .get(OPERATOR_MARKER)
        .and_then(Json::as_str)
        .is_some_and(|op| op == "and");
    if is_and {
        if let Some(Json::Array(items)) = current.get_mut("value") {
            items.push(incoming);
            return current;
        }
    }
    envelope("and", Json::Array(vec![current, incoming]))
}
