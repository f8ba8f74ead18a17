//! Sequelize `where` conditions, first phase.
//!
//! ```text
//! age gt 25            →  {"age": {"__qast_operator__": "gt", "value": 25}}
//! a eq 1 and b eq 2    →  {"__qast_logical__": "and", "conditions": [{"a": 1}, {"b": 2}]}
//! not a eq 1           →  {"__qast_logical__": "not", "condition": {"a": 1}}
//! ```
//!
//! Nested groups of the same kind are flattened into one `conditions` list.
//! [`crate::finalize::finalize_sequelize`] swaps the envelopes for the
//! caller's `Op` symbols.

use serde_json::{Map, Value as Json};

use super::{CompileError, FilterCompiler, LOGICAL_MARKER, envelope, invalid_node, single};
use crate::ast::{LogicalKind, Node, Operator};

pub struct Sequelize;

impl FilterCompiler for Sequelize {
    type Output = Json;

    fn compile(&self, node: &Node) -> Result<Json, CompileError> {
        compile_sequelize(node)
    }
}

pub fn compile_sequelize(node: &Node) -> Result<Json, CompileError> {
    let filter = compile_node(node)?;
    tracing::debug!(backend = "sequelize", "compiled filter");
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
            Ok(single(field, condition))
        }
        Node::Logical { kind, left, right } => {
            let mut conditions = vec![];
            for side in [left, right] {
                let compiled = compile_node(side)?;
                match group_conditions(&compiled, *kind) {
                    Some(nested) => conditions.extend(nested.iter().cloned()),
                    None => conditions.push(compiled),
                }
            }
            let mut map = Map::new();
            map.insert(LOGICAL_MARKER.to_string(), Json::String(kind.as_str().to_string()));
            map.insert("conditions".to_string(), Json::Array(conditions));
            Ok(Json::Object(map))
        }
        Node::Not(child) => {
            let mut map = Map::new();
            map.insert(LOGICAL_MARKER.to_string(), Json::String("not".to_string()));
            map.insert("condition".to_string(), compile_node(child)?);
            Ok(Json::Object(map))
        }
    }
}

/// The `conditions` of a logical envelope of the given kind.
fn group_conditions(value: &Json, kind: LogicalKind) -> Option<&Vec<Json>> {
    let map = value.as_object()?;
    if map.get(LOGICAL_MARKER)?.as_str()? != kind.as_str() {
        return None;
    }
    map.get("conditions")?.as_array()
}
