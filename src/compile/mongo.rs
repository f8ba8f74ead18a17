//! MongoDB query documents.
//!
//! `and`/`or` map to `$and`/`$or` with same-operator groups flattened; `not`
//! maps to `$nor` over a single filter. `$nor` matches documents failing the
//! inner filter, which includes documents missing the field, so it is a NOR
//! rather than a strict complement of the inner comparison.
//!
//! Pattern operators become case-insensitive regexes with the user's text
//! escaped: `contains` is unanchored, `startsWith` is anchored with `^` and
//! `endsWith` with `$`.

use serde_json::{Map, Value as Json};

use super::{CompileError, FilterCompiler, invalid_node, single, unsupported_value};
use crate::ast::{LogicalKind, Node, Operator};
use crate::value::Value;

pub struct Mongo;

impl FilterCompiler for Mongo {
    type Output = Json;

    fn compile(&self, node: &Node) -> Result<Json, CompileError> {
        compile_mongo(node)
    }
}

pub fn compile_mongo(node: &Node) -> Result<Json, CompileError> {
    let filter = compile_node(node)?;
    tracing::debug!(backend = "mongo", "compiled filter");
    Ok(filter)
}

fn compile_node(node: &Node) -> Result<Json, CompileError> {
    match node {
        Node::Comparison { field, op, value } => compile_comparison(field, *op, value),
        Node::Logical { kind, left, right } => {
            let key = match kind {
                LogicalKind::And => "$and",
                LogicalKind::Or => "$or",
            };
            let mut operands = vec![];
            for side in [left, right] {
                match compile_node(side)? {
                    Json::Object(map) if map.len() == 1 && map.contains_key(key) => {
                        if let Some(Json::Array(nested)) = map.into_iter().next().map(|(_, v)| v) {
                            operands.extend(nested);
                        }
                    }
                    other => operands.push(other),
                }
            }
            Ok(single(key, Json::Array(operands)))
        }
        Node::Not(child) => Ok(single("$nor", Json::Array(vec![compile_node(child)?]))),
    }
}

fn compile_comparison(field: &str, op: Operator, value: &Value) -> Result<Json, CompileError> {
    if !Node::has_valid_shape(op, value) {
        return Err(invalid_node(field, op, value));
    }

    let condition = match op {
        Operator::Eq => value.to_json(),
        Operator::Ne => single("$ne", value.to_json()),
        Operator::Gt => single("$gt", value.to_json()),
        Operator::Gte => single("$gte", value.to_json()),
        Operator::Lt => single("$lt", value.to_json()),
        Operator::Lte => single("$lte", value.to_json()),
        Operator::In => single("$in", value.to_json()),
        Operator::NotIn => single("$nin", value.to_json()),
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            let text = match value {
                Value::Scalar(scalar) => scalar.as_text(),
                Value::List(_) => return Err(unsupported_value(field, op, value)),
                Value::Range(..) => return Err(invalid_node(field, op, value)),
            };
            let escaped = regex::escape(&text);
            let pattern = match op {
                Operator::StartsWith => format!("^{}", escaped),
                Operator::EndsWith => format!("{}$", escaped),
                _ => escaped,
            };
            let mut map = Map::new();
            map.insert("$regex".to_string(), Json::String(pattern));
            map.insert("$options".to_string(), Json::String("i".to_string()));
            Json::Object(map)
        }
        Operator::Between => {
            let (lower, upper) = value
                .as_range()
                .ok_or_else(|| invalid_node(field, op, value))?;
            let mut bounds = Map::new();
            if let Some(lower) = lower {
                bounds.insert("$gte".to_string(), lower.to_json());
            }
            if let Some(upper) = upper {
                bounds.insert("$lte".to_string(), upper.to_json());
            }
            if bounds.is_empty() {
                // Unbounded on both sides matches everything
                return Ok(Json::Object(Map::new()));
            }
            Json::Object(bounds)
        }
    };
    Ok(single(field, condition))
}
