//! Prisma `where` objects.
//!
//! ```text
//! age gt 25 and name eq "John"   →  {"where": {"age": {"gt": 25}, "name": {"equals": "John"}}}
//! name eq "A" or name eq "B"     →  {"where": {"OR": [{"name": {"equals": "A"}}, {"name": {"equals": "B"}}]}}
//! not age gt 30                  →  {"where": {"NOT": {"age": {"gt": 30}}}}
//! ```
//!
//! `and` merges both sides into one object. When a key is already present
//! (the same field twice, or an `OR` on both sides) the incoming clause moves
//! into an `AND` array instead of overwriting it.

use serde_json::{Map, Value as Json};

use super::{CompileError, FilterCompiler, invalid_node, nest_path, single};
use crate::ast::{LogicalKind, Node, Operator};
use crate::value::Value;

pub struct Prisma;

impl FilterCompiler for Prisma {
    type Output = Json;

    fn compile(&self, node: &Node) -> Result<Json, CompileError> {
        compile_prisma(node)
    }
}

/// Compiles to `{"where": filter}`.
pub fn compile_prisma(node: &Node) -> Result<Json, CompileError> {
    let filter = compile_node(node)?;
    tracing::debug!(backend = "prisma", "compiled filter");
    Ok(single("where", Json::Object(filter)))
}

fn compile_node(node: &Node) -> Result<Map<String, Json>, CompileError> {
    match node {
        Node::Comparison { field, op, value } => {
            let condition = compile_condition(field, *op, value)?;
            Ok(nest_path(field, condition))
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
            push_or_branch(&mut branches, compile_node(left)?);
            push_or_branch(&mut branches, compile_node(right)?);
            let mut map = Map::new();
            map.insert("OR".to_string(), Json::Array(branches));
            Ok(map)
        }
        Node::Not(child) => {
            let mut map = Map::new();
            map.insert("NOT".to_string(), Json::Object(compile_node(child)?));
            Ok(map)
        }
    }
}

fn compile_condition(field: &str, op: Operator, value: &Value) -> Result<Json, CompileError> {
    if !Node::has_valid_shape(op, value) {
        return Err(invalid_node(field, op, value));
    }

    let condition = match op {
        Operator::Eq => single("equals", value.to_json()),
        Operator::Ne => single("not", value.to_json()),
        Operator::Between => {
            let (lower, upper) = value
                .as_range()
                .ok_or_else(|| invalid_node(field, op, value))?;
            let mut bounds = Map::new();
            if let Some(lower) = lower {
                bounds.insert("gte".to_string(), lower.to_json());
            }
            if let Some(upper) = upper {
                bounds.insert("lte".to_string(), upper.to_json());
            }
            Json::Object(bounds)
        }
        // gt, gte, lt, lte, in, notIn, contains, startsWith, endsWith share
        // their Prisma names
        op => single(op.as_str(), value.to_json()),
    };
    Ok(condition)
}

fn merge_and(mut left: Map<String, Json>, right: Map<String, Json>) -> Map<String, Json> {
    for (key, value) in right {
        if !left.contains_key(&key) {
            left.insert(key, value);
            continue;
        }

        let incoming = if key == "AND" {
            match value {
                Json::Array(items) => items,
                other => vec![other],
            }
        } else {
            vec![single(&key, value)]
        };

        let conjuncts = left
            .entry("AND".to_string())
            .or_insert_with(|| Json::Array(vec![]));
        match conjuncts {
            Json::Array(items) => items.extend(incoming),
            other => {
                let existing = other.take();
                let mut items = vec![existing];
                items.extend(incoming);
                *other = Json::Array(items);
            }
        }
    }
    left
}

/// Splices a nested `{"OR": [...]}` instead of wrapping it again.
fn push_or_branch(branches: &mut Vec<Json>, branch: Map<String, Json>) {
    if branch.len() == 1 {
        if let Some(Json::Array(nested)) = branch.get("OR") {
            branches.extend(nested.iter().cloned());
            return;
        }
    }
    branches.push(Json::Object(branch));
}
