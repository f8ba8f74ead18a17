use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value as Json};

use super::{FinalizeError, pattern_text, range_bounds};
use crate::ast::Operator;
use crate::compile::typeorm::merge_objects;
use crate::compile::{NOT_MARKER, OPERATOR_MARKER, envelope};

const BACKEND: &str = "TypeORM";

/// A caller-side operator constructor such as TypeORM's `MoreThan`.
pub type OperatorFn = Arc<dyn Fn(&[Json]) -> Json + Send + Sync>;

/// TypeORM operator functions by name.
///
/// Names used: `equal`, `not`, `moreThan`, `moreThanOrEqual`, `lessThan`,
/// `lessThanOrEqual`, `in`, `like`, `between`, `isNull`, `and`. Only the
/// entries a given filter needs have to be present.
#[derive(Clone, Default)]
pub struct TypeOrmOperators {
    functions: HashMap<String, OperatorFn>,
}

impl TypeOrmOperators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        name: impl Into<String>,
        function: impl Fn(&[Json]) -> Json + Send + Sync + 'static,
    ) -> Self {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    fn call(&self, name: &str, args: &[Json]) -> Result<Json, FinalizeError> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| FinalizeError::MissingOperator {
                backend: BACKEND,
                name: name.to_string(),
            })?;
        Ok(function(args))
    }
}

impl fmt::Debug for TypeOrmOperators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("TypeOrmOperators").field("functions", &names).finish()
    }
}

/// Replaces the envelopes in [`crate::compile_typeorm`] output with calls into
/// the operator table.
///
/// Negation is pushed down onto each field and merged with the field's other
/// conditions. A `not` over an OR array, over more than one field, or over
/// several merged negations has no per-field form and is rejected.
pub fn finalize_typeorm(filter: &Json, operators: &TypeOrmOperators) -> Result<Json, FinalizeError> {
    let finalizer = Finalizer { operators };
    tracing::debug!(backend = BACKEND, or_branches = filter.as_array().map(Vec::len), "finalizing filter");
    match filter {
        Json::Array(branches) => branches
            .iter()
            .map(|branch| finalizer.finalize_branch(branch).map(Json::Object))
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array),
        other => finalizer.finalize_branch(other).map(Json::Object),
    }
}

struct Finalizer<'a> {
    operators: &'a TypeOrmOperators,
}

impl Finalizer<'_> {
    fn finalize_branch(&self, value: &Json) -> Result<Map<String, Json>, FinalizeError> {
        match value.as_object() {
            Some(map) => self.finalize_object(map),
            None => Err(invalid(format!("expected an object, got {}", value))),
        }
    }

    fn finalize_object(&self, map: &Map<String, Json>) -> Result<Map<String, Json>, FinalizeError> {
        let mut out = Map::new();
        for (key, value) in lower_negations(map.clone())? {
            if is_relation(&value) {
                let nested = self.finalize_branch(&value)?;
                out.insert(key, Json::Object(nested));
            } else if let Some(condition) = self.finalize_condition(&value)? {
                out.insert(key, condition);
            }
        }
        Ok(out)
    }

    /// A condition in operator form; plain values become `equal` / `isNull`.
    fn as_find_operator(&self, value: &Json) -> Result<Option<Json>, FinalizeError> {
        if value.get(OPERATOR_MARKER).is_some() {
            return self.finalize_condition(value);
        }
        let finalized = match value {
            Json::Null => self.operators.call("isNull", &[])?,
            other => self.operators.call("equal", std::slice::from_ref(other))?,
        };
        Ok(Some(finalized))
    }

    /// `None` for a condition that matches everything (unbounded `between`).
    fn finalize_condition(&self, condition: &Json) -> Result<Option<Json>, FinalizeError> {
        let Some(name) = op_name(condition) else {
            return match condition {
                Json::Null => self.operators.call("isNull", &[]).map(Some),
                other => Ok(Some(other.clone())),
            };
        };
        let value = condition.get("value").cloned().unwrap_or(Json::Null);
        let ops = self.operators;

        if name == "not" {
            let condition = self
                .as_find_operator(&value)?
                .ok_or_else(|| unsupported("NOT over an unbounded between"))?;
            return ops.call("not", &[condition]).map(Some);
        }

        if name == "and" {
            let mut parts = vec![];
            for item in value.as_array().into_iter().flatten() {
                if let Some(part) = self.as_find_operator(item)? {
                    parts.push(part);
                }
            }
            return match parts.len() {
                0 => Ok(None),
                1 => Ok(parts.pop()),
                _ => ops.call("and", &parts).map(Some),
            };
        }

        let op: Operator = name
            .parse()
            .map_err(|_| invalid(format!("unknown operator '{}'", name)))?;
        let finalized = match op {
            Operator::Eq => return self.as_find_operator(&value),
            Operator::Ne => match value {
                Json::Null => {
                    let is_null = ops.call("isNull", &[])?;
                    ops.call("not", &[is_null])?
                }
                other => ops.call("not", &[other])?,
            },
            Operator::Gt => ops.call("moreThan", &[value])?,
            Operator::Gte => ops.call("moreThanOrEqual", &[value])?,
            Operator::Lt => ops.call("lessThan", &[value])?,
            Operator::Lte => ops.call("lessThanOrEqual", &[value])?,
            Operator::In => ops.call("in", &[value])?,
            Operator::NotIn => {
                let inner = ops.call("in", &[value])?;
                ops.call("not", &[inner])?
            }
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                let text = pattern_text(&value);
                let pattern = op.like_pattern(&text).unwrap_or(text);
                ops.call("like", &[Json::String(pattern)])?
            }
            Operator::Between => {
                let (lower, upper) = range_bounds(&value)
                    .ok_or_else(|| invalid(format!("between expects [lower, upper], got {}", value)))?;
                match (lower, upper) {
                    (Some(lower), Some(upper)) => {
                        ops.call("between", &[lower.clone(), upper.clone()])?
                    }
                    (Some(lower), None) => ops.call("moreThanOrEqual", &[lower.clone()])?,
                    (None, Some(upper)) => ops.call("lessThanOrEqual", &[upper.clone()])?,
                    (None, None) => return Ok(None),
                }
            }
        };
        Ok(Some(finalized))
    }
}

/// Pushes every `__qast_not__` payload down onto the fields it negates and
/// merges the result back into the object, until no negation key is left.
fn lower_negations(mut map: Map<String, Json>) -> Result<Map<String, Json>, FinalizeError> {
    while let Some(payload) = map.remove(NOT_MARKER) {
        let negated = negate(payload)?;
        map = merge_objects(map, negated);
    }
    Ok(map)
}

/// Field-wise negation of a negation payload, leaving conditions in
/// envelope form. Results of several negations merge the same way `and` does.
fn negate(payload: Json) -> Result<Map<String, Json>, FinalizeError> {
    if payload.is_array() {
        return Err(unsupported("NOT over an OR condition"));
    }
    if op_name(&payload) == Some("and") {
        // Several negations merged onto one object
        let items = match payload.get("value") {
            Some(Json::Array(items)) => items.clone(),
            _ => return Err(invalid(format!("'and' envelope without a list: {}", payload))),
        };
        return items
            .into_iter()
            .try_fold(Map::new(), |acc, item| Ok(merge_objects(acc, negate(item)?)));
    }

    let map = match payload {
        Json::Object(map) => map,
        other => return Err(invalid(format!("'not' payload {}", other))),
    };
    if map.len() > 1 {
        return Err(unsupported("NOT over a condition on more than one field"));
    }
    let Some((key, value)) = map.into_iter().next() else {
        return Ok(Map::new());
    };

    if key == NOT_MARKER {
        // not (not x) is x, unless x is itself several negations or an OR
        if value.is_array() || op_name(&value) == Some("and") {
            return Err(unsupported("NOT over an OR condition"));
        }
        return match value {
            Json::Object(inner) => Ok(inner),
            other => Err(invalid(format!("'not' payload {}", other))),
        };
    }

    let negated = if is_relation(&value) {
        Json::Object(negate(value)?)
    } else {
        envelope("not", value)
    };
    let mut out = Map::new();
    out.insert(key, negated);
    Ok(out)
}

fn op_name(value: &Json) -> Option<&str> {
    value.get(OPERATOR_MARKER).and_then(Json::as_str)
}

/// Nested relation object rather than a condition.
fn is_relation(value: &Json) -> bool {
    value.is_object() && value.get(OPERATOR_MARKER).is_none()
}

fn unsupported(message: &str) -> FinalizeError {
    FinalizeError::Unsupported {
        backend: BACKEND,
        message: message.to_string(),
    }
}

fn invalid(message: String) -> FinalizeError {
    FinalizeError::InvalidEnvelope {
        backend: BACKEND,
        message,
    }
}
