use std::collections::HashMap;

use serde_json::{Map, Value as Json};

use super::{FinalizeError, pattern_text, range_bounds};
use crate::ast::Operator;
use crate::compile::{LOGICAL_MARKER, OPERATOR_MARKER};

const BACKEND: &str = "Sequelize";

/// Maps operator names (`and`, `or`, `not`, `ne`, `gt`, `gte`, `lt`, `lte`,
/// `in`, `notIn`, `like`, `between`) to the keys Sequelize should see.
#[derive(Debug, Clone, Default)]
pub struct SequelizeOperators {
    symbols: HashMap<String, String>,
}

impl SequelizeOperators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.symbols.insert(name.into(), symbol.into());
        self
    }

    /// The `$gt`-style string aliases.
    pub fn aliases() -> Self {
        [
            "and", "or", "not", "ne", "gt", "gte", "lt", "lte", "in", "notIn", "like", "between",
        ]
        .into_iter()
        .fold(Self::new(), |table, name| {
            table.with(name, format!("${}", name))
        })
    }

    fn symbol(&self, name: &str) -> Result<String, FinalizeError> {
        self.symbols
            .get(name)
            .cloned()
            .ok_or_else(|| FinalizeError::MissingOperator {
                backend: BACKEND,
                name: name.to_string(),
            })
    }

    fn keyed(&self, name: &str, value: Json) -> Result<Json, FinalizeError> {
        let mut map = Map::new();
        map.insert(self.symbol(name)?, value);
        Ok(Json::Object(map))
    }
}

/// Replaces the envelopes in [`crate::compile_sequelize`] output with the
/// table's symbols.
pub fn finalize_sequelize(
    filter: &Json,
    operators: &SequelizeOperators,
) -> Result<Json, FinalizeError> {
    let finalized = Finalizer { operators }.finalize(filter)?;
    tracing::debug!(backend = BACKEND, "finalized filter");
    Ok(finalized)
}

struct Finalizer<'a> {
    operators: &'a SequelizeOperators,
}

impl Finalizer<'_> {
    fn finalize(&self, value: &Json) -> Result<Json, FinalizeError> {
        let Some(map) = value.as_object() else {
            return Err(invalid(format!("expected an object, got {}", value)));
        };

        match map.get(LOGICAL_MARKER) {
            Some(kind) => self.finalize_logical(kind, map),
            None => self.finalize_fields(map),
        }
    }

    fn finalize_logical(&self, kind: &Json, map: &Map<String, Json>) -> Result<Json, FinalizeError> {
        match kind.as_str() {
            Some(kind @ ("and" | "or")) => {
                let conditions = map
                    .get("conditions")
                    .and_then(Json::as_array)
                    .ok_or_else(|| invalid(format!("'{}' group without conditions", kind)))?;
                let finalized = conditions
                    .iter()
                    .map(|c| self.finalize(c))
                    .collect::<Result<Vec<_>, _>>()?;
                self.operators.keyed(kind, Json::Array(finalized))
            }
            Some("not") => {
                let condition = map
                    .get("condition")
                    .ok_or_else(|| invalid("'not' without condition".to_string()))?;
                self.operators.keyed("not", self.finalize(condition)?)
            }
            _ => Err(invalid(format!("unknown logical kind {}", kind))),
        }
    }

    fn finalize_fields(&self, map: &Map<String, Json>) -> Result<Json, FinalizeError> {
        let mut out = Map::new();
        for (field, condition) in map {
            if let Some(condition) = self.finalize_condition(condition)? {
                out.insert(field.clone(), condition);
            }
        }
        Ok(Json::Object(out))
    }

    /// `None` for a condition that matches everything (unbounded `between`).
    fn finalize_condition(&self, condition: &Json) -> Result<Option<Json>, FinalizeError> {
        let Some(op) = condition.get(OPERATOR_MARKER) else {
            return Ok(Some(condition.clone()));
        };
        let op: Operator = op
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| invalid(format!("unknown operator {}", op)))?;
        let value = condition.get("value").cloned().unwrap_or(Json::Null);
        let ops = self.operators;

        let finalized = match op {
            Operator::Eq => value,
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                let text = pattern_text(&value);
                let pattern = op.like_pattern(&text).unwrap_or(text);
                ops.keyed("like", Json::String(pattern))?
            }
            Operator::Between => {
                let (lower, upper) = range_bounds(&value)
                    .ok_or_else(|| invalid(format!("between expects [lower, upper], got {}", value)))?;
                match (lower, upper) {
                    (Some(lower), Some(upper)) => ops.keyed(
                        "between",
                        Json::Array(vec![lower.clone(), upper.clone()]),
                    )?,
                    (Some(lower), None) => ops.keyed("gte", lower.clone())?,
                    (None, Some(upper)) => ops.keyed("lte", upper.clone())?,
                    (None, None) => return Ok(None),
                }
            }
            op => ops.keyed(op.as_str(), value)?,
        };
        Ok(Some(finalized))
    }
}

fn invalid(message: String) -> FinalizeError {
    FinalizeError::InvalidEnvelope {
        backend: BACKEND,
        message,
    }
}
