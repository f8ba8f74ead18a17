//! Parameterized SQL `WHERE` fragments (PostgreSQL `$n` placeholders).
//!
//! Every node compiles to a parenthesized fragment. Values are always bound
//! as parameters and never spliced into the text; identifiers are quoted per
//! dot segment with embedded quotes doubled.
//!
//! ```text
//! not age gt 30              →  (NOT ("age" > $1))                   [30]
//! a eq 1 and b eq null       →  (("a" = $1) AND ("b" IS NULL))       [1]
//! profile.city in ["x","y"]  →  ("profile"."city" IN ($1, $2))       ["x", "y"]
//! ```
//!
//! LIKE wildcards (`%`, `_`) inside pattern values are passed through as-is.
//! A list on a scalar operator (`tags eq ["a", "b"]`) is bound as a single
//! array parameter; pattern operators reject lists.

use serde::Serialize;
use serde_json::Value as Json;

use super::{CompileError, FilterCompiler, invalid_node, unsupported_value};
use crate::ast::{LogicalKind, Node, Operator};
use crate::value::{Scalar, Value};

/// SQL text plus the values for its `$1..$n` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    pub text: String,
    pub params: Vec<Json>,
}

/// Drizzle's `sql` template takes the same text/params pair.
pub type DrizzleQuery = SqlQuery;

pub struct Sql;

pub struct Drizzle;

impl FilterCompiler for Sql {
    type Output = SqlQuery;

    fn compile(&self, node: &Node) -> Result<SqlQuery, CompileError> {
        compile_sql(node)
    }
}

impl FilterCompiler for Drizzle {
    type Output = DrizzleQuery;

    fn compile(&self, node: &Node) -> Result<DrizzleQuery, CompileError> {
        compile_drizzle(node)
    }
}

pub fn compile_sql(node: &Node) -> Result<SqlQuery, CompileError> {
    let mut builder = SqlBuilder::default();
    let text = builder.compile_node(node)?;
    tracing::debug!(backend = "sql", params = builder.params.len(), "compiled filter");
    Ok(SqlQuery {
        text,
        params: builder.params,
    })
}

pub fn compile_drizzle(node: &Node) -> Result<DrizzleQuery, CompileError> {
    compile_sql(node)
}

/// `"a"."b"` for `a.b`, doubling any `"` inside a segment.
pub fn quote_identifier(field: &str) -> String {
    field
        .split('.')
        .map(|segment| format!("\"{}\"", segment.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

#[derive(Default)]
struct SqlBuilder {
    params: Vec<Json>,
}

impl SqlBuilder {
    fn bind(&mut self, value: Json) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn compile_node(&mut self, node: &Node) -> Result<String, CompileError> {
        match node {
            Node::Comparison { field, op, value } => self.compile_comparison(field, *op, value),
            Node::Logical { kind, .. } => {
                let mut operands = vec![];
                collect_operands(node, *kind, &mut operands);
                let mut parts = Vec::with_capacity(operands.len());
                for operand in operands {
                    parts.push(self.compile_node(operand)?);
                }
                let joiner = match kind {
                    LogicalKind::And => " AND ",
                    LogicalKind::Or => " OR ",
                };
                Ok(format!("({})", parts.join(joiner)))
            }
            Node::Not(child) => Ok(format!("(NOT {})", self.compile_node(child)?)),
        }
    }

    fn compile_comparison(
        &mut self,
        field: &str,
        op: Operator,
        value: &Value,
    ) -> Result<String, CompileError> {
        if !Node::has_valid_shape(op, value) {
            return Err(invalid_node(field, op, value));
        }
        let column = quote_identifier(field);

        let fragment = match op {
            Operator::Eq | Operator::Ne => match (op, value) {
                (Operator::Eq, Value::Scalar(Scalar::Null)) => format!("{} IS NULL", column),
                (_, Value::Scalar(Scalar::Null)) => format!("{} IS NOT NULL", column),
                // A list compares against an array column as one bound array
                (Operator::Eq, _) => format!("{} = {}", column, self.bind(value.to_json())),
                (_, _) => format!("{} <> {}", column, self.bind(value.to_json())),
            },
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                let symbol = match op {
                    Operator::Gt => ">",
                    Operator::Gte => ">=",
                    Operator::Lt => "<",
                    _ => "<=",
                };
                format!("{} {} {}", column, symbol, self.bind(value.to_json()))
            }
            Operator::In | Operator::NotIn => {
                let items = value
                    .as_list()
                    .ok_or_else(|| invalid_node(field, op, value))?;
                if items.is_empty() {
                    return Err(CompileError::EmptyList {
                        field: field.to_string(),
                        operator: op,
                    });
                }
                let placeholders: Vec<String> =
                    items.iter().map(|item| self.bind(item.to_json())).collect();
                let keyword = if op == Operator::In { "IN" } else { "NOT IN" };
                format!("{} {} ({})", column, keyword, placeholders.join(", "))
            }
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                let text = match value {
                    Value::Scalar(scalar) => scalar.as_text(),
                    Value::List(_) => return Err(unsupported_value(field, op, value)),
                    Value::Range(..) => return Err(invalid_node(field, op, value)),
                };
                let pattern = op.like_pattern(&text).unwrap_or(text);
                format!("{} LIKE {}", column, self.bind(Json::String(pattern)))
            }
            Operator::Between => {
                let (lower, upper) = value
                    .as_range()
                    .ok_or_else(|| invalid_node(field, op, value))?;
                match (lower, upper) {
                    (Some(lower), Some(upper)) => {
                        let lower = self.bind(lower.to_json());
                        let upper = self.bind(upper.to_json());
                        format!("{} BETWEEN {} AND {}", column, lower, upper)
                    }
                    (Some(lower), None) => format!("{} >= {}", column, self.bind(lower.to_json())),
                    (None, Some(upper)) => format!("{} <= {}", column, self.bind(upper.to_json())),
                    (None, None) => "1=1".to_string(),
                }
            }
        };
        Ok(format!("({})", fragment))
    }
}

/// Operands of a same-kind chain, so `a and b and c` joins at one level.
fn collect_operands<'a>(node: &'a Node, kind: LogicalKind, out: &mut Vec<&'a Node>) {
    match node {
        Node::Logical {
            kind: k,
            left,
            right,
        } if *k == kind => {
            collect_operands(left, kind, out);
            collect_operands(right, kind, out);
        }
        other => out.push(other),
    }
}
