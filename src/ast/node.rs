use crate::ast::{LogicalKind, Operator};
use crate::value::Value;

/// Abstract Syntax Tree node representing a parsed filter.
///
/// A closed tagged union: every traversal matches on the variant, no node
/// carries behavior. Trees are plain values with no sharing between nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Leaf comparison
    ///
    /// # Example
    /// ```text
    /// age gt 25
    /// city in ["Paris", "Tokyo"]
    /// ```
    Comparison {
        field: String,
        op: Operator,
        value: Value,
    },

    /// Binary `and` / `or`
    ///
    /// # Example
    /// ```text
    /// age gt 25 and city eq "Paris"
    /// ```
    Logical {
        kind: LogicalKind,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Unary `not`
    Not(Box<Node>),
}

impl Node {
    pub fn comparison(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Node::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Node::Logical {
            kind: LogicalKind::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Node, right: Node) -> Self {
        Node::Logical {
            kind: LogicalKind::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(child: Node) -> Self {
        Node::Not(Box::new(child))
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, Node::Comparison { .. })
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Node::Logical { .. })
    }

    pub fn is_not(&self) -> bool {
        matches!(self, Node::Not(_))
    }

    /// Checks the operator/value pairing a parser-built tree always satisfies:
    /// `in`/`notIn` carry a list, `between` a range, everything else a scalar
    /// (or a list, which some fields accept for `eq`-style operators).
    pub fn has_valid_shape(op: Operator, value: &Value) -> bool {
        match op {
            Operator::In | Operator::NotIn => matches!(value, Value::List(_)),
            Operator::Between => matches!(value, Value::Range(..)),
            _ => !matches!(value, Value::Range(..)),
        }
    }
}
