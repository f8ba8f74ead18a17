//! Structural cost of a filter tree.
//!
//! Depth, node count and clause count are measured in one post-order walk and
//! compared against optional caller limits before a tree reaches a backend.

use std::fmt;

use thiserror::Error;

use crate::ast::Node;

/// Measured size of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryComplexity {
    /// Comparison = 1, `not` = child + 1, logical = max(left, right) + 1
    pub depth: usize,
    /// Every node counts once
    pub nodes: usize,
    /// Comparison leaves only
    pub clauses: usize,
}

/// Optional upper bounds; `None` is unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplexityLimits {
    pub max_depth: Option<usize>,
    pub max_nodes: Option<usize>,
    pub max_clauses: Option<usize>,
}

impl ComplexityLimits {
    pub fn is_unbounded(&self) -> bool {
        self.max_depth.is_none() && self.max_nodes.is_none() && self.max_clauses.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplexityLimit {
    Depth,
    Nodes,
    Clauses,
}

impl fmt::Display for ComplexityLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComplexityLimit::Depth => "maxDepth",
            ComplexityLimit::Nodes => "maxNodes",
            ComplexityLimit::Clauses => "maxClauses",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Query complexity limit exceeded: {limit} is {max}, query has {actual}")]
pub struct ComplexityError {
    pub limit: ComplexityLimit,
    pub max: usize,
    pub actual: usize,
}

pub fn measure(node: &Node) -> QueryComplexity {
    match node {
        Node::Comparison { .. } => QueryComplexity {
            depth: 1,
            nodes: 1,
            clauses: 1,
        },
        Node::Not(child) => {
            let inner = measure(child);
            QueryComplexity {
                depth: inner.depth + 1,
                nodes: inner.nodes + 1,
                clauses: inner.clauses,
            }
        }
        Node::Logical { left, right, .. } => {
            let l = measure(left);
            let r = measure(right);
            QueryComplexity {
                depth: l.depth.max(r.depth) + 1,
                nodes: l.nodes + r.nodes + 1,
                clauses: l.clauses + r.clauses,
            }
        }
    }
}

/// Measures `node` and fails on the first exceeded limit (depth, then nodes,
/// then clauses).
pub fn check_complexity(
    node: &Node,
    limits: &ComplexityLimits,
) -> Result<QueryComplexity, ComplexityError> {
    let measured = measure(node);
    tracing::debug!(
        depth = measured.depth,
        nodes = measured.nodes,
        clauses = measured.clauses,
        "measured query complexity"
    );

    let checks = [
        (ComplexityLimit::Depth, limits.max_depth, measured.depth),
        (ComplexityLimit::Nodes, limits.max_nodes, measured.nodes),
        (ComplexityLimit::Clauses, limits.max_clauses, measured.clauses),
    ];
    for (limit, max, actual) in checks {
        if let Some(max) = max {
            if actual > max {
                return Err(ComplexityError { limit, max, actual });
            }
        }
    }
    Ok(measured)
}
