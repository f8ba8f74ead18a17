use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison operators.
///
/// The keyword spelling is the serde name and the `Display` form, so
/// `Operator::NotIn` reads and prints as `notIn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    /// Equal (`eq`)
    Eq,
    /// Not equal (`ne`)
    Ne,
    /// Greater than (`gt`)
    Gt,
    /// Less than (`lt`)
    Lt,
    /// Greater than or equal (`gte`)
    Gte,
    /// Less than or equal (`lte`)
    Lte,

    // Membership
    /// Value is one of a list (`in`)
    In,
    /// Value is none of a list (`notIn`)
    NotIn,

    // Pattern
    /// Substring match (`contains`)
    Contains,
    /// Prefix match (`startsWith`)
    StartsWith,
    /// Suffix match (`endsWith`)
    EndsWith,

    // Range
    /// Inclusive range (`between`)
    Between,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Between,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::Between => "between",
        }
    }

    /// `in` and `notIn` take a list.
    pub fn takes_list(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// `contains`, `startsWith` and `endsWith` take a string pattern.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Operator::Contains | Operator::StartsWith | Operator::EndsWith
        )
    }

    /// SQL LIKE pattern for the pattern operators.
    pub fn like_pattern(self, text: &str) -> Option<String> {
        match self {
            Operator::Contains => Some(format!("%{}%", text)),
            Operator::StartsWith => Some(format!("{}%", text)),
            Operator::EndsWith => Some(format!("%{}", text)),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("Unknown operator '{}'", s))
    }
}

/// Binary logical combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKind {
    /// Logical AND (`and`)
    And,
    /// Logical OR (`or`)
    Or,
}

impl LogicalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalKind::And => "and",
            LogicalKind::Or => "or",
        }
    }
}

impl fmt::Display for LogicalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator keywords, longest first so the lexer can take the first hit as the
/// longest match (`notIn` before `ne`, `gte` before `gt`).
pub const OPERATOR_KEYWORDS: &[(&str, Operator)] = &[
    ("startsWith", Operator::StartsWith),
    ("contains", Operator::Contains),
    ("endsWith", Operator::EndsWith),
    ("between", Operator::Between),
    ("notIn", Operator::NotIn),
    ("gte", Operator::Gte),
    ("lte", Operator::Lte),
    ("eq", Operator::Eq),
    ("ne", Operator::Ne),
    ("gt", Operator::Gt),
    ("lt", Operator::Lt),
    ("in", Operator::In),
];

/// Logical keywords. `not` is unary and has no `LogicalKind`.
pub const LOGICAL_KEYWORDS: &[&str] = &["and", "not", "or"];
