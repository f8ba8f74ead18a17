//! Query text serialization for parsed trees.
//!
//! Printing is the inverse of parsing: `parse(to_query_string(&ast))` yields
//! `ast` again.
//!
//! - **Grouping** - nested logical nodes are always parenthesized, so the
//!   printed text never leans on precedence or associativity
//! - **String escaping** - quotes, backslashes, `\n`, `\r` and `\t`
//! - **Type preservation** - whole floats keep a fraction (`2.0`) so they do
//!   not come back as integers
//!
//! # Examples
//!
//! ```
//! use qast::printer::to_query_string;
//!
//! let ast = qast::parse(r#"not (age gt 25 or name eq "Jo")"#).unwrap();
//! assert_eq!(to_query_string(&ast), r#"not (age gt 25 or name eq "Jo")"#);
//! ```

use std::fmt;

use crate::{
    ast::Node,
    value::{Scalar, Value},
};

pub struct QueryPrinter;

impl QueryPrinter {
    pub fn print(&self, node: &Node) -> String {
        self.print_node(node)
    }

    fn print_node(&self, node: &Node) -> String {
        match node {
            Node::Comparison { field, op, value } => {
                format!("{} {} {}", field, op, self.print_value(value))
            }
            Node::Logical { kind, left, right } => format!(
                "{} {} {}",
                self.print_operand(left),
                kind,
                self.print_operand(right)
            ),
            Node::Not(child) => format!("not {}", self.print_operand(child)),
        }
    }

    fn print_operand(&self, node: &Node) -> String {
        if node.is_logical() {
            format!("({})", self.print_node(node))
        } else {
            self.print_node(node)
        }
    }

    fn print_value(&self, value: &Value) -> String {
        match value {
            Value::Scalar(s) => self.print_scalar(s),
            Value::List(items) => self.print_list(items.iter()),
            Value::Range(lower, upper) => self.print_list([lower, upper].into_iter()),
        }
    }

    fn print_list<'a>(&self, items: impl Iterator<Item = &'a Scalar>) -> String {
        let items: Vec<String> = items.map(|s| self.print_scalar(s)).collect();
        format!("[{}]", items.join(", "))
    }

    fn print_scalar(&self, scalar: &Scalar) -> String {
        match scalar {
            Scalar::Null => "null".to_string(),
            Scalar::Boolean(b) => b.to_string(),
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(n) if n.is_finite() && n.fract() == 0.0 => format!("{:.1}", n),
            Scalar::Float(n) => n.to_string(),
            Scalar::String(s) => format!("\"{}\"", self.escape_string(s)),
        }
    }

    fn escape_string(&self, s: &str) -> String {
        s.chars()
            .flat_map(|c| match c {
                '"' => vec!['\\', '"'],
                '\\' => vec!['\\', '\\'],
                '\n' => vec!['\\', 'n'],
                '\r' => vec!['\\', 'r'],
                '\t' => vec!['\\', 't'],
                c => vec![c],
            })
            .collect()
    }
}

/// Converts a tree back to query text.
pub fn to_query_string(node: &Node) -> String {
    QueryPrinter.print(node)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_query_string(self))
    }
}
