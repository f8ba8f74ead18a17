use crate::ast::{Node, Operator};

/// Field names used by `node`, in first-seen order, without duplicates.
///
/// # Examples
///
/// ```
/// let ast = qast::parse("age gt 25 and (city eq \"Paris\" or age lt 60)").unwrap();
/// assert_eq!(qast::extract_fields(&ast), vec!["age", "city"]);
/// ```
pub fn extract_fields(node: &Node) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    visit_comparisons(node, &mut |field, _| {
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    });
    fields
}

/// Operators used by `node`, in first-seen order, without duplicates.
pub fn extract_operators(node: &Node) -> Vec<Operator> {
    let mut operators = Vec::new();
    visit_comparisons(node, &mut |_, op| {
        if !operators.contains(&op) {
            operators.push(op);
        }
    });
    operators
}

/// Calls `visit` for every comparison, left to right.
fn visit_comparisons(node: &Node, visit: &mut impl FnMut(&str, Operator)) {
    match node {
        Node::Comparison { field, op, .. } => visit(field, *op),
        Node::Logical { left, right, .. } => {
            visit_comparisons(left, visit);
            visit_comparisons(right, visit);
        }
        Node::Not(child) => visit_comparisons(child, visit),
    }
}
