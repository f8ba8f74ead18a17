// tests/parser_tests.rs

use qast::ast::{LogicalKind, Node, Operator};
use qast::lexer::Lexer;
use qast::parser::{ParseError, Parser};
use qast::printer::to_query_string;
use qast::value::{Scalar, Value};

fn parse(input: &str) -> Node {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer).unwrap();
    parser.parse().unwrap()
}

fn parse_err(input: &str) -> ParseError {
    let lexer = Lexer::new(input);
    match Parser::new(lexer) {
        Ok(mut parser) => parser.parse().unwrap_err(),
        Err(e) => e,
    }
}

fn cmp(field: &str, op: Operator, value: impl Into<Scalar>) -> Node {
    Node::comparison(field, op, value.into())
}

// ============================================================================
// Comparisons
// ============================================================================

#[test]
fn test_comparison() {
    assert_eq!(parse("age gt 25"), cmp("age", Operator::Gt, 25i64));
}

#[test]
fn test_literal_kinds() {
    assert_eq!(parse("name eq \"John\""), cmp("name", Operator::Eq, "John"));
    assert_eq!(parse("score gte -1.5"), cmp("score", Operator::Gte, -1.5));
    assert_eq!(parse("active eq true"), cmp("active", Operator::Eq, true));
    assert_eq!(
        parse("deletedAt eq null"),
        Node::comparison("deletedAt", Operator::Eq, Scalar::Null)
    );
}

#[test]
fn test_in_list() {
    assert_eq!(
        parse("city in [\"Paris\", \"Tokyo\"]"),
        Node::comparison(
            "city",
            Operator::In,
            vec![Scalar::from("Paris"), Scalar::from("Tokyo")]
        )
    );
    assert_eq!(
        parse("age notIn []"),
        Node::comparison("age", Operator::NotIn, Vec::<Scalar>::new())
    );
}

#[test]
fn test_between_becomes_range() {
    assert_eq!(
        parse("createdAt between [\"2024-01-01\", \"2024-02-01\"]"),
        Node::Comparison {
            field: "createdAt".into(),
            op: Operator::Between,
            value: Value::Range("2024-01-01".into(), "2024-02-01".into()),
        }
    );
    assert_eq!(
        parse("age between [18, null]"),
        Node::Comparison {
            field: "age".into(),
            op: Operator::Between,
            value: Value::Range(Scalar::Integer(18), Scalar::Null),
        }
    );
}

#[test]
fn test_nested_field_path() {
    assert_eq!(
        parse("addresses[0].city eq \"Paris\""),
        cmp("addresses[0].city", Operator::Eq, "Paris")
    );
}

#[test]
fn test_list_on_scalar_operator_is_kept() {
    // Whether `eq` may take a list is a schema question for the validator
    assert_eq!(
        parse("tags eq [\"a\"]"),
        Node::comparison("tags", Operator::Eq, vec![Scalar::from("a")])
    );
}

// ============================================================================
// Precedence and associativity
// ============================================================================

#[test]
fn test_and_binds_tighter_than_or() {
    let expected = Node::or(
        Node::and(cmp("a", Operator::Eq, 1i64), cmp("b", Operator::Eq, 2i64)),
        cmp("c", Operator::Eq, 3i64),
    );
    assert_eq!(parse("a eq 1 and b eq 2 or c eq 3"), expected);

    let expected = Node::or(
        cmp("a", Operator::Eq, 1i64),
        Node::and(cmp("b", Operator::Eq, 2i64), cmp("c", Operator::Eq, 3i64)),
    );
    assert_eq!(parse("a eq 1 or b eq 2 and c eq 3"), expected);
}

#[test]
fn test_left_associative() {
    match parse("a eq 1 and b eq 2 and c eq 3") {
        Node::Logical {
            kind: LogicalKind::And,
            left,
            right,
        } => {
            assert!(left.is_logical());
            assert_eq!(*right, cmp("c", Operator::Eq, 3i64));
        }
        other => panic!("Expected and, got {:?}", other),
    }
}

#[test]
fn test_not_binds_tighter_than_and() {
    let expected = Node::and(
        Node::negate(cmp("age", Operator::Gt, 30i64)),
        cmp("x", Operator::Eq, 1i64),
    );
    assert_eq!(parse("not age gt 30 and x eq 1"), expected);
}

#[test]
fn test_double_not() {
    assert_eq!(
        parse("not not a eq 1"),
        Node::negate(Node::negate(cmp("a", Operator::Eq, 1i64)))
    );
}

#[test]
fn test_parentheses() {
    let expected = Node::and(
        cmp("age", Operator::Gt, 25i64),
        Node::or(
            cmp("city", Operator::Eq, "Paris"),
            cmp("city", Operator::Eq, "Tokyo"),
        ),
    );
    assert_eq!(
        parse("age gt 25 and (city eq \"Paris\" or city eq \"Tokyo\")"),
        expected
    );
    assert_eq!(parse("((age gt 25))"), cmp("age", Operator::Gt, 25i64));
}

#[test]
fn test_not_over_group() {
    assert_eq!(
        parse("not (a eq 1 or b eq 2)"),
        Node::negate(Node::or(cmp("a", Operator::Eq, 1i64), cmp("b", Operator::Eq, 2i64)))
    );
}

// ============================================================================
// Round trip through the printer
// ============================================================================

#[test]
fn test_print_round_trip() {
    let queries = [
        "age gt 25",
        "name eq \"quote \\\" and \\\\ slash\\n\"",
        "score lt -2.0",
        "ratio gte 0.25",
        "active ne false",
        "deletedAt eq null",
        "city in [\"Paris\", 'Tokyo', 3]",
        "age notIn []",
        "age between [null, 65]",
        "a eq 1 and (b eq 2 or not c eq 3)",
        "a eq 1 and (b eq 2 and c eq 3)",
        "not (a eq 1 and b eq 2) or c startsWith \"x\"",
    ];
    for query in queries {
        let ast = parse(query);
        let printed = to_query_string(&ast);
        assert_eq!(parse(&printed), ast, "Round trip failed for {} -> {}", query, printed);
    }
}

#[test]
fn test_whole_float_stays_float() {
    let ast = parse("x eq 2.0");
    assert_eq!(ast, cmp("x", Operator::Eq, 2.0));
    assert_eq!(to_query_string(&ast), "x eq 2.0");
}

// ============================================================================
// Errors
// ============================================================================

fn syntax_message(err: &ParseError) -> &str {
    match err {
        ParseError::Syntax { message, .. } => message,
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_empty_query() {
    let err = parse_err("   ");
    assert_eq!(syntax_message(&err), "Empty query");
    assert_eq!(err.position(), 3);
}

#[test]
fn test_missing_parts() {
    let cases = [
        ("gt 5", "Expected field name", 0),
        ("age 5", "Expected operator after field 'age'", 4),
        ("age gt", "Expected value after operator 'gt'", 6),
        ("age gt and", "Expected value after operator 'gt'", 7),
        ("(age gt 5", "Expected ')'", 9),
        ("age gt 5 and", "Expected field name", 12),
        ("not", "Expected field name", 3),
    ];
    for (input, message, position) in cases {
        let err = parse_err(input);
        assert_eq!(syntax_message(&err), message, "for {}", input);
        assert_eq!(err.position(), position, "for {}", input);
    }
}

#[test]
fn test_missing_parts_report_found_token() {
    let cases = [
        ("gt 5", "operator 'gt'"),
        ("age gt and", "'and'"),
        ("age gt (5)", "'('"),
        ("age gt", "end of input"),
        ("age eq 1 and or", "'or'"),
    ];
    for (input, found) in cases {
        match parse_err(input) {
            ParseError::Syntax { found: actual, .. } => assert_eq!(actual, found, "for {}", input),
            other => panic!("Expected syntax error for {}, got {:?}", input, other),
        }
    }
}

#[test]
fn test_leftover_tokens() {
    let err = parse_err("age gt 5 name eq 1");
    assert_eq!(syntax_message(&err), "Unexpected token after expression");
    assert_eq!(err.position(), 9);

    let err = parse_err("age gt 5)");
    assert_eq!(syntax_message(&err), "Unexpected token after expression");
}

#[test]
fn test_in_requires_list() {
    let err = parse_err("age in 5");
    assert_eq!(syntax_message(&err), "Operator 'in' requires an array value");
    assert_eq!(err.position(), 7);
}

#[test]
fn test_between_requires_pair() {
    for input in ["age between 5", "age between [1]", "age between [1, 2, 3]"] {
        let err = parse_err(input);
        assert_eq!(
            syntax_message(&err),
            "Operator 'between' requires an array of exactly 2 values",
            "for {}",
            input
        );
    }
}

#[test]
fn test_error_display() {
    let err = parse_err("age 5");
    assert_eq!(
        err.to_string(),
        "Parse error at position 4: Expected operator after field 'age', found integer literal"
    );
}

#[test]
fn test_lex_error_passes_through() {
    assert!(matches!(parse_err("age gt 5 # 1"), ParseError::Lex(_)));
    assert!(matches!(parse_err("# 1"), ParseError::Lex(_)));
}

// ============================================================================
// Nesting ceiling
// ============================================================================

#[test]
fn test_deep_parentheses_are_rejected() {
    let depth = 10_000;
    let query = format!("{}a eq 1{}", "(".repeat(depth), ")".repeat(depth));
    let err = parse_err(&query);
    assert_eq!(
        err,
        ParseError::NestingTooDeep {
            max: qast::parser::DEFAULT_MAX_NESTING,
            position: qast::parser::DEFAULT_MAX_NESTING,
        }
    );
}

#[test]
fn test_deep_not_chain_is_rejected() {
    let query = format!("{}a eq 1", "not ".repeat(10_000));
    assert!(matches!(parse_err(&query), ParseError::NestingTooDeep { .. }));
}

#[test]
fn test_long_flat_chains_are_rejected() {
    for joiner in [" and ", " or "] {
        let query = vec!["a eq 1"; 50_000].join(joiner);
        assert!(
            matches!(parse_err(&query), ParseError::NestingTooDeep { .. }),
            "for {} chain",
            joiner.trim()
        );
    }
}

#[test]
fn test_chain_ceiling_reported_at_operator() {
    let max = qast::parser::DEFAULT_MAX_NESTING;
    let at_ceiling = vec!["a eq 1"; max + 1].join(" and ");
    assert!(matches!(parse(&at_ceiling), Node::Logical { .. }));

    // "a eq 1" then " and a eq 1" repeated; the rejected `and` is the one past the ceiling
    let too_long = vec!["a eq 1"; max + 2].join(" and ");
    assert_eq!(
        parse_err(&too_long),
        ParseError::NestingTooDeep {
            max,
            position: 7 + 11 * max,
        }
    );
}

#[test]
fn test_custom_nesting_ceiling() {
    let parser = |q: &str| Parser::new(Lexer::new(q)).unwrap().with_max_nesting(2);
    assert!(parser("((a eq 1))").parse().is_ok());
    assert!(matches!(
        parser("(((a eq 1)))").parse(),
        Err(ParseError::NestingTooDeep { max: 2, position: 2 })
    ));
    assert!(parser("not (a eq 1)").parse().is_ok());
    assert!(parser("not not (a eq 1)").parse().is_err());

    assert!(parser("a eq 1 and b eq 2 or c eq 3").parse().is_ok());
    assert!(parser("a eq 1 and b eq 2 and c eq 3").parse().is_ok());
    assert!(matches!(
        parser("a eq 1 and b eq 2 and c eq 3 and d eq 4").parse(),
        Err(ParseError::NestingTooDeep { max: 2, position: 29 })
    ));
}
