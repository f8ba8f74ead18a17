// tests/finalize_tests.rs

use qast::finalize::{FinalizeError, SequelizeOperators, TypeOrmOperators, finalize_sequelize, finalize_typeorm};
use qast::{compile_sequelize, compile_typeorm, parse};
use serde_json::{Value as Json, json};

fn sequelize(query: &str) -> Result<Json, FinalizeError> {
    let compiled = compile_sequelize(&parse(query).unwrap()).unwrap();
    finalize_sequelize(&compiled, &SequelizeOperators::aliases())
}

/// Operator table that records each call as `{"Name": [args...]}`.
fn typeorm_table() -> TypeOrmOperators {
    [
        ("equal", "Equal"),
        ("not", "Not"),
        ("moreThan", "MoreThan"),
        ("moreThanOrEqual", "MoreThanOrEqual"),
        ("lessThan", "LessThan"),
        ("lessThanOrEqual", "LessThanOrEqual"),
        ("in", "In"),
        ("like", "Like"),
        ("between", "Between"),
        ("isNull", "IsNull"),
        ("and", "And"),
    ]
    .into_iter()
    .fold(TypeOrmOperators::new(), |table, (name, label)| {
        table.with(name, move |args: &[Json]| json!({ label: args }))
    })
}

fn typeorm(query: &str) -> Result<Json, FinalizeError> {
    let compiled = compile_typeorm(&parse(query).unwrap()).unwrap();
    finalize_typeorm(&compiled, &typeorm_table())
}

// ============================================================================
// Sequelize
// ============================================================================

#[test]
fn test_sequelize_operators() {
    let cases = [
        ("a eq 1", json!({"a": 1})),
        ("a ne 1", json!({"a": {"$ne": 1}})),
        ("a gt 1", json!({"a": {"$gt": 1}})),
        ("a gte 1", json!({"a": {"$gte": 1}})),
        ("a lt 1", json!({"a": {"$lt": 1}})),
        ("a lte 1", json!({"a": {"$lte": 1}})),
        ("a in [1, 2]", json!({"a": {"$in": [1, 2]}})),
        ("a notIn [1]", json!({"a": {"$notIn": [1]}})),
        ("a contains \"x\"", json!({"a": {"$like": "%x%"}})),
        ("a startsWith \"x\"", json!({"a": {"$like": "x%"}})),
        ("a endsWith \"x\"", json!({"a": {"$like": "%x"}})),
        ("a between [1, 2]", json!({"a": {"$between": [1, 2]}})),
        ("a between [1, null]", json!({"a": {"$gte": 1}})),
        ("a between [null, 2]", json!({"a": {"$lte": 2}})),
        ("a between [null, null]", json!({})),
    ];
    for (query, expected) in cases {
        assert_eq!(sequelize(query).unwrap(), expected, "for {}", query);
    }
}

#[test]
fn test_sequelize_logical() {
    assert_eq!(
        sequelize("a eq 1 and (b eq 2 or not c gt 3)").unwrap(),
        json!({"$and": [
            {"a": 1},
            {"$or": [{"b": 2}, {"$not": {"c": {"$gt": 3}}}]}
        ]})
    );
}

#[test]
fn test_sequelize_unbounded_between_in_group() {
    // An empty object inside `$and` matches every row
    assert_eq!(
        sequelize("a eq 1 and b between [null, null]").unwrap(),
        json!({"$and": [{"a": 1}, {}]})
    );
    assert_eq!(
        sequelize("a eq 1 or b between [null, null]").unwrap(),
        json!({"$or": [{"a": 1}, {}]})
    );
}

#[test]
fn test_sequelize_custom_symbols() {
    let table = SequelizeOperators::new()
        .with("and", "Symbol(and)")
        .with("gt", "Symbol(gt)");
    let compiled = compile_sequelize(&parse("a gt 1 and b eq 2").unwrap()).unwrap();
    assert_eq!(
        finalize_sequelize(&compiled, &table).unwrap(),
        json!({"Symbol(and)": [{"a": {"Symbol(gt)": 1}}, {"b": 2}]})
    );
}

#[test]
fn test_sequelize_missing_symbol() {
    let table = SequelizeOperators::new().with("and", "$and");
    let compiled = compile_sequelize(&parse("a eq 1 and b contains \"x\"").unwrap()).unwrap();
    let err = finalize_sequelize(&compiled, &table).unwrap_err();
    assert_eq!(
        err,
        FinalizeError::MissingOperator {
            backend: "Sequelize",
            name: "like".into(),
        }
    );
    assert_eq!(err.to_string(), "Sequelize operator table has no entry for 'like'");
}

#[test]
fn test_sequelize_rejects_foreign_input() {
    let table = SequelizeOperators::aliases();
    assert!(matches!(
        finalize_sequelize(&json!([1, 2]), &table),
        Err(FinalizeError::InvalidEnvelope { .. })
    ));
    assert!(matches!(
        finalize_sequelize(&json!({"__qast_logical__": "xor", "conditions": []}), &table),
        Err(FinalizeError::InvalidEnvelope { .. })
    ));
    assert!(matches!(
        finalize_sequelize(&json!({"a": {"__qast_operator__": "near", "value": 1}}), &table),
        Err(FinalizeError::InvalidEnvelope { .. })
    ));
}

// ============================================================================
// TypeORM
// ============================================================================

#[test]
fn test_typeorm_operators() {
    let cases = [
        ("a eq 1", json!({"a": 1})),
        ("a eq null", json!({"a": {"IsNull": []}})),
        ("a ne 1", json!({"a": {"Not": [1]}})),
        ("a ne null", json!({"a": {"Not": [{"IsNull": []}]}})),
        ("a gt 1", json!({"a": {"MoreThan": [1]}})),
        ("a gte 1", json!({"a": {"MoreThanOrEqual": [1]}})),
        ("a lt 1", json!({"a": {"LessThan": [1]}})),
        ("a lte 1", json!({"a": {"LessThanOrEqual": [1]}})),
        ("a in [1, 2]", json!({"a": {"In": [[1, 2]]}})),
        ("a notIn [1]", json!({"a": {"Not": [{"In": [[1]]}]}})),
        ("a contains \"x\"", json!({"a": {"Like": ["%x%"]}})),
        ("a startsWith \"x\"", json!({"a": {"Like": ["x%"]}})),
        ("a endsWith \"x\"", json!({"a": {"Like": ["%x"]}})),
        ("a between [1, 2]", json!({"a": {"Between": [1, 2]}})),
        ("a between [1, null]", json!({"a": {"MoreThanOrEqual": [1]}})),
        ("a between [null, 2]", json!({"a": {"LessThanOrEqual": [2]}})),
        ("a between [null, null]", json!({})),
    ];
    for (query, expected) in cases {
        assert_eq!(typeorm(query).unwrap(), expected, "for {}", query);
    }
}

#[test]
fn test_typeorm_or_branches() {
    assert_eq!(
        typeorm("a gt 1 or b eq 2").unwrap(),
        json!([{"a": {"MoreThan": [1]}}, {"b": 2}])
    );
}

#[test]
fn test_typeorm_same_field() {
    assert_eq!(
        typeorm("age gt 18 and age lt 65").unwrap(),
        json!({"age": {"And": [{"MoreThan": [18]}, {"LessThan": [65]}]}})
    );
    assert_eq!(
        typeorm("age gte 18 and age eq 30").unwrap(),
        json!({"age": {"And": [{"MoreThanOrEqual": [18]}, {"Equal": [30]}]}})
    );
}

#[test]
fn test_typeorm_not() {
    assert_eq!(
        typeorm("not age gt 30").unwrap(),
        json!({"age": {"Not": [{"MoreThan": [30]}]}})
    );
    assert_eq!(
        typeorm("not name eq \"x\"").unwrap(),
        json!({"name": {"Not": [{"Equal": ["x"]}]}})
    );
    assert_eq!(
        typeorm("a eq 1 and not b eq null").unwrap(),
        json!({"a": 1, "b": {"Not": [{"IsNull": []}]}})
    );
}

#[test]
fn test_typeorm_double_not() {
    assert_eq!(typeorm("not not a gt 1").unwrap(), json!({"a": {"MoreThan": [1]}}));
}

#[test]
fn test_typeorm_double_not_over_merged_negations_is_unsupported() {
    // not (not a and not b) is a or b
    let err = typeorm("not (not a eq 1 and not b eq 2)").unwrap_err();
    assert_eq!(
        err,
        FinalizeError::Unsupported {
            backend: "TypeORM",
            message: "NOT over an OR condition".into(),
        }
    );
    assert!(typeorm("not not (a eq 1 or b eq 2)").is_err());
}

#[test]
fn test_typeorm_double_not_over_group() {
    assert_eq!(
        typeorm("not not (a eq 1 and b gt 2)").unwrap(),
        json!({"a": 1, "b": {"MoreThan": [2]}})
    );
    assert_eq!(
        typeorm("c eq 3 and not not (a eq 1 and c lt 9)").unwrap(),
        json!({"c": {"And": [{"Equal": [3]}, {"LessThan": [9]}]}, "a": 1})
    );
}

#[test]
fn test_typeorm_not_through_relation() {
    assert_eq!(
        typeorm("not profile.city eq \"Paris\"").unwrap(),
        json!({"profile": {"city": {"Not": [{"Equal": ["Paris"]}]}}})
    );
}

#[test]
fn test_typeorm_two_negations() {
    assert_eq!(
        typeorm("not a eq 1 and not b eq 2").unwrap(),
        json!({"a": {"Not": [{"Equal": [1]}]}, "b": {"Not": [{"Equal": [2]}]}})
    );
}

#[test]
fn test_typeorm_negations_on_one_relation_merge() {
    assert_eq!(
        typeorm("not profile.city eq \"Paris\" and not profile.age gt 20").unwrap(),
        json!({"profile": {
            "city": {"Not": [{"Equal": ["Paris"]}]},
            "age": {"Not": [{"MoreThan": [20]}]}
        }})
    );
    assert_eq!(
        typeorm("profile.city eq \"Paris\" and not profile.age gt 20").unwrap(),
        json!({"profile": {
            "city": "Paris",
            "age": {"Not": [{"MoreThan": [20]}]}
        }})
    );
}

#[test]
fn test_typeorm_negation_joins_field_conditions() {
    assert_eq!(
        typeorm("a gt 1 and not a eq 5").unwrap(),
        json!({"a": {"And": [{"MoreThan": [1]}, {"Not": [{"Equal": [5]}]}]}})
    );
    assert_eq!(
        typeorm("not a eq 1 and not a eq 2").unwrap(),
        json!({"a": {"And": [{"Not": [{"Equal": [1]}]}, {"Not": [{"Equal": [2]}]}]}})
    );
}

#[test]
fn test_typeorm_not_over_unbounded_between_is_unsupported() {
    assert_eq!(
        typeorm("not a between [null, null]").unwrap_err(),
        FinalizeError::Unsupported {
            backend: "TypeORM",
            message: "NOT over an unbounded between".into(),
        }
    );
}

#[test]
fn test_typeorm_not_over_or_is_unsupported() {
    let err = typeorm("not (a eq 1 or b eq 2)").unwrap_err();
    assert_eq!(
        err,
        FinalizeError::Unsupported {
            backend: "TypeORM",
            message: "NOT over an OR condition".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        "Unsupported TypeORM filter: NOT over an OR condition"
    );
}

#[test]
fn test_typeorm_not_over_many_fields_is_unsupported() {
    assert!(matches!(
        typeorm("not (a eq 1 and b eq 2)"),
        Err(FinalizeError::Unsupported { .. })
    ));
}

#[test]
fn test_typeorm_missing_function() {
    let table = TypeOrmOperators::new().with("moreThan", |args: &[Json]| json!({ "MoreThan": args }));
    let compiled = compile_typeorm(&parse("a gt 1 and b lt 2").unwrap()).unwrap();
    assert_eq!(
        finalize_typeorm(&compiled, &table).unwrap_err(),
        FinalizeError::MissingOperator {
            backend: "TypeORM",
            name: "lessThan".into(),
        }
    );

    // Entries the filter does not use are not required
    let compiled = compile_typeorm(&parse("a gt 1").unwrap()).unwrap();
    assert!(finalize_typeorm(&compiled, &table).is_ok());
}

#[test]
fn test_typeorm_table_debug_lists_names() {
    let table = TypeOrmOperators::new()
        .with("not", |_: &[Json]| Json::Null)
        .with("and", |_: &[Json]| Json::Null);
    assert_eq!(
        format!("{:?}", table),
        "TypeOrmOperators { functions: [\"and\", \"not\"] }"
    );
}
