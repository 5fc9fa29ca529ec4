#![allow(missing_docs)]

use proptest::prelude::*;
use sqlset::render::{Node, StatementSource};
use sqlset::value::ValueMap;
use sqlset::{params, BindingDescriptor, MappedStatement, ParameterMode, Value};

fn statement(root: Node, parameters: Vec<BindingDescriptor>) -> MappedStatement {
    MappedStatement::builder("q", StatementSource::new(root, parameters, Vec::new()))
        .namespace("props")
        .build()
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-z]{0,8}".prop_map(Value::String),
    ]
}

fn arb_params() -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-c]", arb_scalar()), 0..4).prop_map(|pairs| {
        let map: ValueMap = pairs.into_iter().collect();
        Value::Map(map)
    })
}

#[test]
fn optional_clause_follows_parameter_presence() {
    let stmt = statement(
        Node::Composite(vec![
            Node::literal("SELECT * FROM T WHERE 1=1"),
            Node::templated(" AND NAME = :name"),
        ]),
        Vec::new(),
    );
    let absent = stmt.render(&params! { "name" => Value::Null }).unwrap();
    assert_eq!(absent.sql(), "SELECT * FROM T WHERE 1=1");
    assert!(absent.values().is_empty());

    let present = stmt.render(&params! { "name" => "x" }).unwrap();
    assert_eq!(present.sql(), "SELECT * FROM T WHERE 1=1 AND NAME = ?");
    assert_eq!(present.value_list(), vec![Value::from("x")]);
}

#[test]
fn values_line_up_with_placeholders_across_fragments() {
    let stmt = statement(
        Node::Composite(vec![
            Node::literal("SELECT * FROM T WHERE TENANT = ?"),
            Node::templated(" AND A = :a"),
            Node::templated(" AND B = #{b}"),
            Node::literal(" LIMIT ?"),
        ]),
        vec![
            BindingDescriptor::builder("tenant").mode(ParameterMode::In).index(1).build(),
            BindingDescriptor::builder("limit").mode(ParameterMode::In).index(2).build(),
        ],
    );
    let result = stmt
        .render(&params! { "tenant" => 1i64, "b" => "bee", "limit" => 10i64 })
        .unwrap();
    assert_eq!(result.sql(), "SELECT * FROM T WHERE TENANT = ? AND B = ? LIMIT ?");
    let names: Vec<_> = result.values().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["tenant", "b", "limit"]);
    assert_eq!(result.sql().matches('?').count(), result.values().len());
}

#[test]
fn marker_with_descriptor_leaves_trailing_slot_aligned() {
    let stmt = statement(
        Node::Composite(vec![
            Node::literal("SELECT * FROM T WHERE TENANT = ?"),
            Node::templated(" AND A = :a"),
            Node::literal(" LIMIT ?"),
        ]),
        vec![
            BindingDescriptor::builder("tenant").mode(ParameterMode::In).build(),
            BindingDescriptor::builder("a").mode(ParameterMode::In).size(2).build(),
            BindingDescriptor::builder("limit").mode(ParameterMode::In).build(),
        ],
    );
    for key in [None, Some("k"), Some("k")] {
        let result = stmt
            .render_cached(&params! { "tenant" => 1i64, "a" => "abc", "limit" => 10i64 }, None, key)
            .unwrap();
        let names: Vec<_> = result.values().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["tenant", "a", "limit"]);
        assert_eq!(result.value_list(), vec![Value::Int(1), Value::from("ab"), Value::Int(10)]);
    }
}

proptest! {
    #[test]
    fn literal_only_trees_concatenate(parts in prop::collection::vec("[ -~]{0,12}", 0..6), params in arb_params()) {
        let stmt = statement(
            Node::Composite(parts.iter().cloned().map(Node::Literal).collect()),
            Vec::new(),
        );
        let result = stmt.render(&params).unwrap();
        prop_assert_eq!(result.sql(), parts.concat());
        prop_assert!(result.values().is_empty());
    }

    #[test]
    fn direction_none_never_binds(params in arb_params(), slots in 0usize..4) {
        let body = vec!["?"; slots].join(", ");
        let stmt = statement(
            Node::literal(format!("SELECT {body}")),
            vec![
                BindingDescriptor::builder("a").mode(ParameterMode::None).build(),
                BindingDescriptor::builder("b").mode(ParameterMode::Out).build(),
                BindingDescriptor::builder("c").build(),
            ],
        );
        let result = stmt.render(&params).unwrap();
        prop_assert!(result.values().is_empty());
    }

    #[test]
    fn cached_render_is_stable_and_walks_once(first in arb_params(), second in arb_params(), key in "[a-z]{1,6}") {
        let stmt = statement(
            Node::Composite(vec![
                Node::literal("SELECT * FROM T WHERE 1=1"),
                Node::templated(" AND A = :a"),
            ]),
            Vec::new(),
        );
        let one = stmt.render_cached(&first, None, Some(&key)).unwrap();
        let two = stmt.render_cached(&second, None, Some(&key)).unwrap();
        prop_assert_eq!(one.sql(), two.sql());
        prop_assert_eq!(stmt.walk_count(), 1);
        prop_assert_eq!(stmt.cache_stats().hits, 1);
    }
}
