mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::*;
use farcall::contract::{EvaluationEngine, SymbolTable};
use farcall::engine::ProtocolEngine;
use farcall::error::ErrorKind;
use farcall::expr::{BinaryOp, CallExpr, UnaryOp};
use farcall::meta::StaticType;
use farcall::value::Value;
use farcall::wire::CallSerializer;

fn render(expr: &CallExpr) -> String {
    CallSerializer::new().serialize(expr).unwrap().evaluation
}

#[test]
fn renders_scalar_literals() {
    insta::assert_snapshot!(render(&CallExpr::constant(true)), @"true");
    insta::assert_snapshot!(render(&CallExpr::constant('c')), @"'c'");
    insta::assert_snapshot!(render(&CallExpr::constant(42)), @"42");
    insta::assert_snapshot!(render(&CallExpr::constant(42i64)), @"42L");
    insta::assert_snapshot!(render(&CallExpr::constant(42u64)), @"42UL");
    insta::assert_snapshot!(render(&CallExpr::constant(3.5)), @"3.5");
    insta::assert_snapshot!(render(&CallExpr::constant(3.0)), @"3.0");
    insta::assert_snapshot!(render(&CallExpr::constant("it's")), @"'it's'");
    insta::assert_snapshot!(render(&CallExpr::null()), @"null");
}

#[test]
fn renders_date_literal() {
    let date = Utc.with_ymd_and_hms(2014, 5, 17, 12, 30, 5).unwrap();
    insta::assert_snapshot!(render(&CallExpr::constant(date)), @"#05/17/2014 12:30:05#");
}

#[test]
fn renders_call_and_member() {
    let r = interface_client();
    insta::assert_snapshot!(
        render(&add(via_interface(&r), int(1), int(2))),
        @"r1.add(1,2)"
    );
    insta::assert_snapshot!(
        render(&CallExpr::member(via_interface(&r), "name")),
        @"r1.name"
    );
}

#[test]
fn parenthesizes_looser_operands_only() {
    let mul_of_add = CallExpr::binary(
        BinaryOp::Multiply,
        CallExpr::binary(BinaryOp::Add, int(1), int(2)),
        int(3),
    );
    insta::assert_snapshot!(render(&mul_of_add), @"(1+2)*3");

    let add_of_mul = CallExpr::binary(
        BinaryOp::Add,
        CallExpr::binary(BinaryOp::Multiply, int(1), int(2)),
        int(3),
    );
    insta::assert_snapshot!(render(&add_of_mul), @"1*2+3");

    let cmp = CallExpr::binary(
        BinaryOp::Equal,
        CallExpr::binary(BinaryOp::Add, int(1), int(2)),
        int(3),
    );
    insta::assert_snapshot!(render(&cmp), @"1+2==3");
}

#[test]
fn parenthesizes_operator_receivers() {
    let expr = CallExpr::call(
        CallExpr::binary(BinaryOp::Add, int(1), int(2)),
        "to_str",
        Vec::new(),
    );
    insta::assert_snapshot!(render(&expr), @"(1+2).to_str()");
}

#[test]
fn renders_unary() {
    let expr = CallExpr::unary(UnaryOp::Not, CallExpr::constant(false));
    insta::assert_snapshot!(render(&expr), @"!false");

    let negated_sum = CallExpr::unary(
        UnaryOp::Negate,
        CallExpr::binary(BinaryOp::Add, int(1), int(2)),
    );
    insta::assert_snapshot!(render(&negated_sum), @"-(1+2)");
}

#[test]
fn assigns_references_in_first_occurrence_order() {
    let a = interface_client();
    let b = class_client();
    let expr = CallExpr::binary(
        BinaryOp::Equal,
        via_interface(&a),
        CallExpr::binary(BinaryOp::Coalesce, via_class(&b), via_interface(&a)),
    );
    let message = CallSerializer::new().serialize(&expr).unwrap();
    assert_eq!(message.evaluation, "r1==(r2??r1)");
    assert_eq!(message.references, vec!["interface-root", "class-root"]);
}

#[test]
fn same_instance_reuses_its_placeholder() {
    let a = interface_client();
    let expr = CallExpr::binary(BinaryOp::Equal, via_interface(&a), via_interface(&a));
    let message = CallSerializer::new().serialize(&expr).unwrap();
    assert_eq!(message.evaluation, "r1==r1");
    assert_eq!(message.references.len(), 1);
}

#[test]
fn distinct_instances_with_same_reference_get_distinct_placeholders() {
    // Deduplication is by object identity, not by reference string.
    let a = interface_client();
    let b = interface_client();
    let expr = CallExpr::binary(BinaryOp::Equal, via_interface(&a), via_interface(&b));
    let message = CallSerializer::new().serialize(&expr).unwrap();
    assert_eq!(message.evaluation, "r1==r2");
    assert_eq!(message.references, vec!["interface-root", "interface-root"]);
}

#[test]
fn renders_array_constants() {
    let a = interface_client();
    let expr = CallExpr::Constant {
        value: Value::Array(vec![
            Value::Root(Arc::clone(&a)),
            Value::Int(7),
        ]),
        ty: StaticType::Unknown,
    };
    let message = CallSerializer::new().serialize(&expr).unwrap();
    assert_eq!(message.evaluation, "[r1,7]");
    assert_eq!(message.references, vec!["interface-root"]);
}

#[test]
fn parameter_has_no_rendering() {
    let err = CallSerializer::new()
        .serialize(&CallExpr::parameter("x", StaticType::Int))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
}

#[test]
fn construction_has_no_rendering() {
    let err = CallSerializer::new()
        .serialize(&CallExpr::new_object(&CLASS_ROOT, Vec::new()))
        .unwrap_err();
    assert!(err.to_string().contains("unsupported expression"));
}

#[test]
fn scalar_literals_round_trip_by_kind() {
    let engine = ProtocolEngine;
    let symbols = SymbolTable::new();
    let samples = vec![
        Value::Bool(true),
        Value::Bool(false),
        Value::Char('x'),
        Value::Char('\''),
        Value::Int(0),
        Value::Int(-12345),
        Value::Int(i32::MIN),
        Value::Int(i32::MAX),
        Value::Long(i64::MIN),
        Value::Long(987654321),
        Value::ULong(u64::MAX),
        Value::Double(3.5),
        Value::Double(-0.125),
        Value::Double(10.0),
        Value::Date(Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap()),
        Value::from("hello world"),
        Value::Null,
    ];
    for value in samples {
        let ty = value.static_type();
        let message = CallSerializer::new()
            .serialize(&CallExpr::Constant {
                value: value.clone(),
                ty,
            })
            .unwrap();
        let back = engine.evaluate(&message.evaluation, &symbols).unwrap();
        assert_eq!(back, value, "round trip changed {}", message.evaluation);
    }
}
