mod common;

use common::*;
use farcall::expr::{BinaryOp, CallExpr};
use farcall::meta::StaticType;
use farcall::promise;
use farcall::value::Value;

#[tokio::test]
async fn simple_on_class() {
    let r = class_client();
    let service = FakeService::new(1);
    let p = promise::call_async(
        service.clone(),
        CallExpr::call(via_class(&r), "simple", Vec::new()),
        StaticType::Void,
    )
    .unwrap();
    assert_eq!(p.execute_async().await.unwrap(), Value::Null);
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn simple_on_interface() {
    let r = interface_client();
    let service = FakeService::new(1);
    let p = promise::call_async(
        service.clone(),
        CallExpr::call(via_interface(&r), "simple_interface", Vec::new()),
        StaticType::Void,
    )
    .unwrap();
    assert_eq!(p.execute_async().await.unwrap(), Value::Null);
}

#[tokio::test]
async fn simple_on_interface_implementation() {
    let r = interface_client();
    let service = FakeService::new(1);
    let p = promise::call_async(
        service.clone(),
        CallExpr::call(via_impl(&r), "simple_interface", Vec::new()),
        StaticType::Void,
    )
    .unwrap();
    assert_eq!(p.execute_async().await.unwrap(), Value::Null);
}

#[tokio::test]
async fn add_picks_the_overload_by_argument_kind() {
    let r = interface_client();

    let service = FakeService::new(1);
    let p = promise::call_async(
        service,
        add(via_interface(&r), int(1), CallExpr::constant(1.5)),
        StaticType::Double,
    )
    .unwrap();
    assert_eq!(p.execute_async().await.unwrap(), Value::Double(3.5));

    let service = FakeService::new(1);
    let p = promise::call_async(
        service,
        add(via_interface(&r), int(1), int(2)),
        StaticType::Int,
    )
    .unwrap();
    assert_eq!(p.execute_async().await.unwrap(), Value::Int(3));
}

#[tokio::test]
async fn compute_formats_remotely() {
    let r = interface_client();
    let service = FakeService::new(1);
    let p = promise::call_async(
        service,
        compute(via_interface(&r), int(1), int(2)),
        StaticType::Str,
    )
    .unwrap();
    assert_eq!(p.execute_async().await.unwrap(), Value::from("1+2=3"));
}

#[tokio::test]
async fn composed_calls_share_one_round_trip() {
    let r = interface_client();
    let service = FakeService::new(1);
    let inner = add(
        via_interface(&r),
        int(1),
        CallExpr::binary(BinaryOp::Add, int(1), int(1)),
    );
    let p = promise::call_async(
        service.clone(),
        compute(via_interface(&r), inner, int(3)),
        StaticType::Str,
    )
    .unwrap();
    assert_eq!(p.execute_async().await.unwrap(), Value::from("3+3=6"));

    // The folded payload carries the composition with one shared
    // placeholder.
    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].evaluation, "r1.compute(r1.add(1,2),3)");
    assert_eq!(requests[0].references, vec!["interface-root"]);
}

#[tokio::test]
async fn binary_composition_of_remote_calls() {
    let r = interface_client();
    let service = FakeService::new(1);
    let expr = CallExpr::binary(
        BinaryOp::Divide,
        CallExpr::binary(
            BinaryOp::Multiply,
            CallExpr::binary(
                BinaryOp::Add,
                add(via_interface(&r), int(1), int(1)),
                add(via_interface(&r), int(1), int(1)),
            ),
            add(via_interface(&r), int(2), int(2)),
        ),
        add(via_interface(&r), int(2), int(0)),
    );
    let p = promise::call_async(service.clone(), expr, StaticType::Int).unwrap();
    assert_eq!(p.execute_async().await.unwrap(), Value::Int(8));

    let requests = service.requests();
    assert_eq!(
        requests[0].evaluation,
        "(r1.add(1,1)+r1.add(1,1))*r1.add(2,2)/r1.add(2,0)"
    );
}

#[test]
fn sync_call_runs_immediately() {
    let r = interface_client();
    let service = SyncFakeService::new(1);
    let result = promise::call(
        service.clone(),
        add(via_interface(&r), int(2), int(3)),
        StaticType::Int,
    )
    .unwrap();
    assert_eq!(result, Value::Int(5));
    assert_eq!(service.call_count(), 1);
}

#[test]
fn sync_promise_defers_until_triggered() {
    let r = interface_client();
    let service = SyncFakeService::new(1);
    let p = promise::call_promise(
        service.clone(),
        add(via_interface(&r), int(2), int(3)),
        StaticType::Int,
    )
    .unwrap();
    assert_eq!(service.call_count(), 0);
    assert_eq!(p.execute().unwrap(), Value::Int(5));
    assert_eq!(service.call_count(), 1);
}
