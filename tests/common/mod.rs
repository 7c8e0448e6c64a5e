//! Shared fake model: capability descriptors, client/server objects and
//! call-counting services.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use farcall::contract::{RpcRoot, RpcService, RpcServiceAsync, SerializedEvaluation};
use farcall::error::RpcError;
use farcall::evaluator;
use farcall::expr::CallExpr;
use farcall::meta::{ConcreteDef, InterfaceDef, MethodDef, StaticType};
use farcall::value::Value;

pub static INTERFACE_ROOT: InterfaceDef = InterfaceDef {
    name: "InterfaceRoot",
    remote_root: true,
    extends: &[],
    methods: &[
        MethodDef {
            name: "simple_interface",
            remote: true,
            result: StaticType::Void,
        },
        MethodDef {
            name: "compute",
            remote: true,
            result: StaticType::Str,
        },
        // add(Int, Double) -> Double and add(Int, Int) -> Int; overload
        // selection happens server-side on the argument kinds.
        MethodDef {
            name: "add",
            remote: true,
            result: StaticType::Double,
        },
        MethodDef {
            name: "add",
            remote: true,
            result: StaticType::Int,
        },
    ],
    properties: &[],
};

pub static CLASS_ROOT: ConcreteDef = ConcreteDef {
    name: "ClassRoot",
    root: true,
    implements: &[],
    methods: &[MethodDef {
        name: "simple",
        remote: true,
        result: StaticType::Void,
    }],
    properties: &[],
};

/// Implements `InterfaceRoot` but "forgot" every remote marker; the
/// interface map has to catch calls through this type.
pub static INTERFACE_ROOT_IMPL: ConcreteDef = ConcreteDef {
    name: "InterfaceRootImpl",
    root: false,
    implements: &[&INTERFACE_ROOT],
    methods: &[
        MethodDef {
            name: "simple_interface",
            remote: false,
            result: StaticType::Void,
        },
        MethodDef {
            name: "compute",
            remote: false,
            result: StaticType::Str,
        },
        MethodDef {
            name: "add",
            remote: false,
            result: StaticType::Int,
        },
        MethodDef {
            name: "local_tag",
            remote: false,
            result: StaticType::Str,
        },
    ],
    properties: &[],
};

#[derive(Debug)]
pub struct ClassRootClient;

impl RpcRoot for ClassRootClient {
    fn reference(&self) -> &str {
        "class-root"
    }

    fn invoke(&self, method: &str, _args: Vec<Value>) -> Result<Value, RpcError> {
        panic!("unexpected client-side call of '{}'", method);
    }
}

#[derive(Debug)]
pub struct InterfaceRootClient;

impl RpcRoot for InterfaceRootClient {
    fn reference(&self) -> &str {
        "interface-root"
    }

    fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
        match method {
            // A genuinely local helper; everything else must go remote.
            "local_tag" => Ok(Value::from("local")),
            _ => panic!(
                "unexpected client-side call of '{}' with {:?}",
                method, args
            ),
        }
    }
}

#[derive(Debug)]
pub struct ClassRootServer;

impl RpcRoot for ClassRootServer {
    fn reference(&self) -> &str {
        panic!("unexpected server-side reference read");
    }

    fn invoke(&self, method: &str, _args: Vec<Value>) -> Result<Value, RpcError> {
        match method {
            "simple" => Ok(Value::Null),
            _ => Err(RpcError::decode(format!("no method '{}'", method))),
        }
    }
}

#[derive(Debug)]
pub struct InterfaceRootServer;

impl RpcRoot for InterfaceRootServer {
    fn reference(&self) -> &str {
        panic!("unexpected server-side reference read");
    }

    fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
        match (method, args.as_slice()) {
            ("simple_interface", []) => Ok(Value::Null),
            ("compute", [Value::Int(a), Value::Int(b)]) => {
                Ok(Value::from(format!("{}+{}={}", a, b, a + b)))
            }
            ("add", [Value::Int(a), Value::Double(b)]) => {
                Ok(Value::Double(f64::from(*a) + b + 1.0))
            }
            ("add", [Value::Int(a), Value::Int(b)]) => Ok(Value::Int(a + b)),
            _ => Err(RpcError::decode(format!(
                "no overload of '{}' for {:?}",
                method, args
            ))),
        }
    }
}

fn serve(visited: &SerializedEvaluation) -> Result<SerializedEvaluation, RpcError> {
    evaluator::handle_incoming_request(visited, |reference| {
        Ok(match reference {
            "class-root" => Arc::new(ClassRootServer) as Arc<dyn RpcRoot>,
            _ => Arc::new(InterfaceRootServer) as Arc<dyn RpcRoot>,
        })
    })
}

/// Async transport double: counts invocations, records payloads, and
/// fails the test when called more often than expected.
pub struct FakeService {
    expect: usize,
    count: AtomicUsize,
    requests: Mutex<Vec<SerializedEvaluation>>,
}

impl FakeService {
    pub fn new(expect: usize) -> Arc<Self> {
        Arc::new(FakeService {
            expect,
            count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SerializedEvaluation> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, visited: &SerializedEvaluation) {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        assert!(
            count <= self.expect,
            "transport called more than {} times",
            self.expect
        );
        self.requests.lock().unwrap().push(visited.clone());
    }
}

#[async_trait]
impl RpcServiceAsync for FakeService {
    async fn invoke_remote(
        &self,
        visited: SerializedEvaluation,
    ) -> Result<SerializedEvaluation, RpcError> {
        self.record(&visited);
        serve(&visited)
    }

    async fn resolve_reference(&self, reference: &str) -> Result<Arc<dyn RpcRoot>, RpcError> {
        Err(RpcError::decode(format!(
            "unexpected reference resolution of '{}'",
            reference
        )))
    }
}

/// Sync twin of [`FakeService`].
pub struct SyncFakeService {
    expect: usize,
    count: AtomicUsize,
}

impl SyncFakeService {
    pub fn new(expect: usize) -> Arc<Self> {
        Arc::new(SyncFakeService {
            expect,
            count: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl RpcService for SyncFakeService {
    fn invoke_remote(
        &self,
        visited: SerializedEvaluation,
    ) -> Result<SerializedEvaluation, RpcError> {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        assert!(
            count <= self.expect,
            "transport called more than {} times",
            self.expect
        );
        serve(&visited)
    }

    fn resolve_reference(&self, reference: &str) -> Result<Arc<dyn RpcRoot>, RpcError> {
        Err(RpcError::decode(format!(
            "unexpected reference resolution of '{}'",
            reference
        )))
    }
}

pub fn interface_client() -> Arc<dyn RpcRoot> {
    Arc::new(InterfaceRootClient)
}

pub fn class_client() -> Arc<dyn RpcRoot> {
    Arc::new(ClassRootClient)
}

/// Receiver node statically typed through the capability interface.
pub fn via_interface(object: &Arc<dyn RpcRoot>) -> CallExpr {
    CallExpr::root(Arc::clone(object), StaticType::Interface(&INTERFACE_ROOT))
}

/// Receiver node statically typed as the concrete implementation.
pub fn via_impl(object: &Arc<dyn RpcRoot>) -> CallExpr {
    CallExpr::root(Arc::clone(object), StaticType::Concrete(&INTERFACE_ROOT_IMPL))
}

pub fn via_class(object: &Arc<dyn RpcRoot>) -> CallExpr {
    CallExpr::root(Arc::clone(object), StaticType::Concrete(&CLASS_ROOT))
}

pub fn int(v: i32) -> CallExpr {
    CallExpr::constant(v)
}

pub fn add(receiver: CallExpr, a: CallExpr, b: CallExpr) -> CallExpr {
    CallExpr::call(receiver, "add", vec![a, b])
}

pub fn compute(receiver: CallExpr, a: CallExpr, b: CallExpr) -> CallExpr {
    CallExpr::call(receiver, "compute", vec![a, b])
}
