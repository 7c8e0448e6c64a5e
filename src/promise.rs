//! Call promises.
//!
//! A promise pairs a transport binding with a tree that was partially
//! evaluated once, at construction. Nothing crosses the wire until a
//! trigger; every trigger re-serializes the same frozen tree and performs
//! an independent round trip, so N triggers mean N remote actions with
//! byte-identical payloads. There is no cancellation: an in-flight
//! execution runs to completion or failure.

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::contract::{RpcService, RpcServiceAsync, SerializedEvaluation};
use crate::error::RpcError;
use crate::evaluator;
use crate::expr::{CallExpr, simplify};
use crate::meta::StaticType;
use crate::value::{PromiseSource, Value};
use crate::wire::CallSerializer;

enum ServiceBinding {
    Sync(Arc<dyn RpcService>),
    Async(Arc<dyn RpcServiceAsync>),
}

impl fmt::Debug for ServiceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceBinding::Sync(_) => write!(f, "ServiceBinding::Sync"),
            ServiceBinding::Async(_) => write!(f, "ServiceBinding::Async"),
        }
    }
}

#[derive(Debug)]
struct PromiseInner {
    binding: ServiceBinding,
    call: CallExpr,
    result: StaticType,
}

impl PromiseSource for PromiseInner {
    fn expression(&self) -> &CallExpr {
        &self.call
    }

    fn result_type(&self) -> StaticType {
        self.result
    }
}

/// The promise of a remote computation.
///
/// Re-executable without limit; results are never cached. A promise can
/// also be reused inside another call through [`RpcPromise::execute_call`],
/// where the serializer inlines its tree instead of triggering a second
/// round trip.
#[derive(Debug, Clone)]
pub struct RpcPromise {
    inner: Arc<PromiseInner>,
}

impl RpcPromise {
    /// Build a promise over a synchronous transport. The tree is folded
    /// here, once; construction errors surface before any network
    /// activity.
    pub fn new(
        service: Arc<dyn RpcService>,
        call: CallExpr,
        result: StaticType,
    ) -> Result<RpcPromise, RpcError> {
        Ok(RpcPromise {
            inner: Arc::new(PromiseInner {
                binding: ServiceBinding::Sync(service),
                call: simplify(call)?,
                result,
            }),
        })
    }

    /// Build a promise over an asynchronous transport.
    pub fn new_async(
        service: Arc<dyn RpcServiceAsync>,
        call: CallExpr,
        result: StaticType,
    ) -> Result<RpcPromise, RpcError> {
        Ok(RpcPromise {
            inner: Arc::new(PromiseInner {
                binding: ServiceBinding::Async(service),
                call: simplify(call)?,
                result,
            }),
        })
    }

    /// This promise as a constant expression node, usable as the receiver
    /// of the sentinel `execute` selector.
    pub fn as_expr(&self) -> CallExpr {
        CallExpr::Constant {
            value: Value::Promise(self.inner.clone() as Arc<dyn PromiseSource>),
            ty: StaticType::Promise,
        }
    }

    /// A `promise.execute()` call site for composing this promise into an
    /// outer call. One round trip carries the whole composition.
    pub fn execute_call(&self) -> CallExpr {
        CallExpr::call(self.as_expr(), "execute", Vec::new())
    }

    /// Trigger synchronously. Over an async-only binding the work is
    /// dispatched and the calling thread blocks on its completion.
    pub fn execute(&self) -> Result<Value, RpcError> {
        match &self.inner.binding {
            ServiceBinding::Sync(service) => self.run_sync(service),
            ServiceBinding::Async(service) => {
                futures::executor::block_on(self.run_async(service))
            }
        }
    }

    /// Trigger asynchronously, suspending at the transport round trip and
    /// at each sequential reference resolution.
    pub async fn execute_async(&self) -> Result<Value, RpcError> {
        match &self.inner.binding {
            ServiceBinding::Sync(service) => self.run_sync(service),
            ServiceBinding::Async(service) => self.run_async(service).await,
        }
    }

    fn serialize(&self) -> Result<SerializedEvaluation, RpcError> {
        let visited = CallSerializer::new().serialize(&self.inner.call)?;
        debug!(
            "rpc request: {} ({} refs)",
            visited.evaluation,
            visited.references.len()
        );
        Ok(visited)
    }

    fn run_sync(&self, service: &Arc<dyn RpcService>) -> Result<Value, RpcError> {
        let result = service.invoke_remote(self.serialize()?)?;
        match self.inner.result {
            StaticType::RootArray(_) => {
                if result.is_empty() {
                    return Ok(Value::Null);
                }
                // The declared shape wins over the generic decode path:
                // one stand-in per reference, in list order, literal text
                // ignored.
                let mut items = Vec::with_capacity(result.references.len());
                for reference in &result.references {
                    items.push(Value::Root(service.resolve_reference(reference)?));
                }
                Ok(Value::Array(items))
            }
            _ => evaluator::handle_result(&result, |r| service.resolve_reference(r)),
        }
    }

    async fn run_async(&self, service: &Arc<dyn RpcServiceAsync>) -> Result<Value, RpcError> {
        let result = service.invoke_remote(self.serialize()?).await?;
        match self.inner.result {
            StaticType::RootArray(_) => {
                if result.is_empty() {
                    return Ok(Value::Null);
                }
                let mut items = Vec::with_capacity(result.references.len());
                for reference in &result.references {
                    items.push(Value::Root(service.resolve_reference(reference).await?));
                }
                Ok(Value::Array(items))
            }
            _ => {
                evaluator::handle_result_async(&result, |r| {
                    let service = Arc::clone(service);
                    async move { service.resolve_reference(&r).await }
                })
                .await
            }
        }
    }
}

/// Run a call immediately over a synchronous transport.
pub fn call(
    service: Arc<dyn RpcService>,
    call: CallExpr,
    result: StaticType,
) -> Result<Value, RpcError> {
    RpcPromise::new(service, call, result)?.execute()
}

/// Build a reusable promise over a synchronous transport. Nothing runs
/// until triggered.
pub fn call_promise(
    service: Arc<dyn RpcService>,
    call: CallExpr,
    result: StaticType,
) -> Result<RpcPromise, RpcError> {
    RpcPromise::new(service, call, result)
}

/// Build a reusable promise over an asynchronous transport. Nothing runs
/// until awaited; awaiting it N times triggers the remote action N times.
pub fn call_async(
    service: Arc<dyn RpcServiceAsync>,
    call: CallExpr,
    result: StaticType,
) -> Result<RpcPromise, RpcError> {
    RpcPromise::new_async(service, call, result)
}
