//! Boundary contracts: the base remote-root capability, the transport
//! traits, the wire message, and the protocol-text engine seam.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use downcast_rs::{DowncastSync, impl_downcast};
use serde::{Deserialize, Serialize};

use crate::error::RpcError;
use crate::value::Value;

/// The base remote-root capability.
///
/// An entity whose authoritative state lives on a peer, identified by an
/// opaque reference string. `invoke` and `get_member` are the local
/// dispatch surface: the partial evaluator uses them to fold calls on
/// local receivers, and the protocol engine uses them server-side to
/// execute resolved calls. Stand-ins reject `invoke` with a direct-call
/// violation.
pub trait RpcRoot: std::fmt::Debug + DowncastSync {
    /// The opaque reference identifying this object. Equality of remote
    /// objects is equality of this string.
    fn reference(&self) -> &str;

    fn invoke(&self, method: &str, _args: Vec<Value>) -> Result<Value, RpcError> {
        Err(RpcError::decode(format!(
            "'{}' has no method '{}'",
            self.reference(),
            method
        )))
    }

    fn get_member(&self, name: &str) -> Result<Value, RpcError> {
        Err(RpcError::decode(format!(
            "'{}' has no member '{}'",
            self.reference(),
            name
        )))
    }
}
impl_downcast!(sync RpcRoot);

/// Wire message: either a request or a return value.
///
/// `references[k]` appears in `evaluation` exactly as the placeholder
/// `r<k+1>`; a given remote object gets one placeholder index per message,
/// assigned in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedEvaluation {
    pub evaluation: String,
    pub references: Vec<String>,
}

impl SerializedEvaluation {
    /// The absent message: a call that produced no value.
    pub fn empty() -> Self {
        SerializedEvaluation::default()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluation.is_empty()
    }
}

/// Named remote objects visible to the protocol engine (`r1`, `r2`, ...).
pub type SymbolTable = HashMap<String, Arc<dyn RpcRoot>>;

/// The protocol-text execution seam.
///
/// Given protocol text and a symbol table, executes the text and returns a
/// value. The supported grammar must match the serializer's literal and
/// operator tables exactly; [`crate::engine::ProtocolEngine`] is the
/// reference implementation.
pub trait EvaluationEngine {
    fn evaluate(&self, text: &str, symbols: &SymbolTable) -> Result<Value, RpcError>;
}

/// Minimum contract for a synchronous transport.
///
/// The implementation owns serialization and the actual network mechanics;
/// retries, timeouts and authentication live there too, never in this core.
pub trait RpcService: Send + Sync {
    /// Carry one request to the peer and bring its response back.
    fn invoke_remote(
        &self,
        visited: SerializedEvaluation,
    ) -> Result<SerializedEvaluation, RpcError>;

    /// Resolve a reference client-side, typically to a not-yet-loaded
    /// stand-in.
    fn resolve_reference(&self, reference: &str) -> Result<Arc<dyn RpcRoot>, RpcError>;
}

/// Minimum contract for an asynchronous transport.
#[async_trait]
pub trait RpcServiceAsync: Send + Sync {
    async fn invoke_remote(
        &self,
        visited: SerializedEvaluation,
    ) -> Result<SerializedEvaluation, RpcError>;

    async fn resolve_reference(&self, reference: &str) -> Result<Arc<dyn RpcRoot>, RpcError>;
}
