//! Remote evaluation entry points.
//!
//! The server side of a round trip: resolve references into a symbol
//! table, execute the protocol text, re-encode the result. The symmetric
//! decode half runs on the caller after the transport returns.

use std::future::Future;
use std::sync::Arc;

use log::debug;

use crate::contract::{EvaluationEngine, RpcRoot, SerializedEvaluation, SymbolTable};
use crate::engine::ProtocolEngine;
use crate::error::RpcError;
use crate::expr::CallExpr;
use crate::value::Value;
use crate::wire::CallSerializer;

/// Execute an incoming request against resolved remote objects and encode
/// the result for the wire.
///
/// A null result produces the empty message. A result that is itself a
/// remote object encodes as a single reference placeholder, preserving
/// identity instead of copying state.
pub fn handle_incoming_request<R>(
    evaluation: &SerializedEvaluation,
    resolve: R,
) -> Result<SerializedEvaluation, RpcError>
where
    R: FnMut(&str) -> Result<Arc<dyn RpcRoot>, RpcError>,
{
    handle_incoming_request_with(&ProtocolEngine, evaluation, resolve)
}

/// [`handle_incoming_request`] against a caller-supplied engine.
pub fn handle_incoming_request_with<R>(
    engine: &dyn EvaluationEngine,
    evaluation: &SerializedEvaluation,
    mut resolve: R,
) -> Result<SerializedEvaluation, RpcError>
where
    R: FnMut(&str) -> Result<Arc<dyn RpcRoot>, RpcError>,
{
    debug!(
        "incoming request: {} ({} refs)",
        evaluation.evaluation,
        evaluation.references.len()
    );
    let mut symbols = SymbolTable::new();
    for (i, reference) in evaluation.references.iter().enumerate() {
        symbols.insert(format!("r{}", i + 1), resolve(reference)?);
    }
    let result = engine.evaluate(&evaluation.evaluation, &symbols)?;
    if result.is_null() {
        return Ok(SerializedEvaluation::empty());
    }
    let ty = result.static_type();
    CallSerializer::new().serialize(&CallExpr::Constant { value: result, ty })
}

/// Decode a response message: resolve each reference **in list order, one
/// at a time**, then execute the text against them.
pub fn handle_result<R>(
    evaluation: &SerializedEvaluation,
    mut resolve: R,
) -> Result<Value, RpcError>
where
    R: FnMut(&str) -> Result<Arc<dyn RpcRoot>, RpcError>,
{
    if evaluation.is_empty() {
        return Ok(Value::Null);
    }
    let mut symbols = SymbolTable::new();
    for (i, reference) in evaluation.references.iter().enumerate() {
        symbols.insert(format!("r{}", i + 1), resolve(reference)?);
    }
    decode(evaluation, &symbols)
}

/// Asynchronous [`handle_result`]; resolutions are awaited sequentially so
/// list order is preserved. The resolver takes the reference by value so
/// its future owns everything it needs.
pub async fn handle_result_async<R, Fut>(
    evaluation: &SerializedEvaluation,
    mut resolve: R,
) -> Result<Value, RpcError>
where
    R: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Arc<dyn RpcRoot>, RpcError>>,
{
    if evaluation.is_empty() {
        return Ok(Value::Null);
    }
    let mut symbols = SymbolTable::new();
    for (i, reference) in evaluation.references.iter().enumerate() {
        symbols.insert(format!("r{}", i + 1), resolve(reference.clone()).await?);
    }
    decode(evaluation, &symbols)
}

fn decode(evaluation: &SerializedEvaluation, symbols: &SymbolTable) -> Result<Value, RpcError> {
    let value = ProtocolEngine.evaluate(&evaluation.evaluation, symbols)?;
    debug!("decoded result: {}", value);
    Ok(value)
}
