//! Partial evaluation of call expression trees.
//!
//! Classifies nodes bottom-up and replaces every maximal evaluable
//! sub-tree by a constant carrying its computed value. A node is
//! evaluable iff it is not a construction, references no unbound
//! parameter, is not remote-bound (by receiver type or declaration
//! marker), and all of its children are evaluable.
//!
//! The remote classification is deliberately suspicious of concrete
//! receivers: a concrete override may have dropped the remote marker its
//! interface declaration carries, so the declaration is consulted through
//! the implemented-interface map before a call is deemed local.

use crate::error::RpcError;
use crate::expr::CallExpr;
use crate::expr::eval::evaluate;
use crate::meta::StaticType;
use crate::value::Value;

/// Simplify a tree: fold every maximal evaluable sub-tree to a constant.
///
/// Running it on an already-simplified tree is a no-op.
///
/// # Errors
///
/// Returns a construction error on invalid promise usage or when a folded
/// sub-tree fails to evaluate.
pub fn simplify(expr: CallExpr) -> Result<CallExpr, RpcError> {
    let (expr, evaluable) = classify(expr)?;
    fold_if(expr, evaluable)
}

/// Classify one node, returning it with every maximal evaluable *proper*
/// sub-tree already folded when the node itself is not evaluable. Folding
/// of an evaluable node is always left to its parent, so only maximal
/// sub-trees collapse.
fn classify(expr: CallExpr) -> Result<(CallExpr, bool), RpcError> {
    match expr {
        CallExpr::Constant { .. } => Ok((expr, true)),
        CallExpr::Parameter { .. } => Ok((expr, false)),

        CallExpr::Unary { op, operand } => {
            let (operand, evaluable) = classify(*operand)?;
            Ok((CallExpr::unary(op, operand), evaluable))
        }

        CallExpr::Binary { op, left, right } => {
            let (left, le) = classify(*left)?;
            let (right, re) = classify(*right)?;
            if le && re {
                Ok((CallExpr::binary(op, left, right), true))
            } else {
                Ok((
                    CallExpr::binary(op, fold_if(left, le)?, fold_if(right, re)?),
                    false,
                ))
            }
        }

        CallExpr::Member { target, name } => {
            let receiver_ty = target.static_type();
            let (target, te) = classify(*target)?;
            // Members of remote objects are never read locally, marked or
            // not; their state lives on the peer.
            let evaluable =
                te && !receiver_ty.is_root_assignable() && !remote_property(receiver_ty, &name);
            if evaluable {
                Ok((CallExpr::member(target, name), true))
            } else {
                Ok((CallExpr::member(fold_if(target, te)?, name), false))
            }
        }

        CallExpr::Call {
            target,
            method,
            args,
        } => {
            let receiver_ty = target.static_type();
            if receiver_ty == StaticType::Promise {
                return classify_promise_call(*target, method, args);
            }

            let (target, te) = classify(*target)?;
            let mut classified = Vec::with_capacity(args.len());
            let mut all_args = true;
            for arg in args {
                let (arg, ae) = classify(arg)?;
                all_args &= ae;
                classified.push((arg, ae));
            }

            let evaluable = te && all_args && !remote_method(receiver_ty, &method);
            if evaluable {
                let args = classified.into_iter().map(|(a, _)| a).collect();
                Ok((CallExpr::call(target, method, args), true))
            } else {
                let target = fold_if(target, te)?;
                let mut args = Vec::with_capacity(classified.len());
                for (arg, ae) in classified {
                    args.push(fold_if(arg, ae)?);
                }
                Ok((CallExpr::call(target, method, args), false))
            }
        }

        CallExpr::New { ty, args } => {
            // Construction is never folded; its arguments still are.
            let mut folded = Vec::with_capacity(args.len());
            for arg in args {
                let (arg, ae) = classify(arg)?;
                folded.push(fold_if(arg, ae)?);
            }
            Ok((CallExpr::New { ty, args: folded }, false))
        }

        CallExpr::NewArray { items } => {
            let mut folded = Vec::with_capacity(items.len());
            for item in items {
                let (item, ie) = classify(item)?;
                folded.push(fold_if(item, ie)?);
            }
            Ok((CallExpr::NewArray { items: folded }, false))
        }

        CallExpr::PromiseExecute { .. } => Ok((expr, false)),
    }
}

/// Validate `promise.execute()` and rewrite it to a [`CallExpr::PromiseExecute`]
/// unit the serializer will inline.
fn classify_promise_call(
    target: CallExpr,
    method: String,
    args: Vec<CallExpr>,
) -> Result<(CallExpr, bool), RpcError> {
    if method != "execute" {
        return Err(RpcError::invalid_expression(
            format!(
                "cannot execute method '{}' on a promise; only 'execute()' is allowed",
                method
            ),
            CallExpr::call(target, method, args),
        ));
    }
    let (target, te) = classify(target)?;
    let target = fold_if(target, te)?;
    match target {
        CallExpr::Constant {
            value: Value::Promise(promise),
            ..
        } => Ok((CallExpr::PromiseExecute { promise }, false)),
        CallExpr::Constant {
            value: Value::Null, ..
        } => Err(RpcError::invalid_expression(
            "cannot execute a null promise",
            "null.execute()",
        )),
        other => Err(RpcError::invalid_expression(
            "expecting a locally-evaluable reference to a promise",
            other,
        )),
    }
}

/// Replace an evaluable non-constant sub-tree by the constant it computes,
/// preserving its static type.
fn fold_if(expr: CallExpr, evaluable: bool) -> Result<CallExpr, RpcError> {
    if !evaluable || matches!(expr, CallExpr::Constant { .. }) {
        return Ok(expr);
    }
    let declared = expr.static_type();
    let value = evaluate(&expr)?;
    let ty = match declared {
        // An untyped fold still gets the best type its value offers.
        StaticType::Unknown => value.static_type(),
        ty => ty,
    };
    Ok(CallExpr::Constant { value, ty })
}

fn remote_method(receiver: StaticType, name: &str) -> bool {
    match receiver {
        // A receiver seen through the root contract or any remote-derived
        // interface is remote territory: every call crosses the wire.
        StaticType::Root => true,
        StaticType::Interface(def) if def.remote_root() => true,
        StaticType::Interface(def) => def.find_method(name).is_some_and(|m| m.remote),
        StaticType::Concrete(def) => {
            if def.find_method(name).is_some_and(|m| m.remote) {
                return true;
            }
            // Disguised override: the concrete method dropped the marker,
            // the interface declaration it implements still carries it.
            def.is_root_assignable() && def.interface_method(name).is_some_and(|m| m.remote)
        }
        _ => false,
    }
}

fn remote_property(receiver: StaticType, name: &str) -> bool {
    match receiver {
        StaticType::Interface(def) => def.find_property(name).is_some_and(|p| p.remote),
        StaticType::Concrete(def) => {
            def.find_property(name).is_some_and(|p| p.remote)
                || def.interface_property(name).is_some_and(|p| p.remote)
        }
        _ => false,
    }
}
