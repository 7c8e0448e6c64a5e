//! Tree evaluation.
//!
//! Walks a call expression tree whose leaves are all constants and
//! computes its value: operator arithmetic through [`ops`], member and
//! method dispatch through the receiver's [`RpcRoot`] surface. The partial
//! evaluator uses this to fold local sub-trees; the protocol engine uses
//! it to execute decoded trees against resolved remote objects.

use crate::error::RpcError;
use crate::expr::CallExpr;
use crate::value::{Value, ops};

pub fn evaluate(expr: &CallExpr) -> Result<Value, RpcError> {
    match expr {
        CallExpr::Constant { value, .. } => Ok(value.clone()),
        CallExpr::Parameter { name, .. } => Err(RpcError::invalid_expression(
            format!("unbound parameter '{}'", name),
            expr,
        )),
        CallExpr::Unary { op, operand } => ops::apply_unary(*op, &evaluate(operand)?),
        CallExpr::Binary { op, left, right } => {
            ops::apply_binary(*op, &evaluate(left)?, &evaluate(right)?)
        }
        CallExpr::Member { target, name } => match evaluate(target)? {
            Value::Root(object) => object.get_member(name),
            other => Err(RpcError::invalid_expression(
                format!("cannot access member '{}' on {}", name, other.type_name()),
                expr,
            )),
        },
        CallExpr::Call {
            target,
            method,
            args,
        } => match evaluate(target)? {
            Value::Root(object) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(evaluate(arg)?);
                }
                object.invoke(method, values)
            }
            other => Err(RpcError::invalid_expression(
                format!("cannot call '{}' on {}", method, other.type_name()),
                expr,
            )),
        },
        CallExpr::New { ty, .. } => Err(RpcError::invalid_expression(
            format!("cannot evaluate construction of {}", ty.name),
            expr,
        )),
        CallExpr::NewArray { items } => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(evaluate(item)?);
            }
            Ok(Value::Array(values))
        }
        CallExpr::PromiseExecute { .. } => Err(RpcError::invalid_expression(
            "a promise executes remotely, not locally",
            expr,
        )),
    }
}
