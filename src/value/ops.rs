//! Operator arithmetic over [`Value`].
//!
//! Shared by the partial evaluator (folding local sub-trees) and the
//! protocol engine (executing decoded trees), so both sides of the wire
//! agree on semantics. Numeric operands promote `Int` → `Long` → `Double`;
//! `ULong` mixes only with non-negative integers. Integer arithmetic wraps.

use std::sync::Arc;

use crate::error::RpcError;
use crate::expr::{BinaryOp, UnaryOp};
use crate::meta::StaticType;
use crate::value::Value;

/// Numeric promotion lattice used by binary arithmetic.
enum Promoted {
    Int(i32, i32),
    Long(i64, i64),
    ULong(u64, u64),
    Double(f64, f64),
}

fn promote(a: &Value, b: &Value) -> Option<Promoted> {
    use Value::*;
    Some(match (a, b) {
        (Int(x), Int(y)) => Promoted::Int(*x, *y),
        (Int(x), Long(y)) => Promoted::Long(i64::from(*x), *y),
        (Long(x), Int(y)) => Promoted::Long(*x, i64::from(*y)),
        (Long(x), Long(y)) => Promoted::Long(*x, *y),
        (ULong(x), ULong(y)) => Promoted::ULong(*x, *y),
        (ULong(x), Int(y)) if *y >= 0 => Promoted::ULong(*x, *y as u64),
        (Int(x), ULong(y)) if *x >= 0 => Promoted::ULong(*x as u64, *y),
        (ULong(x), Long(y)) if *y >= 0 => Promoted::ULong(*x, *y as u64),
        (Long(x), ULong(y)) if *x >= 0 => Promoted::ULong(*x as u64, *y),
        (Double(x), Double(y)) => Promoted::Double(*x, *y),
        (Double(x), Int(y)) => Promoted::Double(*x, f64::from(*y)),
        (Int(x), Double(y)) => Promoted::Double(f64::from(*x), *y),
        (Double(x), Long(y)) => Promoted::Double(*x, *y as f64),
        (Long(x), Double(y)) => Promoted::Double(*x as f64, *y),
        (Double(x), ULong(y)) => Promoted::Double(*x, *y as f64),
        (ULong(x), Double(y)) => Promoted::Double(*x as f64, *y),
        _ => return None,
    })
}

fn type_error(op: BinaryOp, a: &Value, b: &Value) -> RpcError {
    RpcError::decode(format!(
        "operator {} is not defined for {} and {}",
        crate::wire::binary_symbol(op).0,
        a.type_name(),
        b.type_name()
    ))
}

/// Apply a binary operator to two already-evaluated operands.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RpcError> {
    use BinaryOp::*;
    match op {
        Add => {
            if let (Value::Str(a), Value::Str(b)) = (left, right) {
                let mut out = String::with_capacity(a.len() + b.len());
                out.push_str(a);
                out.push_str(b);
                return Ok(Value::Str(Arc::from(out.as_str())));
            }
            arithmetic(op, left, right)
        }
        Subtract | Multiply | Divide | Modulo => arithmetic(op, left, right),
        Equal => Ok(Value::Bool(loose_eq(left, right))),
        NotEqual => Ok(Value::Bool(!loose_eq(left, right))),
        Less | Greater | LessOrEqual | GreaterOrEqual => relational(op, left, right),
        AndAlso | And => logical_or_bitwise(op, left, right, true),
        OrElse | Or => logical_or_bitwise(op, left, right, false),
        ExclusiveOr => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a ^ b)),
            _ => bitwise(op, left, right),
        },
        LeftShift | RightShift => shift(op, left, right),
        Coalesce => Ok(if left.is_null() {
            right.clone()
        } else {
            left.clone()
        }),
    }
}

/// Apply a unary operator to an already-evaluated operand.
pub fn apply_unary(op: UnaryOp, operand: &Value) -> Result<Value, RpcError> {
    match (op, operand) {
        (UnaryOp::Plus, v) => Ok(v.clone()),
        (UnaryOp::Negate, Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
        (UnaryOp::Negate, Value::Long(v)) => Ok(Value::Long(v.wrapping_neg())),
        (UnaryOp::Negate, Value::Double(v)) => Ok(Value::Double(-v)),
        (UnaryOp::Not, Value::Bool(v)) => Ok(Value::Bool(!v)),
        (op, v) => Err(RpcError::decode(format!(
            "unary operator {} is not defined for {}",
            crate::wire::unary_symbol(op),
            v.type_name()
        ))),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RpcError> {
    use BinaryOp::*;
    let promoted = promote(left, right).ok_or_else(|| type_error(op, left, right))?;
    match promoted {
        Promoted::Int(a, b) => {
            if matches!(op, Divide | Modulo) && b == 0 {
                return Err(RpcError::decode("division by zero"));
            }
            Ok(Value::Int(match op {
                Add => a.wrapping_add(b),
                Subtract => a.wrapping_sub(b),
                Multiply => a.wrapping_mul(b),
                Divide => a.wrapping_div(b),
                Modulo => a.wrapping_rem(b),
                _ => unreachable!(),
            }))
        }
        Promoted::Long(a, b) => {
            if matches!(op, Divide | Modulo) && b == 0 {
                return Err(RpcError::decode("division by zero"));
            }
            Ok(Value::Long(match op {
                Add => a.wrapping_add(b),
                Subtract => a.wrapping_sub(b),
                Multiply => a.wrapping_mul(b),
                Divide => a.wrapping_div(b),
                Modulo => a.wrapping_rem(b),
                _ => unreachable!(),
            }))
        }
        Promoted::ULong(a, b) => {
            if matches!(op, Divide | Modulo) && b == 0 {
                return Err(RpcError::decode("division by zero"));
            }
            Ok(Value::ULong(match op {
                Add => a.wrapping_add(b),
                Subtract => a.wrapping_sub(b),
                Multiply => a.wrapping_mul(b),
                Divide => a / b,
                Modulo => a % b,
                _ => unreachable!(),
            }))
        }
        Promoted::Double(a, b) => Ok(Value::Double(match op {
            Add => a + b,
            Subtract => a - b,
            Multiply => a * b,
            Divide => a / b,
            Modulo => a % b,
            _ => unreachable!(),
        })),
    }
}

/// Equality with numeric promotion; remote objects compare by reference.
fn loose_eq(left: &Value, right: &Value) -> bool {
    if let Some(p) = promote(left, right) {
        return match p {
            Promoted::Int(a, b) => a == b,
            Promoted::Long(a, b) => a == b,
            Promoted::ULong(a, b) => a == b,
            Promoted::Double(a, b) => a == b,
        };
    }
    left == right
}

fn relational(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RpcError> {
    use std::cmp::Ordering;
    let ord = if let Some(p) = promote(left, right) {
        match p {
            Promoted::Int(a, b) => a.cmp(&b),
            Promoted::Long(a, b) => a.cmp(&b),
            Promoted::ULong(a, b) => a.cmp(&b),
            Promoted::Double(a, b) => a
                .partial_cmp(&b)
                .ok_or_else(|| RpcError::decode("NaN is not ordered"))?,
        }
    } else {
        match (left, right) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => return Err(type_error(op, left, right)),
        }
    };
    Ok(Value::Bool(match op {
        BinaryOp::Less => ord == Ordering::Less,
        BinaryOp::Greater => ord == Ordering::Greater,
        BinaryOp::LessOrEqual => ord != Ordering::Greater,
        BinaryOp::GreaterOrEqual => ord != Ordering::Less,
        _ => unreachable!(),
    }))
}

fn logical_or_bitwise(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    and: bool,
) -> Result<Value, RpcError> {
    match (left, right) {
        // Operands are already evaluated by the time they get here, so the
        // short-circuit forms reduce to their eager counterparts.
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if and { *a && *b } else { *a || *b })),
        _ => bitwise(op, left, right),
    }
}

fn bitwise(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RpcError> {
    use BinaryOp::*;
    let promoted = promote(left, right).ok_or_else(|| type_error(op, left, right))?;
    match promoted {
        Promoted::Int(a, b) => Ok(Value::Int(match op {
            And | AndAlso => a & b,
            Or | OrElse => a | b,
            ExclusiveOr => a ^ b,
            _ => unreachable!(),
        })),
        Promoted::Long(a, b) => Ok(Value::Long(match op {
            And | AndAlso => a & b,
            Or | OrElse => a | b,
            ExclusiveOr => a ^ b,
            _ => unreachable!(),
        })),
        Promoted::ULong(a, b) => Ok(Value::ULong(match op {
            And | AndAlso => a & b,
            Or | OrElse => a | b,
            ExclusiveOr => a ^ b,
            _ => unreachable!(),
        })),
        Promoted::Double(..) => Err(type_error(op, left, right)),
    }
}

fn shift(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RpcError> {
    let by = match right {
        Value::Int(v) => *v as u32,
        _ => return Err(type_error(op, left, right)),
    };
    let shl = matches!(op, BinaryOp::LeftShift);
    match left {
        Value::Int(v) => Ok(Value::Int(if shl {
            v.wrapping_shl(by)
        } else {
            v.wrapping_shr(by)
        })),
        Value::Long(v) => Ok(Value::Long(if shl {
            v.wrapping_shl(by)
        } else {
            v.wrapping_shr(by)
        })),
        Value::ULong(v) => Ok(Value::ULong(if shl {
            v.wrapping_shl(by)
        } else {
            v.wrapping_shr(by)
        })),
        _ => Err(type_error(op, left, right)),
    }
}

/// Static result type of a binary operator, for typing folded nodes.
pub fn binary_result_type(op: BinaryOp, left: StaticType, right: StaticType) -> StaticType {
    use BinaryOp::*;
    match op {
        Equal | NotEqual | Less | Greater | LessOrEqual | GreaterOrEqual => StaticType::Bool,
        AndAlso | OrElse => StaticType::Bool,
        Coalesce => {
            if matches!(left, StaticType::Unknown) {
                right
            } else {
                left
            }
        }
        LeftShift | RightShift => left,
        _ => match (left, right) {
            (StaticType::Str, StaticType::Str) => StaticType::Str,
            (StaticType::Double, _) | (_, StaticType::Double) => StaticType::Double,
            (StaticType::ULong, _) | (_, StaticType::ULong) => StaticType::ULong,
            (StaticType::Long, _) | (_, StaticType::Long) => StaticType::Long,
            (StaticType::Int, StaticType::Int) => StaticType::Int,
            _ => StaticType::Unknown,
        },
    }
}
