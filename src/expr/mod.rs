//! Call expression trees.
//!
//! The in-memory representation of a remote call: a small expression
//! language built through an explicit builder API. Trees are transient,
//! created per call site, simplified once by [`simplify`] and rendered by
//! the wire serializer on every execution.

pub mod eval;
pub mod simplify;

pub use simplify::simplify;

use std::fmt;
use std::sync::Arc;

use crate::contract::RpcRoot;
use crate::meta::{ConcreteDef, StaticType};
use crate::value::{PromiseSource, Value, ops};

/// Binary operators renderable on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    /// Bitwise and (logical on booleans).
    And,
    /// Bitwise or (logical on booleans).
    Or,
    AndAlso,
    OrElse,
    ExclusiveOr,
    LeftShift,
    RightShift,
    Coalesce,
}

/// Unary operators renderable on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
    /// Unary plus renders as nothing, like the quote-stripping no-ops it
    /// replaces.
    Plus,
}

/// One node of a call expression tree.
#[derive(Debug, Clone)]
pub enum CallExpr {
    /// A literal or remote-object constant, with the static type seen at
    /// the declaration site (a receiver declared through an interface
    /// keeps the interface type even though the value is concrete).
    Constant { value: Value, ty: StaticType },
    /// An unbound parameter. Never evaluable; reaching the serializer with
    /// one is an error.
    Parameter { name: String, ty: StaticType },
    Unary {
        op: UnaryOp,
        operand: Box<CallExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<CallExpr>,
        right: Box<CallExpr>,
    },
    Member {
        target: Box<CallExpr>,
        name: String,
    },
    Call {
        target: Box<CallExpr>,
        method: String,
        args: Vec<CallExpr>,
    },
    /// Object construction. Never folded, so identity and side effects
    /// stay visible; has no wire rendering.
    New {
        ty: &'static ConcreteDef,
        args: Vec<CallExpr>,
    },
    /// Array construction. The array itself is never folded; elements are.
    NewArray { items: Vec<CallExpr> },
    /// A validated `promise.execute()` call site. The serializer inlines
    /// the promise's own frozen tree here instead of emitting call syntax.
    PromiseExecute { promise: Arc<dyn PromiseSource> },
}

impl CallExpr {
    /// A literal constant, typed from its value.
    pub fn constant(value: impl Into<Value>) -> CallExpr {
        let value = value.into();
        let ty = value.static_type();
        CallExpr::Constant { value, ty }
    }

    pub fn null() -> CallExpr {
        CallExpr::Constant {
            value: Value::Null,
            ty: StaticType::Unknown,
        }
    }

    /// A remote-object constant with the static type of its declaration
    /// site. The static type, not the concrete value, drives the partial
    /// evaluator's remote classification.
    pub fn root(object: Arc<dyn RpcRoot>, ty: StaticType) -> CallExpr {
        CallExpr::Constant {
            value: Value::Root(object),
            ty,
        }
    }

    pub fn parameter(name: impl Into<String>, ty: StaticType) -> CallExpr {
        CallExpr::Parameter {
            name: name.into(),
            ty,
        }
    }

    pub fn unary(op: UnaryOp, operand: CallExpr) -> CallExpr {
        CallExpr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: CallExpr, right: CallExpr) -> CallExpr {
        CallExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn member(target: CallExpr, name: impl Into<String>) -> CallExpr {
        CallExpr::Member {
            target: Box::new(target),
            name: name.into(),
        }
    }

    pub fn call(target: CallExpr, method: impl Into<String>, args: Vec<CallExpr>) -> CallExpr {
        CallExpr::Call {
            target: Box::new(target),
            method: method.into(),
            args,
        }
    }

    pub fn new_object(ty: &'static ConcreteDef, args: Vec<CallExpr>) -> CallExpr {
        CallExpr::New { ty, args }
    }

    pub fn array(items: Vec<CallExpr>) -> CallExpr {
        CallExpr::NewArray { items }
    }

    /// Static type of this node, derived from declaration metadata.
    pub fn static_type(&self) -> StaticType {
        match self {
            CallExpr::Constant { ty, .. } => *ty,
            CallExpr::Parameter { ty, .. } => *ty,
            CallExpr::Unary { op, operand } => match op {
                UnaryOp::Not => StaticType::Bool,
                UnaryOp::Negate | UnaryOp::Plus => operand.static_type(),
            },
            CallExpr::Binary { op, left, right } => {
                ops::binary_result_type(*op, left.static_type(), right.static_type())
            }
            CallExpr::Member { target, name } => match target.static_type() {
                StaticType::Interface(def) => def
                    .find_property(name)
                    .map_or(StaticType::Unknown, |p| p.ty),
                StaticType::Concrete(def) => def
                    .find_property(name)
                    .or_else(|| def.interface_property(name))
                    .map_or(StaticType::Unknown, |p| p.ty),
                _ => StaticType::Unknown,
            },
            CallExpr::Call {
                target, method, ..
            } => match target.static_type() {
                StaticType::Interface(def) => def
                    .find_method(method)
                    .map_or(StaticType::Unknown, |m| m.result),
                StaticType::Concrete(def) => def
                    .find_method(method)
                    .or_else(|| def.interface_method(method))
                    .map_or(StaticType::Unknown, |m| m.result),
                _ => StaticType::Unknown,
            },
            CallExpr::New { ty, .. } => StaticType::Concrete(*ty),
            CallExpr::NewArray { .. } => StaticType::Unknown,
            CallExpr::PromiseExecute { promise } => promise.result_type(),
        }
    }
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallExpr::Constant { value, .. } => write!(f, "{}", value),
            CallExpr::Parameter { name, .. } => write!(f, "{}", name),
            CallExpr::Unary { op, operand } => {
                write!(f, "{}{}", crate::wire::unary_symbol(*op), operand)
            }
            CallExpr::Binary { op, left, right } => {
                write!(
                    f,
                    "({} {} {})",
                    left,
                    crate::wire::binary_symbol(*op).0,
                    right
                )
            }
            CallExpr::Member { target, name } => write!(f, "{}.{}", target, name),
            CallExpr::Call {
                target,
                method,
                args,
            } => {
                write!(f, "{}.{}(", target, method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            CallExpr::New { ty, args } => {
                write!(f, "new {}(", ty.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            CallExpr::NewArray { items } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            CallExpr::PromiseExecute { .. } => write!(f, "<promise>.execute()"),
        }
    }
}
