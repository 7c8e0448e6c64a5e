//! Call serialization.
//!
//! Renders a (partially folded) call expression tree into the wire text
//! format plus an ordered reference list. Remote-object constants become
//! `r<k>` placeholders, assigned in first-occurrence order and
//! deduplicated by object identity; scalars render through the literal
//! table; operators render through a fixed symbol table with priority
//! ranks deciding parenthesization.

mod literal;

pub(crate) use literal::DATE_FORMAT;

use std::sync::Arc;

use crate::contract::{RpcRoot, SerializedEvaluation};
use crate::error::RpcError;
use crate::expr::{BinaryOp, CallExpr, UnaryOp};
use crate::value::Value;

/// Operator priority ranks, tightest first. An operand that is itself an
/// operator expression is parenthesized iff its rank is numerically
/// greater (binds looser) than its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Primary = 1,
    Unary,
    Mult,
    Add,
    Shift,
    Relational,
    Equal,
    BitAnd,
    BitXor,
    BitOr,
    BoolAnd,
    BoolOr,
    Conditional,
    Assign,
}

/// Wire symbol and priority rank of a binary operator.
pub fn binary_symbol(op: BinaryOp) -> (&'static str, Priority) {
    match op {
        BinaryOp::Add => ("+", Priority::Add),
        BinaryOp::Subtract => ("-", Priority::Add),
        BinaryOp::Multiply => ("*", Priority::Mult),
        BinaryOp::Divide => ("/", Priority::Mult),
        BinaryOp::Modulo => ("%", Priority::Mult),
        BinaryOp::Equal => ("==", Priority::Equal),
        BinaryOp::NotEqual => ("!=", Priority::Equal),
        BinaryOp::Less => ("<", Priority::Relational),
        BinaryOp::Greater => (">", Priority::Relational),
        BinaryOp::LessOrEqual => ("<=", Priority::Relational),
        BinaryOp::GreaterOrEqual => (">=", Priority::Relational),
        BinaryOp::And => ("&", Priority::BitAnd),
        BinaryOp::ExclusiveOr => ("^", Priority::BitXor),
        BinaryOp::Or => ("|", Priority::BitOr),
        BinaryOp::AndAlso => ("&&", Priority::BoolAnd),
        BinaryOp::OrElse => ("||", Priority::BoolOr),
        BinaryOp::LeftShift => ("<<", Priority::Shift),
        BinaryOp::RightShift => (">>", Priority::Shift),
        BinaryOp::Coalesce => ("??", Priority::Conditional),
    }
}

/// Wire symbol of a unary operator. Unary plus renders as nothing.
pub fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Negate => "-",
        UnaryOp::Not => "!",
        UnaryOp::Plus => "",
    }
}

/// One serialization pass over a tree.
///
/// Holds the ordered, identity-deduplicated list of remote objects seen so
/// far; a serializer instance is used for one message and discarded.
pub struct CallSerializer {
    roots: Vec<Arc<dyn RpcRoot>>,
}

impl CallSerializer {
    pub fn new() -> Self {
        CallSerializer { roots: Vec::new() }
    }

    /// Render a tree into a wire message.
    ///
    /// # Errors
    ///
    /// Construction errors for node or constant kinds with no wire
    /// rendering.
    pub fn serialize(mut self, expr: &CallExpr) -> Result<SerializedEvaluation, RpcError> {
        let mut out = String::new();
        self.write(expr, &mut out)?;
        Ok(SerializedEvaluation {
            evaluation: out,
            references: self
                .roots
                .iter()
                .map(|r| r.reference().to_string())
                .collect(),
        })
    }

    fn write(&mut self, expr: &CallExpr, out: &mut String) -> Result<(), RpcError> {
        match expr {
            CallExpr::Constant { value, .. } => self.write_value(value, out),
            CallExpr::Unary { op, operand } => {
                out.push_str(unary_symbol(*op));
                self.write_operand(operand, Priority::Unary, out)
            }
            CallExpr::Binary { op, left, right } => {
                let (symbol, priority) = binary_symbol(*op);
                self.write_operand(left, priority, out)?;
                out.push_str(symbol);
                self.write_operand(right, priority, out)
            }
            CallExpr::Member { target, name } => {
                self.write_operand(target, Priority::Primary, out)?;
                out.push('.');
                out.push_str(name);
                Ok(())
            }
            CallExpr::Call {
                target,
                method,
                args,
            } => {
                self.write_operand(target, Priority::Primary, out)?;
                out.push('.');
                out.push_str(method);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write(arg, out)?;
                }
                out.push(')');
                Ok(())
            }
            CallExpr::NewArray { items } => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write(item, out)?;
                }
                out.push(']');
                Ok(())
            }
            // Pin the promised sub-computation in place of call syntax, so
            // one round trip carries the composed computation.
            CallExpr::PromiseExecute { promise } => self.write(promise.expression(), out),
            CallExpr::Parameter { .. } | CallExpr::New { .. } => Err(
                RpcError::invalid_expression("unsupported expression", expr),
            ),
        }
    }

    fn write_operand(
        &mut self,
        expr: &CallExpr,
        parent: Priority,
        out: &mut String,
    ) -> Result<(), RpcError> {
        let needs_parens = operator_priority(expr).is_some_and(|p| p > parent);
        if needs_parens {
            out.push('(');
        }
        self.write(expr, out)?;
        if needs_parens {
            out.push(')');
        }
        Ok(())
    }

    fn write_value(&mut self, value: &Value, out: &mut String) -> Result<(), RpcError> {
        match value {
            Value::Root(object) => {
                out.push_str(&self.placeholder(object));
                Ok(())
            }
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_value(item, out)?;
                }
                out.push(']');
                Ok(())
            }
            Value::Promise(_) => Err(RpcError::invalid_constant(value.type_name())),
            scalar => literal::write_scalar(scalar, out),
        }
    }

    /// Placeholder for a remote object, 1-based, reusing the index of an
    /// already-seen instance.
    fn placeholder(&mut self, object: &Arc<dyn RpcRoot>) -> String {
        let index = match self.roots.iter().position(|r| Arc::ptr_eq(r, object)) {
            Some(index) => index,
            None => {
                self.roots.push(Arc::clone(object));
                self.roots.len() - 1
            }
        };
        format!("r{}", index + 1)
    }
}

impl Default for CallSerializer {
    fn default() -> Self {
        CallSerializer::new()
    }
}

/// Priority of a node when it appears as an operand; `None` for primary
/// atoms. An inlined promise exposes the priority of its own root node.
fn operator_priority(expr: &CallExpr) -> Option<Priority> {
    match expr {
        CallExpr::Unary { .. } => Some(Priority::Unary),
        CallExpr::Binary { op, .. } => Some(binary_symbol(*op).1),
        CallExpr::PromiseExecute { promise } => operator_priority(promise.expression()),
        _ => None,
    }
}
