//! Reference protocol-text engine.
//!
//! Executes wire text against a symbol table of named remote objects:
//! lexes and parses the serializer's grammar into a call expression tree
//! (placeholders resolved up front), then evaluates the tree. Hosts with
//! their own engine plug in through [`EvaluationEngine`] instead.

pub mod lexer;
pub mod parser;
pub mod token;

use crate::contract::{EvaluationEngine, SymbolTable};
use crate::error::RpcError;
use crate::expr::eval;
use crate::value::Value;

/// The default engine; grammar matches the serializer's tables exactly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtocolEngine;

impl EvaluationEngine for ProtocolEngine {
    fn evaluate(&self, text: &str, symbols: &SymbolTable) -> Result<Value, RpcError> {
        let lexer = lexer::Lexer::new(text);
        let mut parser = parser::Parser::new(lexer, symbols);
        let expr = parser.parse()?;
        eval::evaluate(&expr)
    }
}
