//! Protocol text parser.
//!
//! A Pratt parser over the serializer's grammar, producing a call
//! expression tree whose leaves are constants: placeholder identifiers
//! resolve against the symbol table at parse time, so the evaluated tree
//! never sees an unresolved name.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::contract::SymbolTable;
use crate::engine::lexer::Lexer;
use crate::engine::token::{Token, TokenKind};
use crate::error::RpcError;
use crate::expr::{BinaryOp, CallExpr, UnaryOp};
use crate::meta::StaticType;
use crate::value::Value;

/// Binding strength, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Coalesce,
    BoolOr,
    BoolAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equality,
    Relational,
    Shift,
    Sum,
    Product,
    Prefix,
    Primary,
}

fn token_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Coalesce => Precedence::Coalesce,
        TokenKind::OrOr => Precedence::BoolOr,
        TokenKind::AndAnd => Precedence::BoolAnd,
        TokenKind::Pipe => Precedence::BitOr,
        TokenKind::Caret => Precedence::BitXor,
        TokenKind::Amp => Precedence::BitAnd,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equality,
        TokenKind::Lt | TokenKind::Gt | TokenKind::Lte | TokenKind::Gte => Precedence::Relational,
        TokenKind::Shl | TokenKind::Shr => Precedence::Shift,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::Dot => Precedence::Primary,
        _ => Precedence::Lowest,
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Subtract),
        TokenKind::Star => Some(BinaryOp::Multiply),
        TokenKind::Slash => Some(BinaryOp::Divide),
        TokenKind::Percent => Some(BinaryOp::Modulo),
        TokenKind::Eq => Some(BinaryOp::Equal),
        TokenKind::NotEq => Some(BinaryOp::NotEqual),
        TokenKind::Lt => Some(BinaryOp::Less),
        TokenKind::Gt => Some(BinaryOp::Greater),
        TokenKind::Lte => Some(BinaryOp::LessOrEqual),
        TokenKind::Gte => Some(BinaryOp::GreaterOrEqual),
        TokenKind::AndAnd => Some(BinaryOp::AndAlso),
        TokenKind::OrOr => Some(BinaryOp::OrElse),
        TokenKind::Amp => Some(BinaryOp::And),
        TokenKind::Pipe => Some(BinaryOp::Or),
        TokenKind::Caret => Some(BinaryOp::ExclusiveOr),
        TokenKind::Shl => Some(BinaryOp::LeftShift),
        TokenKind::Shr => Some(BinaryOp::RightShift),
        TokenKind::Coalesce => Some(BinaryOp::Coalesce),
        _ => None,
    }
}

pub struct Parser<'a> {
    lexer: Lexer,
    symbols: &'a SymbolTable,
    current_token: Token,
    peek_token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer, symbols: &'a SymbolTable) -> Self {
        let mut parser = Parser {
            lexer,
            symbols,
            current_token: Token::new(TokenKind::Eof, "", 0),
            peek_token: Token::new(TokenKind::Eof, "", 0),
        };
        parser.next_token();
        parser.next_token();
        parser
    }

    /// Parse the whole message as a single expression.
    pub fn parse(&mut self) -> Result<CallExpr, RpcError> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token.kind != TokenKind::Eof {
            return Err(self.unexpected(&self.peek_token.clone()));
        }
        Ok(expr)
    }

    fn next_token(&mut self) {
        self.current_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<CallExpr, RpcError> {
        let mut left = self.parse_prefix()?;
        while self.peek_token.kind != TokenKind::Eof
            && precedence < token_precedence(self.peek_token.kind)
        {
            self.next_token();
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<CallExpr, RpcError> {
        match self.current_token.kind {
            TokenKind::Int | TokenKind::Long | TokenKind::ULong | TokenKind::Double => {
                self.parse_number(false)
            }
            TokenKind::Quoted => Ok(CallExpr::constant(quoted_value(&self.current_token.text))),
            TokenKind::Date => self.parse_date(),
            TokenKind::True => Ok(CallExpr::constant(true)),
            TokenKind::False => Ok(CallExpr::constant(false)),
            TokenKind::Null => Ok(CallExpr::null()),
            TokenKind::Ident => self.parse_symbol(),
            TokenKind::Minus => {
                if matches!(
                    self.peek_token.kind,
                    TokenKind::Int | TokenKind::Long | TokenKind::Double
                ) {
                    // Fused negative literal, so i32::MIN survives decoding.
                    self.next_token();
                    self.parse_number(true)
                } else {
                    self.next_token();
                    let operand = self.parse_expression(Precedence::Prefix)?;
                    Ok(CallExpr::unary(UnaryOp::Negate, operand))
                }
            }
            TokenKind::Bang => {
                self.next_token();
                let operand = self.parse_expression(Precedence::Prefix)?;
                Ok(CallExpr::unary(UnaryOp::Not, operand))
            }
            TokenKind::LParen => {
                self.next_token();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array(),
            _ => Err(self.unexpected(&self.current_token.clone())),
        }
    }

    fn parse_infix(&mut self, left: CallExpr) -> Result<CallExpr, RpcError> {
        match self.current_token.kind {
            TokenKind::Dot => self.parse_member_or_call(left),
            kind => match binary_op(kind) {
                Some(op) => {
                    let precedence = token_precedence(kind);
                    self.next_token();
                    let right = self.parse_expression(precedence)?;
                    Ok(CallExpr::binary(op, left, right))
                }
                None => Err(self.unexpected(&self.current_token.clone())),
            },
        }
    }

    fn parse_member_or_call(&mut self, target: CallExpr) -> Result<CallExpr, RpcError> {
        self.expect_peek(TokenKind::Ident)?;
        let name = self.current_token.text.clone();
        if self.peek_token.kind != TokenKind::LParen {
            return Ok(CallExpr::member(target, name));
        }
        self.next_token(); // onto '('
        let args = self.parse_expression_list(TokenKind::RParen)?;
        Ok(CallExpr::call(target, name, args))
    }

    fn parse_array(&mut self) -> Result<CallExpr, RpcError> {
        let items = self.parse_expression_list(TokenKind::RBracket)?;
        Ok(CallExpr::array(items))
    }

    /// Comma-separated expressions; the current token is the opening
    /// delimiter, the closing one is consumed.
    fn parse_expression_list(&mut self, end: TokenKind) -> Result<Vec<CallExpr>, RpcError> {
        let mut items = Vec::new();
        if self.peek_token.kind == end {
            self.next_token();
            return Ok(items);
        }
        self.next_token();
        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_token.kind == TokenKind::Comma {
            self.next_token();
            self.next_token();
            items.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Ok(items)
    }

    fn parse_number(&mut self, negative: bool) -> Result<CallExpr, RpcError> {
        let token = self.current_token.clone();
        let mut text = String::new();
        if negative {
            text.push('-');
        }
        text.push_str(&token.text);
        let value = match token.kind {
            TokenKind::Int => text
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| self.bad_literal(&token)),
            TokenKind::Long => text
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|_| self.bad_literal(&token)),
            TokenKind::ULong => text
                .parse::<u64>()
                .map(Value::ULong)
                .map_err(|_| self.bad_literal(&token)),
            TokenKind::Double => text
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| self.bad_literal(&token)),
            _ => Err(self.unexpected(&token)),
        }?;
        Ok(CallExpr::constant(value))
    }

    fn parse_date(&mut self) -> Result<CallExpr, RpcError> {
        let token = self.current_token.clone();
        let naive = NaiveDateTime::parse_from_str(&token.text, crate::wire::DATE_FORMAT)
            .map_err(|_| self.bad_literal(&token))?;
        let date: DateTime<Utc> = DateTime::from_naive_utc_and_offset(naive, Utc);
        Ok(CallExpr::constant(date))
    }

    fn parse_symbol(&mut self) -> Result<CallExpr, RpcError> {
        let name = &self.current_token.text;
        match self.symbols.get(name) {
            Some(object) => Ok(CallExpr::root(Arc::clone(object), StaticType::Root)),
            None => Err(RpcError::decode(format!(
                "unknown symbol '{}' at offset {}",
                name, self.current_token.offset
            ))),
        }
    }

    fn expect_peek(&mut self, kind: TokenKind) -> Result<(), RpcError> {
        if self.peek_token.kind == kind {
            self.next_token();
            Ok(())
        } else {
            Err(self.unexpected(&self.peek_token.clone()))
        }
    }

    fn unexpected(&self, token: &Token) -> RpcError {
        RpcError::decode(format!(
            "unexpected token '{}' at offset {}",
            if token.kind == TokenKind::Eof {
                "<eof>"
            } else {
                &token.text
            },
            token.offset
        ))
    }

    fn bad_literal(&self, token: &Token) -> RpcError {
        RpcError::decode(format!(
            "malformed literal '{}' at offset {}",
            token.text, token.offset
        ))
    }
}

/// One character is a char literal; anything else is a string. The wire
/// encoding quotes both the same way.
fn quoted_value(text: &str) -> Value {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Value::Char(c),
        _ => Value::from(text),
    }
}
