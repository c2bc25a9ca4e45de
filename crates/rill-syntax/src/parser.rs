// Rill - a small expression language
//
// Copyright (c) 2026 Rill contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Recursive-descent parser for Rill expressions.
//!
//! Comprehension macros are expanded into [`ExprKind::Comprehension`] nodes
//! during parsing. The pre-expansion call form is kept in the
//! [`SourceInfo`] macro-call table so tooling can recover the original
//! spelling. Nodes synthesized by expansion carry no offset range; in
//! particular the loop-variable binder loses its position, which consumers
//! recover textually from the end of the iteration range.

use crate::ast::{Expr, ExprKind, Literal, MapEntry, OffsetRange, ParsedExpr, SourceInfo, StructField};
use crate::error::{Issue, Issues, SyntaxResult};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::operators;

/// Parser configuration.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Expand comprehension macros into `Comprehension` nodes. When false,
    /// macro invocations stay as ordinary calls.
    pub expand_macros: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { expand_macros: true }
    }
}

/// Parse `source` with default options (macros expanded).
pub fn parse(source: &str) -> SyntaxResult<ParsedExpr> {
    parse_with_options(source, ParseOptions::default())
}

/// Parse `source` with explicit options.
pub fn parse_with_options(source: &str, options: ParseOptions) -> SyntaxResult<ParsedExpr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        next_id: 1,
        depth: 0,
        info: SourceInfo::new(source),
        options,
    };
    let root = parser.parse_conditional()?;
    let trailing = parser.current().clone();
    if trailing.kind != TokenKind::Eof {
        return Err(parser.error_at(&trailing, "unexpected trailing input"));
    }
    Ok(ParsedExpr {
        source: source.to_string(),
        root,
        info: parser.info,
    })
}

/// Recursive descent past this nesting depth is reported as a parse
/// error instead of risking stack exhaustion.
const MAX_NESTING_DEPTH: u32 = 250;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_id: u64,
    depth: u32,
    info: SourceInfo,
    options: ParseOptions,
}

impl Parser {
    fn current(&self) -> &Token {
        // tokenize always ends with Eof, so pos is clamped to the last token.
        let idx = self.pos.min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> SyntaxResult<Token> {
        if self.peek_kind() == &kind {
            Ok(self.bump())
        } else {
            let token = self.current().clone();
            Err(self.error_at(&token, format!("expected {what}")))
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> Issues {
        let location = self.info.location_of_offset(token.start);
        Issues::single(Issue::new(location, message))
    }

    fn new_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn node(&mut self, kind: ExprKind, start: u32, stop: u32) -> Expr {
        let id = self.new_id();
        self.info.set_range(id, OffsetRange::new(start, stop));
        Expr::new(id, kind)
    }

    /// A node synthesized by macro expansion; it has an id but no range.
    fn synthetic(&mut self, kind: ExprKind) -> Expr {
        Expr::new(self.new_id(), kind)
    }

    fn start_of(&self, expr: &Expr) -> u32 {
        self.info
            .offset_range(expr.id)
            .map(|r| r.start)
            .unwrap_or(0)
    }

    fn binary(&mut self, function: &str, lhs: Expr, rhs: Expr, stop: u32) -> Expr {
        let start = self.start_of(&lhs);
        self.node(
            ExprKind::Call {
                function: function.to_string(),
                target: None,
                args: vec![lhs, rhs],
            },
            start,
            stop,
        )
    }

    fn enter_nesting(&mut self) -> SyntaxResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            let token = self.current().clone();
            return Err(self.error_at(&token, "expression recursion limit exceeded"));
        }
        Ok(())
    }

    fn parse_conditional(&mut self) -> SyntaxResult<Expr> {
        self.enter_nesting()?;
        let result = self.parse_ternary();
        self.depth -= 1;
        result
    }

    fn parse_ternary(&mut self) -> SyntaxResult<Expr> {
        let cond = self.parse_or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.parse_conditional()?;
        self.expect(TokenKind::Colon, "':' in conditional expression")?;
        let otherwise = self.parse_conditional()?;
        let start = self.start_of(&cond);
        let stop = self
            .info
            .offset_range(otherwise.id)
            .map(|r| r.stop)
            .unwrap_or(start);
        Ok(self.node(
            ExprKind::Call {
                function: operators::CONDITIONAL.to_string(),
                target: None,
                args: vec![cond, then, otherwise],
            },
            start,
            stop,
        ))
    }

    fn parse_or(&mut self) -> SyntaxResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&TokenKind::OrOr) {
            let rhs = self.parse_and()?;
            let stop = self.info.offset_range(rhs.id).map(|r| r.stop).unwrap_or(0);
            lhs = self.binary(operators::LOGICAL_OR, lhs, rhs, stop);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> SyntaxResult<Expr> {
        let mut lhs = self.parse_relation()?;
        while self.eat(&TokenKind::AndAnd) {
            let rhs = self.parse_relation()?;
            let stop = self.info.offset_range(rhs.id).map(|r| r.stop).unwrap_or(0);
            lhs = self.binary(operators::LOGICAL_AND, lhs, rhs, stop);
        }
        Ok(lhs)
    }

    fn parse_relation(&mut self) -> SyntaxResult<Expr> {
        let mut lhs = self.parse_addition()?;
        loop {
            let function = match self.peek_kind() {
                TokenKind::Lt => operators::LESS,
                TokenKind::Le => operators::LESS_EQUALS,
                TokenKind::Gt => operators::GREATER,
                TokenKind::Ge => operators::GREATER_EQUALS,
                TokenKind::EqEq => operators::EQUALS,
                TokenKind::Ne => operators::NOT_EQUALS,
                TokenKind::In => operators::IN,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_addition()?;
            let stop = self.info.offset_range(rhs.id).map(|r| r.stop).unwrap_or(0);
            lhs = self.binary(function, lhs, rhs, stop);
        }
        Ok(lhs)
    }

    fn parse_addition(&mut self) -> SyntaxResult<Expr> {
        let mut lhs = self.parse_multiplication()?;
        loop {
            let function = match self.peek_kind() {
                TokenKind::Plus => operators::ADD,
                TokenKind::Minus => operators::SUBTRACT,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplication()?;
            let stop = self.info.offset_range(rhs.id).map(|r| r.stop).unwrap_or(0);
            lhs = self.binary(function, lhs, rhs, stop);
        }
        Ok(lhs)
    }

    fn parse_multiplication(&mut self) -> SyntaxResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let function = match self.peek_kind() {
                TokenKind::Star => operators::MULTIPLY,
                TokenKind::Slash => operators::DIVIDE,
                TokenKind::Percent => operators::MODULO,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            let stop = self.info.offset_range(rhs.id).map(|r| r.stop).unwrap_or(0);
            lhs = self.binary(function, lhs, rhs, stop);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> SyntaxResult<Expr> {
        let function = match self.peek_kind() {
            TokenKind::Bang => operators::LOGICAL_NOT,
            TokenKind::Minus => operators::NEGATE,
            _ => return self.parse_member(),
        };
        let op = self.bump();
        // Fold a negated numeric literal into the literal itself.
        if function == operators::NEGATE {
            if let TokenKind::Int(value) = *self.peek_kind() {
                let token = self.bump();
                return Ok(self.node(
                    ExprKind::Literal(Literal::Int(value.wrapping_neg())),
                    op.start,
                    token.stop,
                ));
            }
            if let TokenKind::Double(value) = *self.peek_kind() {
                let token = self.bump();
                return Ok(self.node(
                    ExprKind::Literal(Literal::Double(-value)),
                    op.start,
                    token.stop,
                ));
            }
        }
        self.enter_nesting()?;
        let operand = self.parse_unary();
        self.depth -= 1;
        let operand = operand?;
        let stop = self
            .info
            .offset_range(operand.id)
            .map(|r| r.stop)
            .unwrap_or(op.stop);
        Ok(self.node(
            ExprKind::Call {
                function: function.to_string(),
                target: None,
                args: vec![operand],
            },
            op.start,
            stop,
        ))
    }

    fn parse_member(&mut self) -> SyntaxResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.bump();
                    let name_token = self.current().clone();
                    let name = match &name_token.kind {
                        TokenKind::Ident(name) => name.clone(),
                        _ => return Err(self.error_at(&name_token, "expected field name after '.'")),
                    };
                    self.bump();
                    if self.peek_kind() == &TokenKind::LParen {
                        expr = self.parse_call(Some(expr), name, name_token.start)?;
                    } else if self.peek_kind() == &TokenKind::LBrace {
                        // A dotted name followed by '{' is a struct
                        // construction with a qualified type name.
                        match qualified_name(&expr) {
                            Some(prefix) => {
                                let start = self.start_of(&expr);
                                expr = self.parse_struct(format!("{prefix}.{name}"), start)?;
                            }
                            None => {
                                let start = self.start_of(&expr);
                                expr = self.node(
                                    ExprKind::Select {
                                        operand: Box::new(expr),
                                        field: name,
                                        test_only: false,
                                    },
                                    start,
                                    name_token.stop,
                                );
                            }
                        }
                    } else {
                        let start = self.start_of(&expr);
                        expr = self.node(
                            ExprKind::Select {
                                operand: Box::new(expr),
                                field: name,
                                test_only: false,
                            },
                            start,
                            name_token.stop,
                        );
                    }
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_conditional()?;
                    let close = self.expect(TokenKind::RBracket, "']'")?;
                    let start = self.start_of(&expr);
                    expr = self.node(
                        ExprKind::Call {
                            function: operators::INDEX.to_string(),
                            target: None,
                            args: vec![expr, index],
                        },
                        start,
                        close.stop,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> SyntaxResult<Expr> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump();
                match self.peek_kind() {
                    TokenKind::LParen => self.parse_call(None, name, token.start),
                    TokenKind::LBrace => self.parse_struct(name, token.start),
                    _ => Ok(self.node(ExprKind::Ident(name), token.start, token.stop)),
                }
            }
            TokenKind::Int(value) => {
                let value = *value;
                self.bump();
                Ok(self.node(
                    ExprKind::Literal(Literal::Int(value)),
                    token.start,
                    token.stop,
                ))
            }
            TokenKind::Uint(value) => {
                let value = *value;
                self.bump();
                Ok(self.node(
                    ExprKind::Literal(Literal::Uint(value)),
                    token.start,
                    token.stop,
                ))
            }
            TokenKind::Double(value) => {
                let value = *value;
                self.bump();
                Ok(self.node(
                    ExprKind::Literal(Literal::Double(value)),
                    token.start,
                    token.stop,
                ))
            }
            TokenKind::Str(value) => {
                let value = value.clone();
                self.bump();
                Ok(self.node(
                    ExprKind::Literal(Literal::String(value)),
                    token.start,
                    token.stop,
                ))
            }
            TokenKind::Bytes(value) => {
                let value = value.clone();
                self.bump();
                Ok(self.node(
                    ExprKind::Literal(Literal::Bytes(value)),
                    token.start,
                    token.stop,
                ))
            }
            TokenKind::True => {
                self.bump();
                Ok(self.node(
                    ExprKind::Literal(Literal::Bool(true)),
                    token.start,
                    token.stop,
                ))
            }
            TokenKind::False => {
                self.bump();
                Ok(self.node(
                    ExprKind::Literal(Literal::Bool(false)),
                    token.start,
                    token.stop,
                ))
            }
            TokenKind::Null => {
                self.bump();
                Ok(self.node(ExprKind::Literal(Literal::Null), token.start, token.stop))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_conditional()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.bump();
                let mut elements = Vec::new();
                while self.peek_kind() != &TokenKind::RBracket {
                    elements.push(self.parse_conditional()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                let close = self.expect(TokenKind::RBracket, "']'")?;
                Ok(self.node(ExprKind::List { elements }, token.start, close.stop))
            }
            TokenKind::LBrace => {
                self.bump();
                let mut entries = Vec::new();
                while self.peek_kind() != &TokenKind::RBrace {
                    let key = self.parse_conditional()?;
                    self.expect(TokenKind::Colon, "':' in map entry")?;
                    let value = self.parse_conditional()?;
                    entries.push(MapEntry {
                        id: self.new_id(),
                        key,
                        value,
                    });
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                let close = self.expect(TokenKind::RBrace, "'}'")?;
                Ok(self.node(ExprKind::Map { entries }, token.start, close.stop))
            }
            TokenKind::Eof => Err(self.error_at(&token, "unexpected end of expression")),
            _ => Err(self.error_at(&token, "unexpected token")),
        }
    }

    fn parse_struct(&mut self, type_name: String, start: u32) -> SyntaxResult<Expr> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while self.peek_kind() != &TokenKind::RBrace {
            let name_token = self.current().clone();
            let name = match &name_token.kind {
                TokenKind::Ident(name) => name.clone(),
                _ => return Err(self.error_at(&name_token, "expected field name")),
            };
            self.bump();
            self.expect(TokenKind::Colon, "':' in struct field")?;
            let value = self.parse_conditional()?;
            fields.push(StructField {
                id: self.new_id(),
                name,
                value,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(TokenKind::RBrace, "'}'")?;
        Ok(self.node(ExprKind::Struct { type_name, fields }, start, close.stop))
    }

    /// Parse `(args)` for a call whose name token starts at `name_start`.
    /// Member calls pass the receiver as `target`. Macro invocations are
    /// expanded here unless expansion is disabled.
    fn parse_call(
        &mut self,
        target: Option<Expr>,
        function: String,
        name_start: u32,
    ) -> SyntaxResult<Expr> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        while self.peek_kind() != &TokenKind::RParen {
            args.push(self.parse_conditional()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        let close = self.expect(TokenKind::RParen, "')'")?;
        let start = match &target {
            Some(target) => self.start_of(target),
            None => name_start,
        };

        if self.options.expand_macros && operators::is_macro(&function) {
            if let Some(expanded) =
                self.try_expand_macro(&function, target.as_ref(), &args, start, close.stop)?
            {
                // Keep the pre-expansion call form so the original spelling
                // can be recovered.
                let call = Expr::new(
                    self.new_id(),
                    ExprKind::Call {
                        function,
                        target: target.map(Box::new),
                        args,
                    },
                );
                self.info.set_range(call.id, OffsetRange::new(start, close.stop));
                self.info.set_macro_call(expanded.id, call);
                return Ok(expanded);
            }
        }

        Ok(self.node(
            ExprKind::Call {
                function,
                target: target.map(Box::new),
                args,
            },
            start,
            close.stop,
        ))
    }

    /// Expand one macro invocation. Returns `Ok(None)` when the call does
    /// not match the macro's shape and should stay an ordinary call.
    fn try_expand_macro(
        &mut self,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
        start: u32,
        stop: u32,
    ) -> SyntaxResult<Option<Expr>> {
        if function == operators::MACRO_HAS {
            if target.is_some() || args.len() != 1 {
                return Ok(None);
            }
            let arg = &args[0];
            let ExprKind::Select { operand, field, .. } = &arg.kind else {
                let location = self.info.start_location(arg.id);
                return Err(Issues::single(Issue::new(
                    location,
                    "invalid argument to has() macro",
                )));
            };
            return Ok(Some(self.node(
                ExprKind::Select {
                    operand: operand.clone(),
                    field: field.clone(),
                    test_only: true,
                },
                start,
                stop,
            )));
        }

        let Some(target) = target else {
            return Ok(None);
        };
        if args.len() != 2 {
            return Ok(None);
        }
        let ExprKind::Ident(iter_var) = &args[0].kind else {
            let location = self.info.start_location(args[0].id);
            return Err(Issues::single(Issue::new(
                location,
                "argument must be a simple name",
            )));
        };
        if iter_var == operators::ACCUMULATOR_VAR {
            let location = self.info.start_location(args[0].id);
            return Err(Issues::single(Issue::new(
                location,
                "iteration variable overwrites accumulator variable",
            )));
        }
        let iter_var = iter_var.clone();
        let body = args[1].clone();
        let accu = |parser: &mut Parser| {
            parser.synthetic(ExprKind::Ident(operators::ACCUMULATOR_VAR.to_string()))
        };

        let (accu_init, loop_condition, loop_step, result) = match function {
            operators::MACRO_ALL => {
                let init = self.synthetic(ExprKind::Literal(Literal::Bool(true)));
                let cond = accu(self);
                let lhs = accu(self);
                let step = self.synthetic(ExprKind::Call {
                    function: operators::LOGICAL_AND.to_string(),
                    target: None,
                    args: vec![lhs, body],
                });
                let result = accu(self);
                (init, cond, step, result)
            }
            operators::MACRO_EXISTS => {
                let init = self.synthetic(ExprKind::Literal(Literal::Bool(false)));
                let inner = accu(self);
                let cond = self.synthetic(ExprKind::Call {
                    function: operators::LOGICAL_NOT.to_string(),
                    target: None,
                    args: vec![inner],
                });
                let lhs = accu(self);
                let step = self.synthetic(ExprKind::Call {
                    function: operators::LOGICAL_OR.to_string(),
                    target: None,
                    args: vec![lhs, body],
                });
                let result = accu(self);
                (init, cond, step, result)
            }
            operators::MACRO_EXISTS_ONE => {
                let init = self.synthetic(ExprKind::Literal(Literal::Int(0)));
                let cond = self.synthetic(ExprKind::Literal(Literal::Bool(true)));
                let lhs = accu(self);
                let one = self.synthetic(ExprKind::Literal(Literal::Int(1)));
                let incremented = self.synthetic(ExprKind::Call {
                    function: operators::ADD.to_string(),
                    target: None,
                    args: vec![lhs, one],
                });
                let unchanged = accu(self);
                let step = self.synthetic(ExprKind::Call {
                    function: operators::CONDITIONAL.to_string(),
                    target: None,
                    args: vec![body, incremented, unchanged],
                });
                let final_accu = accu(self);
                let one = self.synthetic(ExprKind::Literal(Literal::Int(1)));
                let result = self.synthetic(ExprKind::Call {
                    function: operators::EQUALS.to_string(),
                    target: None,
                    args: vec![final_accu, one],
                });
                (init, cond, step, result)
            }
            operators::MACRO_MAP => {
                let init = self.synthetic(ExprKind::List { elements: vec![] });
                let cond = self.synthetic(ExprKind::Literal(Literal::Bool(true)));
                let lhs = accu(self);
                let wrapped = self.synthetic(ExprKind::List {
                    elements: vec![body],
                });
                let step = self.synthetic(ExprKind::Call {
                    function: operators::ADD.to_string(),
                    target: None,
                    args: vec![lhs, wrapped],
                });
                let result = accu(self);
                (init, cond, step, result)
            }
            operators::MACRO_FILTER => {
                let init = self.synthetic(ExprKind::List { elements: vec![] });
                let cond = self.synthetic(ExprKind::Literal(Literal::Bool(true)));
                let lhs = accu(self);
                let element = self.synthetic(ExprKind::Ident(iter_var.clone()));
                let wrapped = self.synthetic(ExprKind::List {
                    elements: vec![element],
                });
                let appended = self.synthetic(ExprKind::Call {
                    function: operators::ADD.to_string(),
                    target: None,
                    args: vec![lhs, wrapped],
                });
                let unchanged = accu(self);
                let step = self.synthetic(ExprKind::Call {
                    function: operators::CONDITIONAL.to_string(),
                    target: None,
                    args: vec![body, appended, unchanged],
                });
                let result = accu(self);
                (init, cond, step, result)
            }
            _ => return Ok(None),
        };

        Ok(Some(self.node(
            ExprKind::Comprehension {
                iter_var,
                iter_range: Box::new(target.clone()),
                accu_var: operators::ACCUMULATOR_VAR.to_string(),
                accu_init: Box::new(accu_init),
                loop_condition: Box::new(loop_condition),
                loop_step: Box::new(loop_step),
                result: Box::new(result),
            },
            start,
            stop,
        )))
    }
}

/// If `expr` is a chain of selects over a bare identifier, return the
/// dotted name (`a.b.c`).
fn qualified_name(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Ident(name) => Some(name.clone()),
        ExprKind::Select {
            operand,
            field,
            test_only: false,
        } => {
            let prefix = qualified_name(operand)?;
            Some(format!("{prefix}.{field}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let parsed = parse("1 + 2 * 3").unwrap();
        let ExprKind::Call { function, args, .. } = &parsed.root.kind else {
            panic!("expected call, got {:?}", parsed.root.kind);
        };
        assert_eq!(function, operators::ADD);
        let ExprKind::Call { function, .. } = &args[1].kind else {
            panic!("expected nested call");
        };
        assert_eq!(function, operators::MULTIPLY);
    }

    #[test]
    fn test_conditional_shape() {
        let parsed = parse("a ? b : c").unwrap();
        let ExprKind::Call { function, args, .. } = &parsed.root.kind else {
            panic!("expected call");
        };
        assert_eq!(function, operators::CONDITIONAL);
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_member_call_range_covers_target() {
        let parsed = parse("name.startsWith('a')").unwrap();
        let range = parsed.info.offset_range(parsed.root.id).unwrap();
        assert_eq!((range.start, range.stop), (0, 20));
    }

    #[test]
    fn test_index_and_select() {
        let parsed = parse("request.headers['x'].size()").unwrap();
        let ExprKind::Call {
            function, target, ..
        } = &parsed.root.kind
        else {
            panic!("expected call");
        };
        assert_eq!(function, "size");
        let target = target.as_deref().unwrap();
        let ExprKind::Call { function, .. } = &target.kind else {
            panic!("expected index call");
        };
        assert_eq!(function, operators::INDEX);
    }

    #[test]
    fn test_map_macro_expands_to_comprehension() {
        let parsed = parse("[1, 2, 3].map(x, x * 2)").unwrap();
        let ExprKind::Comprehension {
            iter_var,
            accu_var,
            ..
        } = &parsed.root.kind
        else {
            panic!("expected comprehension, got {:?}", parsed.root.kind);
        };
        assert_eq!(iter_var, "x");
        assert_eq!(accu_var, operators::ACCUMULATOR_VAR);
        // The original call spelling is preserved.
        let call = parsed.info.macro_calls().get(&parsed.root.id).unwrap();
        let ExprKind::Call { function, args, .. } = &call.kind else {
            panic!("expected macro call form");
        };
        assert_eq!(function, "map");
        assert_eq!(args.len(), 2);
        // The preserved call spans the whole invocation text.
        let range = parsed.info.offset_range(call.id).unwrap();
        assert_eq!(range, OffsetRange::new(0, 23));
    }

    #[test]
    fn test_macro_expansion_can_be_disabled() {
        let options = ParseOptions {
            expand_macros: false,
        };
        let parsed = parse_with_options("xs.all(v, v > 0)", options).unwrap();
        let ExprKind::Call { function, .. } = &parsed.root.kind else {
            panic!("expected call");
        };
        assert_eq!(function, "all");
        assert!(parsed.info.macro_calls().is_empty());
    }

    #[test]
    fn test_has_macro_becomes_test_only_select() {
        let parsed = parse("has(request.path)").unwrap();
        let ExprKind::Select {
            field, test_only, ..
        } = &parsed.root.kind
        else {
            panic!("expected select, got {:?}", parsed.root.kind);
        };
        assert_eq!(field, "path");
        assert!(test_only);
    }

    #[test]
    fn test_has_rejects_non_select_argument() {
        let err = parse("has(x)").unwrap_err();
        assert!(err.errors()[0].message.contains("has()"));
    }

    #[test]
    fn test_macro_binder_must_be_identifier() {
        let err = parse("[1].map(1, 2)").unwrap_err();
        assert!(err.errors()[0].message.contains("simple name"));
    }

    #[test]
    fn test_struct_with_qualified_name() {
        let parsed = parse("pkg.Msg{value: 1}").unwrap();
        let ExprKind::Struct { type_name, fields } = &parsed.root.kind else {
            panic!("expected struct, got {:?}", parsed.root.kind);
        };
        assert_eq!(type_name, "pkg.Msg");
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_incomplete_expression_errors() {
        assert!(parse("1 +").is_err());
        assert!(parse("(a").is_err());
        assert!(parse("a b").is_err());
    }

    #[test]
    fn test_deeply_nested_parentheses_report_an_error() {
        let source = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = parse(&source).unwrap_err();
        assert!(err.errors()[0].message.contains("recursion limit"));
    }

    #[test]
    fn test_deep_unary_chain_reports_an_error() {
        let source = format!("{}x", "!".repeat(10_000));
        assert!(parse(&source).is_err());
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&source).is_ok());
    }

    #[test]
    fn test_negative_literal_folds() {
        let parsed = parse("-42").unwrap();
        assert_eq!(parsed.root.kind, ExprKind::Literal(Literal::Int(-42)));
        let range = parsed.info.offset_range(parsed.root.id).unwrap();
        assert_eq!((range.start, range.stop), (0, 3));
    }
}
