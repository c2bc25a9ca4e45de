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

//! Canonical rendering of expressions back to source text.
//!
//! Macro invocations are rendered from the pre-expansion call forms
//! recorded in [`SourceInfo`]; a comprehension without such a record
//! cannot be spelled and makes `unparse` return `None`.

use crate::ast::{Expr, ExprKind, Literal, ParsedExpr, SourceInfo};
use crate::operators;

// Binding strengths, loosest first. Used to decide parenthesization.
const PREC_TERNARY: u8 = 1;
const PREC_OR: u8 = 2;
const PREC_AND: u8 = 3;
const PREC_RELATION: u8 = 4;
const PREC_ADD: u8 = 5;
const PREC_MUL: u8 = 6;
const PREC_UNARY: u8 = 7;
const PREC_POSTFIX: u8 = 8;

/// Render a parsed expression as canonical source text.
pub fn unparse(parsed: &ParsedExpr) -> Option<String> {
    let mut out = String::new();
    write_expr(&mut out, &parsed.root, &parsed.info, 0)?;
    Some(out)
}

fn binary_precedence(function: &str) -> Option<u8> {
    let precedence = match function {
        operators::LOGICAL_OR => PREC_OR,
        operators::LOGICAL_AND => PREC_AND,
        operators::EQUALS
        | operators::NOT_EQUALS
        | operators::LESS
        | operators::LESS_EQUALS
        | operators::GREATER
        | operators::GREATER_EQUALS
        | operators::IN => PREC_RELATION,
        operators::ADD | operators::SUBTRACT => PREC_ADD,
        operators::MULTIPLY | operators::DIVIDE | operators::MODULO => PREC_MUL,
        _ => return None,
    };
    Some(precedence)
}

fn write_expr(out: &mut String, expr: &Expr, info: &SourceInfo, min_prec: u8) -> Option<()> {
    if let Some(call) = info.macro_calls().get(&expr.id) {
        return write_macro_call(out, call, info);
    }
    match &expr.kind {
        ExprKind::Ident(name) => {
            out.push_str(name);
            Some(())
        }
        ExprKind::Literal(literal) => {
            write_literal(out, literal);
            Some(())
        }
        ExprKind::List { elements } => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, element, info, 0)?;
            }
            out.push(']');
            Some(())
        }
        ExprKind::Map { entries } => {
            out.push('{');
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, &entry.key, info, 0)?;
                out.push_str(": ");
                write_expr(out, &entry.value, info, 0)?;
            }
            out.push('}');
            Some(())
        }
        ExprKind::Struct { type_name, fields } => {
            out.push_str(type_name);
            out.push('{');
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&field.name);
                out.push_str(": ");
                write_expr(out, &field.value, info, 0)?;
            }
            out.push('}');
            Some(())
        }
        ExprKind::Select { operand, field, .. } => {
            write_expr(out, operand, info, PREC_POSTFIX)?;
            out.push('.');
            out.push_str(field);
            Some(())
        }
        ExprKind::Call {
            function,
            target,
            args,
        } => write_call(out, function, target.as_deref(), args, info, min_prec),
        // Reachable only when macro tracking was disabled.
        ExprKind::Comprehension { .. } => None,
        ExprKind::Unspecified => None,
    }
}

fn write_call(
    out: &mut String,
    function: &str,
    target: Option<&Expr>,
    args: &[Expr],
    info: &SourceInfo,
    min_prec: u8,
) -> Option<()> {
    if function == operators::CONDITIONAL && args.len() == 3 {
        let parens = min_prec > PREC_TERNARY;
        if parens {
            out.push('(');
        }
        write_expr(out, &args[0], info, PREC_TERNARY + 1)?;
        out.push_str(" ? ");
        write_expr(out, &args[1], info, PREC_TERNARY)?;
        out.push_str(" : ");
        write_expr(out, &args[2], info, PREC_TERNARY)?;
        if parens {
            out.push(')');
        }
        return Some(());
    }
    if function == operators::INDEX && args.len() == 2 {
        write_expr(out, &args[0], info, PREC_POSTFIX)?;
        out.push('[');
        write_expr(out, &args[1], info, 0)?;
        out.push(']');
        return Some(());
    }
    if (function == operators::LOGICAL_NOT || function == operators::NEGATE) && args.len() == 1 {
        let parens = min_prec > PREC_UNARY;
        if parens {
            out.push('(');
        }
        out.push(if function == operators::LOGICAL_NOT {
            '!'
        } else {
            '-'
        });
        write_expr(out, &args[0], info, PREC_UNARY)?;
        if parens {
            out.push(')');
        }
        return Some(());
    }
    if let (Some(precedence), [lhs, rhs]) = (binary_precedence(function), args) {
        let symbol = operators::find_reverse(function)?;
        let parens = min_prec > precedence;
        if parens {
            out.push('(');
        }
        write_expr(out, lhs, info, precedence)?;
        out.push(' ');
        out.push_str(symbol);
        out.push(' ');
        write_expr(out, rhs, info, precedence + 1)?;
        if parens {
            out.push(')');
        }
        return Some(());
    }

    if let Some(target) = target {
        write_expr(out, target, info, PREC_POSTFIX)?;
        out.push('.');
    }
    out.push_str(function);
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, arg, info, 0)?;
    }
    out.push(')');
    Some(())
}

fn write_macro_call(out: &mut String, call: &Expr, info: &SourceInfo) -> Option<()> {
    let ExprKind::Call {
        function,
        target,
        args,
    } = &call.kind
    else {
        return None;
    };
    write_call(out, function, target.as_deref(), args, info, 0)
}

fn write_literal(out: &mut String, literal: &Literal) {
    match literal {
        Literal::Int(v) => out.push_str(&v.to_string()),
        Literal::Uint(v) => {
            out.push_str(&v.to_string());
            out.push('u');
        }
        Literal::Double(v) => {
            if v.fract() == 0.0 && v.is_finite() {
                out.push_str(&format!("{v:.1}"));
            } else {
                out.push_str(&v.to_string());
            }
        }
        Literal::String(v) => out.push_str(&format!("{v:?}")),
        Literal::Bytes(v) => {
            out.push_str("b\"");
            for byte in v {
                if byte.is_ascii_graphic() || *byte == b' ' {
                    out.push(*byte as char);
                } else {
                    out.push_str(&format!("\\x{byte:02x}"));
                }
            }
            out.push('"');
        }
        Literal::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Literal::Null => out.push_str("null"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn round_trip(source: &str) -> String {
        unparse(&parse(source).unwrap()).unwrap()
    }

    #[test]
    fn test_normalizes_whitespace() {
        assert_eq!(round_trip("1+2 *  3"), "1 + 2 * 3");
    }

    #[test]
    fn test_keeps_necessary_parens() {
        assert_eq!(round_trip("(1 + 2) * 3"), "(1 + 2) * 3");
        assert_eq!(round_trip("-(a + b)"), "-(a + b)");
        assert_eq!(round_trip("(a ? b : c) + 1"), "(a ? b : c) + 1");
    }

    #[test]
    fn test_drops_redundant_parens() {
        assert_eq!(round_trip("(1) + (2)"), "1 + 2");
        assert_eq!(round_trip("1 + (2 * 3)"), "1 + 2 * 3");
    }

    #[test]
    fn test_macro_spelling_is_preserved() {
        assert_eq!(
            round_trip("[1,2,3].map(x,x*2)"),
            "[1, 2, 3].map(x, x * 2)"
        );
        assert_eq!(round_trip("has(request.path)"), "has(request.path)");
        assert_eq!(
            round_trip("xs.filter(v, v > 0 && v < 10)"),
            "xs.filter(v, v > 0 && v < 10)"
        );
    }

    #[test]
    fn test_left_associative_subtraction_keeps_parens() {
        assert_eq!(round_trip("1 - (2 - 3)"), "1 - (2 - 3)");
        assert_eq!(round_trip("(1 - 2) - 3"), "1 - 2 - 3");
    }

    #[test]
    fn test_literals_render() {
        assert_eq!(round_trip("[1, 2u, 3.0, 'a', true, null]"), "[1, 2u, 3.0, \"a\", true, null]");
    }

    #[test]
    fn test_member_calls_and_index() {
        assert_eq!(
            round_trip("request.headers['x'].size()"),
            "request.headers[\"x\"].size()"
        );
    }
}
