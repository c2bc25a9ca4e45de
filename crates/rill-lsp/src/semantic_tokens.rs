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

//! Semantic token classification and wire encoding.

use lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokens,
    SemanticTokensLegend,
};
use rill_syntax::{operators, Expr, ExprKind, Literal, OffsetRange, ParsedExpr, Type};

use crate::position::PositionIndex;

// Indices into the legend's token_types.
const TYPE_VARIABLE: u32 = 0;
const TYPE_FUNCTION: u32 = 1;
const TYPE_METHOD: u32 = 2;
const TYPE_MACRO: u32 = 3;
const TYPE_KEYWORD: u32 = 4;
const TYPE_TYPE: u32 = 5;
const TYPE_PROPERTY: u32 = 6;
const TYPE_NUMBER: u32 = 7;
const TYPE_STRING: u32 = 8;
const TYPE_OPERATOR: u32 = 9;
const TYPE_COMMENT: u32 = 10;

// Bit positions into the legend's token_modifiers.
const MOD_DEFAULT_LIBRARY: u32 = 1 << 0;

/// The token legend advertised in the server capabilities. Token data
/// indexes into this.
pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: vec![
            SemanticTokenType::VARIABLE,
            SemanticTokenType::FUNCTION,
            SemanticTokenType::METHOD,
            SemanticTokenType::MACRO,
            SemanticTokenType::KEYWORD,
            SemanticTokenType::TYPE,
            SemanticTokenType::PROPERTY,
            SemanticTokenType::NUMBER,
            SemanticTokenType::STRING,
            SemanticTokenType::OPERATOR,
            SemanticTokenType::COMMENT,
        ],
        token_modifiers: vec![SemanticTokenModifier::DEFAULT_LIBRARY],
    }
}

/// Classified tokens for a whole document, delta encoded. `None` when
/// the text does not parse or produces no tokens.
pub fn semantic_tokens(text: &str) -> Option<SemanticTokens> {
    let parsed = rill_syntax::parse(text).ok()?;
    let index = PositionIndex::new(text);

    let mut raw: Vec<(OffsetRange, u32, u32)> = Vec::new();
    collect(&parsed, &mut raw);
    if raw.is_empty() {
        return None;
    }
    raw.sort_by_key(|(range, _, _)| (range.start, range.stop));
    raw.dedup_by_key(|(range, _, _)| *range);

    let mut data = Vec::with_capacity(raw.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;
    for (range, token_type, modifiers) in raw {
        let lsp_range = index.range_of(range);
        let line = lsp_range.start.line;
        let start = lsp_range.start.character;
        let delta_start = if line == prev_line {
            start - prev_start
        } else {
            start
        };
        data.push(SemanticToken {
            delta_line: line - prev_line,
            delta_start,
            length: lsp_range.end.character - lsp_range.start.character,
            token_type,
            token_modifiers_bitset: modifiers,
        });
        prev_line = line;
        prev_start = start;
    }
    Some(SemanticTokens {
        result_id: None,
        data,
    })
}

fn collect(parsed: &ParsedExpr, out: &mut Vec<(OffsetRange, u32, u32)>) {
    parsed.root.walk(&mut |expr| {
        collect_node(parsed, expr, out);
        true
    });
    // Macro names and loop-variable binders only exist in the
    // pre-expansion call forms.
    for call in parsed.info.macro_calls().values() {
        let ExprKind::Call {
            function,
            target,
            args,
        } = &call.kind
        else {
            continue;
        };
        if let Some(range) = name_range(parsed, function, target.as_deref(), call.id) {
            out.push((range, TYPE_MACRO, 0));
        }
        if let [binder, _body] = args.as_slice() {
            if matches!(binder.kind, ExprKind::Ident(_)) {
                if let Some(range) = parsed.info.offset_range(binder.id) {
                    out.push((range, TYPE_VARIABLE, 0));
                }
            }
        }
    }
    collect_comments(&parsed.source, out);
}

fn collect_node(parsed: &ParsedExpr, expr: &Expr, out: &mut Vec<(OffsetRange, u32, u32)>) {
    let Some(range) = parsed.info.offset_range(expr.id) else {
        return;
    };
    match &expr.kind {
        ExprKind::Ident(name) => {
            if Type::from_name(name).is_some() {
                out.push((range, TYPE_TYPE, MOD_DEFAULT_LIBRARY));
            } else {
                out.push((range, TYPE_VARIABLE, 0));
            }
        }
        ExprKind::Literal(literal) => {
            let token_type = match literal {
                Literal::Int(_) | Literal::Uint(_) | Literal::Double(_) => TYPE_NUMBER,
                Literal::String(_) | Literal::Bytes(_) => TYPE_STRING,
                Literal::Bool(_) | Literal::Null => TYPE_KEYWORD,
            };
            out.push((range, token_type, 0));
        }
        ExprKind::Call {
            function, target, ..
        } if !operators::is_operator(function) => {
            let token_type = if operators::is_macro(function) {
                TYPE_MACRO
            } else if target.is_some() {
                TYPE_METHOD
            } else {
                TYPE_FUNCTION
            };
            if let Some(name) = name_range(parsed, function, target.as_deref(), expr.id) {
                out.push((name, token_type, 0));
            }
        }
        ExprKind::Call { function, args, .. }
            if operators::is_operator(function)
                && function != operators::CONDITIONAL
                && function != operators::INDEX =>
        {
            if let Some(symbol) = operators::find_reverse(function) {
                if let Some(name) = operator_symbol_range(parsed, range, args, symbol) {
                    out.push((name, TYPE_OPERATOR, 0));
                }
            }
        }
        ExprKind::Select { operand, field, .. } => {
            if let Some(operand_range) = parsed.info.offset_range(operand.id) {
                if let Some(name) = find_word_range(&parsed.source, field, operand_range.stop) {
                    out.push((name, TYPE_PROPERTY, 0));
                }
            }
        }
        _ => {}
    }
}

fn name_range(
    parsed: &ParsedExpr,
    function: &str,
    target: Option<&Expr>,
    call_id: u64,
) -> Option<OffsetRange> {
    let call_range = parsed.info.offset_range(call_id)?;
    match target {
        None => {
            let len = function.chars().count() as u32;
            Some(OffsetRange::new(call_range.start, call_range.start + len))
        }
        Some(target) => {
            let from = parsed.info.offset_range(target.id)?.stop;
            find_word_range(&parsed.source, function, from)
        }
    }
}

fn operator_symbol_range(
    parsed: &ParsedExpr,
    call_range: OffsetRange,
    args: &[Expr],
    symbol: &str,
) -> Option<OffsetRange> {
    let symbol_len = symbol.chars().count() as u32;
    match args {
        // Prefix operators start their node range at the symbol.
        [_operand] => Some(OffsetRange::new(
            call_range.start,
            call_range.start + symbol_len,
        )),
        [lhs, rhs] => {
            let from = parsed.info.offset_range(lhs.id)?.stop;
            let to = parsed.info.offset_range(rhs.id)?.start;
            find_symbol_range(&parsed.source, symbol, from, to)
        }
        _ => None,
    }
}

/// Locates `symbol` in the trivia between two operand ranges. Line
/// comments are skipped so a symbol character inside one is not
/// mistaken for the operator.
fn find_symbol_range(source: &str, symbol: &str, from: u32, to: u32) -> Option<OffsetRange> {
    let runes: Vec<char> = source.chars().collect();
    let symbol_runes: Vec<char> = symbol.chars().collect();
    let stop = (to as usize).min(runes.len());
    let mut at = from as usize;
    while at + symbol_runes.len() <= stop {
        if runes[at] == '/' && runes.get(at + 1) == Some(&'/') {
            while at < stop && runes[at] != '\n' {
                at += 1;
            }
            continue;
        }
        if runes[at..at + symbol_runes.len()] == symbol_runes[..] {
            return Some(OffsetRange::new(
                at as u32,
                (at + symbol_runes.len()) as u32,
            ));
        }
        at += 1;
    }
    None
}

/// Line comments never reach the syntax tree, so they are recovered
/// with a direct scan of the source text.
fn collect_comments(source: &str, out: &mut Vec<(OffsetRange, u32, u32)>) {
    let runes: Vec<char> = source.chars().collect();
    let mut at = 0usize;
    let mut in_string: Option<char> = None;
    while at < runes.len() {
        let rune = runes[at];
        match in_string {
            Some(quote) => {
                if rune == '\\' {
                    at += 1;
                } else if rune == quote {
                    in_string = None;
                }
            }
            None => {
                if rune == '"' || rune == '\'' {
                    in_string = Some(rune);
                } else if rune == '/' && runes.get(at + 1) == Some(&'/') {
                    let start = at;
                    while at < runes.len() && runes[at] != '\n' {
                        at += 1;
                    }
                    out.push((
                        OffsetRange::new(start as u32, at as u32),
                        TYPE_COMMENT,
                        0,
                    ));
                    continue;
                }
            }
        }
        at += 1;
    }
}

fn find_word_range(source: &str, word: &str, from: u32) -> Option<OffsetRange> {
    use rill_syntax::is_identifier_char;

    let runes: Vec<char> = source.chars().collect();
    let word_runes: Vec<char> = word.chars().collect();
    if word_runes.is_empty() {
        return None;
    }
    let mut start = from as usize;
    while start + word_runes.len() <= runes.len() {
        if runes[start..start + word_runes.len()] == word_runes[..] {
            let before_ok = start == 0 || !is_identifier_char(runes[start - 1]);
            let after = start + word_runes.len();
            let after_ok = after >= runes.len() || !is_identifier_char(runes[after]);
            if before_ok && after_ok {
                return Some(OffsetRange::new(start as u32, after as u32));
            }
        }
        start += 1;
    }
    None
}
