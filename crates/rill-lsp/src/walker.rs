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

//! Syntax walking and scope resolution.
//!
//! Identifier lookup, binder resolution, and occurrence enumeration for
//! rename, references, and highlight. Comprehensions appear in two
//! shapes: expanded [`ExprKind::Comprehension`] nodes, and unexpanded
//! macro calls when a tree was parsed without expansion; both bind their
//! loop variable and both are handled here.
//!
//! The loop-variable binder of an expanded comprehension normally keeps
//! its position through the macro-call side table. A comprehension
//! without such a record falls back to a textual scan: the first
//! word-bounded occurrence of the variable name after the iteration
//! range. The scan can mis-identify the binder when the name first
//! appears inside a string literal or a comment between the range and
//! the binder.

use rill_syntax::{
    is_identifier_char, operators, Expr, ExprKind, OffsetRange, ParsedExpr, SourceInfo,
};

/// The binding scope of an identifier occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Not bound by any comprehension; refers to the environment.
    TopLevel,
    /// Bound as the loop variable of one comprehension.
    LoopVariable {
        /// Node id of the binding comprehension (or macro call).
        comprehension_id: u64,
        /// Surface macro name, or `unknown` when the pre-expansion call
        /// form was not recorded.
        macro_name: String,
    },
}

/// What kind of name an offset points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentKind {
    /// A value reference (variable or loop variable).
    Variable,
    /// A function or macro name in call position.
    Function,
}

/// An identifier found at a cursor offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierAt {
    /// The identifier text.
    pub name: String,
    /// Its rune range in the source.
    pub range: OffsetRange,
    /// Id of the node it belongs to. For a function name this is the
    /// call node; for a binder it is the pre-expansion argument node.
    pub node_id: u64,
    /// Variable or function position.
    pub kind: IdentKind,
}

/// The smallest node whose range contains `offset`.
pub fn node_at_offset(parsed: &ParsedExpr, offset: u32) -> Option<&Expr> {
    let mut best: Option<(&Expr, OffsetRange)> = None;
    parsed.root.walk(&mut |expr| {
        if let Some(range) = parsed.info.offset_range(expr.id) {
            if range.start <= offset && offset < range.stop {
                let smaller = match best {
                    Some((_, prev)) => range.width() <= prev.width(),
                    None => true,
                };
                if smaller {
                    best = Some((expr, range));
                }
            }
        }
        true
    });
    best.map(|(expr, _)| expr)
}

/// The identifier under (or immediately after) `offset`, if any.
///
/// Candidates come from identifier nodes, function names in call
/// position, and the loop-variable binders recorded in the macro-call
/// table. The narrowest candidate wins.
pub fn identifier_at_offset(parsed: &ParsedExpr, offset: u32) -> Option<IdentifierAt> {
    let mut candidates: Vec<IdentifierAt> = Vec::new();

    parsed.root.walk(&mut |expr| {
        collect_candidates(expr, parsed, &mut candidates);
        true
    });
    for call in parsed.info.macro_calls().values() {
        // The binder argument exists only in the pre-expansion form.
        if let ExprKind::Call { function, target, args } = &call.kind {
            if let Some(binder) = macro_binder(function, args) {
                if let Some(range) = parsed.info.offset_range(binder.id) {
                    candidates.push(IdentifierAt {
                        name: binder_name(binder).to_string(),
                        range,
                        node_id: binder.id,
                        kind: IdentKind::Variable,
                    });
                }
            }
            if let Some(range) = function_name_range(parsed, function, target.as_deref(), call.id) {
                candidates.push(IdentifierAt {
                    name: function.clone(),
                    range,
                    node_id: call.id,
                    kind: IdentKind::Function,
                });
            }
        }
    }

    candidates
        .into_iter()
        .filter(|c| c.range.start <= offset && offset <= c.range.stop)
        .min_by_key(|c| c.range.width())
}

fn collect_candidates(expr: &Expr, parsed: &ParsedExpr, out: &mut Vec<IdentifierAt>) {
    match &expr.kind {
        ExprKind::Ident(name) => {
            if let Some(range) = parsed.info.offset_range(expr.id) {
                out.push(IdentifierAt {
                    name: name.clone(),
                    range,
                    node_id: expr.id,
                    kind: IdentKind::Variable,
                });
            }
        }
        ExprKind::Call {
            function, target, ..
        } if !operators::is_operator(function) => {
            if let Some(range) = function_name_range(parsed, function, target.as_deref(), expr.id) {
                out.push(IdentifierAt {
                    name: function.clone(),
                    range,
                    node_id: expr.id,
                    kind: IdentKind::Function,
                });
            }
        }
        _ => {}
    }
}

/// The rune range of a call's function name. Global call names sit at
/// the front of the call range; member call names are found textually
/// after the receiver.
fn function_name_range(
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
            find_word(&parsed.source, function, from)
        }
    }
}

/// First word-bounded occurrence of `word` at or after rune offset
/// `from`.
fn find_word(source: &str, word: &str, from: u32) -> Option<OffsetRange> {
    let runes: Vec<char> = source.chars().collect();
    let word_runes: Vec<char> = word.chars().collect();
    if word_runes.is_empty() {
        return None;
    }
    let mut start = from as usize;
    while start + word_runes.len() <= runes.len() {
        let matches = runes[start..start + word_runes.len()] == word_runes[..];
        if matches {
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

/// The binder argument of a loop-producing macro call, if the call has
/// that shape.
fn macro_binder<'a>(function: &str, args: &'a [Expr]) -> Option<&'a Expr> {
    if !operators::is_macro(function) || function == operators::MACRO_HAS {
        return None;
    }
    match args {
        [binder, _body] if matches!(binder.kind, ExprKind::Ident(_)) => Some(binder),
        _ => None,
    }
}

fn binder_name(binder: &Expr) -> &str {
    match &binder.kind {
        ExprKind::Ident(name) => name,
        _ => "",
    }
}

/// Resolve the binding scope of `target`.
///
/// The tree is walked top down; the first comprehension that declares
/// the name and encloses the target wins.
pub fn resolve_scope(parsed: &ParsedExpr, target: &IdentifierAt) -> Scope {
    // A binder from the macro-call table is not part of the expanded
    // tree; map it straight to its comprehension.
    for (&comp_id, call) in parsed.info.macro_calls() {
        if let ExprKind::Call { function, args, .. } = &call.kind {
            if let Some(binder) = macro_binder(function, args) {
                if binder.id == target.node_id {
                    return Scope::LoopVariable {
                        comprehension_id: comp_id,
                        macro_name: function.clone(),
                    };
                }
            }
        }
    }

    let mut scope = Scope::TopLevel;
    parsed.root.walk(&mut |expr| {
        match &expr.kind {
            ExprKind::Comprehension { iter_var, .. } if iter_var == &target.name => {
                let binds_target =
                    expr.id == target.node_id || in_comprehension_body(expr, target.node_id);
                if binds_target {
                    scope = Scope::LoopVariable {
                        comprehension_id: expr.id,
                        macro_name: macro_name_of(&parsed.info, expr.id),
                    };
                    return false;
                }
            }
            ExprKind::Call { function, args, .. } => {
                if let Some(binder) = macro_binder(function, args) {
                    if binder_name(binder) == target.name
                        && (binder.id == target.node_id || args[1].contains_id(target.node_id))
                    {
                        scope = Scope::LoopVariable {
                            comprehension_id: expr.id,
                            macro_name: function.clone(),
                        };
                        return false;
                    }
                }
            }
            _ => {}
        }
        true
    });
    scope
}

/// True if `id` lives in the parts of `comp` where the loop variable is
/// in scope. The iteration range is evaluated before the variable binds,
/// so it is excluded.
fn in_comprehension_body(comp: &Expr, id: u64) -> bool {
    let ExprKind::Comprehension {
        loop_condition,
        loop_step,
        result,
        ..
    } = &comp.kind
    else {
        return false;
    };
    loop_condition.contains_id(id) || loop_step.contains_id(id) || result.contains_id(id)
}

fn macro_name_of(info: &SourceInfo, comp_id: u64) -> String {
    match info.macro_calls().get(&comp_id).map(|call| &call.kind) {
        Some(ExprKind::Call { function, .. }) => function.clone(),
        _ => "unknown".to_string(),
    }
}

/// All source ranges where `name` refers to the binding described by
/// `scope`, sorted by start offset. The binder itself is included for
/// loop-variable scopes.
pub fn occurrences(parsed: &ParsedExpr, name: &str, scope: &Scope) -> Vec<OffsetRange> {
    let mut ranges = Vec::new();
    match scope {
        Scope::TopLevel => {
            collect_unshadowed(&parsed.root, name, parsed, &mut ranges);
        }
        Scope::LoopVariable {
            comprehension_id, ..
        } => {
            if let Some(comp) = parsed.root.find_by_id(*comprehension_id) {
                if let Some(range) = binder_range(parsed, comp) {
                    ranges.push(range);
                }
                match &comp.kind {
                    ExprKind::Comprehension {
                        loop_condition,
                        loop_step,
                        result,
                        ..
                    } => {
                        collect_unshadowed(loop_condition, name, parsed, &mut ranges);
                        collect_unshadowed(loop_step, name, parsed, &mut ranges);
                        collect_unshadowed(result, name, parsed, &mut ranges);
                    }
                    ExprKind::Call { function, args, .. }
                        if macro_binder(function, args).is_some() =>
                    {
                        collect_unshadowed(&args[1], name, parsed, &mut ranges);
                    }
                    _ => {}
                }
            }
        }
    }
    ranges.sort_by_key(|r| (r.start, r.stop));
    ranges.dedup();
    ranges
}

/// The source range of a comprehension's binder: from the macro-call
/// record when present, otherwise by textual scan after the iteration
/// range.
fn binder_range(parsed: &ParsedExpr, comp: &Expr) -> Option<OffsetRange> {
    match &comp.kind {
        ExprKind::Call { function, args, .. } => {
            let binder = macro_binder(function, args)?;
            parsed.info.offset_range(binder.id)
        }
        ExprKind::Comprehension {
            iter_var,
            iter_range,
            ..
        } => {
            if let Some(call) = parsed.info.macro_calls().get(&comp.id) {
                if let ExprKind::Call { function, args, .. } = &call.kind {
                    if let Some(binder) = macro_binder(function, args) {
                        if let Some(range) = parsed.info.offset_range(binder.id) {
                            return Some(range);
                        }
                    }
                }
            }
            // No recorded call form; fall back to scanning the text just
            // past the iteration range.
            let from = parsed.info.offset_range(iter_range.id)?.stop;
            find_word(&parsed.source, iter_var, from)
        }
        _ => None,
    }
}

/// Collect ranges of identifiers named `name` in `expr`, skipping
/// subtrees where an inner comprehension rebinds the same name.
fn collect_unshadowed(expr: &Expr, name: &str, parsed: &ParsedExpr, out: &mut Vec<OffsetRange>) {
    match &expr.kind {
        ExprKind::Ident(n) if n == name => {
            if let Some(range) = parsed.info.offset_range(expr.id) {
                out.push(range);
            }
        }
        ExprKind::Comprehension {
            iter_var,
            accu_var,
            iter_range,
            accu_init,
            ..
        } if iter_var == name || accu_var == name => {
            // Only the iteration range and the initializer see the outer
            // binding.
            collect_unshadowed(iter_range, name, parsed, out);
            collect_unshadowed(accu_init, name, parsed, out);
        }
        ExprKind::Call {
            function,
            target,
            args,
        } if macro_binder(function, args).is_some_and(|b| binder_name(b) == name) => {
            if let Some(target) = target {
                collect_unshadowed(target, name, parsed, out);
            }
        }
        _ => {
            expr.walk_children(&mut |child| collect_unshadowed(child, name, parsed, out));
        }
    }
}
