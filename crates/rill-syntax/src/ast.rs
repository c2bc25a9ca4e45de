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

//! Abstract syntax tree for Rill expressions.
//!
//! Every node carries a numeric id that is unique within one parse (ids are
//! not stable across re-parses). Source positions live in [`SourceInfo`],
//! keyed by id, as half-open rune-offset ranges. Comprehension macros
//! (`map`, `filter`, `all`, `exists`, `exists_one`, `has`) are expanded at
//! parse time; when macro-call tracking is enabled the pre-expansion call
//! form is preserved in a side table so tooling can recover the original
//! spelling.

use std::collections::HashMap;

/// A half-open range of rune (code point) offsets into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetRange {
    /// Inclusive start, in runes from the beginning of the text.
    pub start: u32,
    /// Exclusive stop.
    pub stop: u32,
}

impl OffsetRange {
    /// Create a range. `start <= stop` is expected but not enforced.
    pub fn new(start: u32, stop: u32) -> Self {
        Self { start, stop }
    }

    /// Width of the range in runes.
    pub fn width(&self) -> u32 {
        self.stop.saturating_sub(self.start)
    }
}

/// A literal constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer (`42u`).
    Uint(u64),
    /// IEEE-754 double.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Byte string (`b"..."`).
    Bytes(Vec<u8>),
    /// Boolean.
    Bool(bool),
    /// The null value.
    Null,
}

/// One key/value entry of a map literal.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    /// Node id of the entry itself.
    pub id: u64,
    /// Key expression.
    pub key: Expr,
    /// Value expression.
    pub value: Expr,
}

/// One field initializer of a struct construction expression.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    /// Node id of the field initializer.
    pub id: u64,
    /// Field name.
    pub name: String,
    /// Value expression.
    pub value: Expr,
}

/// The closed set of expression kinds.
///
/// Traversals match this exhaustively; adding a kind is a compile-time
/// visible change at every walk site.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A bare identifier reference.
    Ident(String),
    /// A function, method, or operator call. Operators use internal names
    /// (`_+_`, `!_`, `@in`); see the [`crate::operators`] module.
    Call {
        /// Function name (internal spelling for operators).
        function: String,
        /// Receiver for member calls, `None` for global calls.
        target: Option<Box<Expr>>,
        /// Positional arguments.
        args: Vec<Expr>,
    },
    /// A list literal.
    List {
        /// Element expressions.
        elements: Vec<Expr>,
    },
    /// A map literal.
    Map {
        /// Key/value entries in source order.
        entries: Vec<MapEntry>,
    },
    /// A struct construction expression, `Name{field: value}`.
    Struct {
        /// The (possibly qualified) type name.
        type_name: String,
        /// Field initializers in source order.
        fields: Vec<StructField>,
    },
    /// A field selection, `operand.field`.
    Select {
        /// The expression being selected from.
        operand: Box<Expr>,
        /// The selected field name.
        field: String,
        /// True for presence tests produced by the `has()` macro.
        test_only: bool,
    },
    /// A constant literal.
    Literal(Literal),
    /// An expanded comprehension (iterate-and-accumulate loop).
    Comprehension {
        /// Declared loop variable name.
        iter_var: String,
        /// Expression producing the range being iterated.
        iter_range: Box<Expr>,
        /// Accumulator variable name.
        accu_var: String,
        /// Accumulator initializer.
        accu_init: Box<Expr>,
        /// Loop continuation condition.
        loop_condition: Box<Expr>,
        /// Per-element accumulator update.
        loop_step: Box<Expr>,
        /// Final result computed from the accumulator.
        result: Box<Expr>,
    },
    /// A hole left by an error during parsing.
    Unspecified,
}

/// An expression node: a unique-per-parse id plus a kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// Node id, unique within one parse.
    pub id: u64,
    /// What this node is.
    pub kind: ExprKind,
}

impl Expr {
    /// Create a node.
    pub fn new(id: u64, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    /// An unspecified node with id 0, used as an error placeholder.
    pub fn unspecified() -> Self {
        Self {
            id: 0,
            kind: ExprKind::Unspecified,
        }
    }

    /// Invoke `f` on each direct child expression, in source order.
    ///
    /// This is the single recursion point shared by every traversal in the
    /// workspace; features supply leaf actions, not the walk.
    pub fn walk_children<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        match &self.kind {
            ExprKind::Ident(_) | ExprKind::Literal(_) | ExprKind::Unspecified => {}
            ExprKind::Call { target, args, .. } => {
                if let Some(target) = target {
                    f(target);
                }
                for arg in args {
                    f(arg);
                }
            }
            ExprKind::List { elements } => {
                for elem in elements {
                    f(elem);
                }
            }
            ExprKind::Map { entries } => {
                for entry in entries {
                    f(&entry.key);
                    f(&entry.value);
                }
            }
            ExprKind::Struct { fields, .. } => {
                for field in fields {
                    f(&field.value);
                }
            }
            ExprKind::Select { operand, .. } => {
                f(operand);
            }
            ExprKind::Comprehension {
                iter_range,
                accu_init,
                loop_condition,
                loop_step,
                result,
                ..
            } => {
                f(iter_range);
                f(accu_init);
                f(loop_condition);
                f(loop_step);
                f(result);
            }
        }
    }

    /// Pre-order walk of the whole subtree. Returns `false` if `f` stopped
    /// the walk early.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr) -> bool) -> bool {
        if !f(self) {
            return false;
        }
        let mut cont = true;
        self.walk_children(&mut |child| {
            if cont {
                cont = child.walk(f);
            }
        });
        cont
    }

    /// Find the node with the given id anywhere in this subtree.
    pub fn find_by_id(&self, id: u64) -> Option<&Expr> {
        let mut found = None;
        self.walk(&mut |e| {
            if e.id == id {
                found = Some(e);
                false
            } else {
                true
            }
        });
        found
    }

    /// True if this subtree contains a node with the given id.
    pub fn contains_id(&self, id: u64) -> bool {
        self.find_by_id(id).is_some()
    }
}

/// Position and macro metadata for one parse.
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    ranges: HashMap<u64, OffsetRange>,
    macro_calls: HashMap<u64, Expr>,
    /// Rune offsets of the start of each line (line 0 starts at 0).
    line_starts: Vec<u32>,
}

impl SourceInfo {
    /// Build source info for the given text (computes the line table).
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (rune_idx, ch) in text.chars().enumerate() {
            if ch == '\n' {
                line_starts.push(rune_idx as u32 + 1);
            }
        }
        Self {
            ranges: HashMap::new(),
            macro_calls: HashMap::new(),
            line_starts,
        }
    }

    /// Record the rune-offset range of a node.
    pub fn set_range(&mut self, id: u64, range: OffsetRange) {
        self.ranges.insert(id, range);
    }

    /// The rune-offset range of a node, if it has one. Nodes synthesized
    /// by macro expansion may not.
    pub fn offset_range(&self, id: u64) -> Option<OffsetRange> {
        self.ranges.get(&id).copied()
    }

    /// Record the pre-expansion call form for an expanded comprehension.
    pub fn set_macro_call(&mut self, id: u64, call: Expr) {
        self.macro_calls.insert(id, call);
    }

    /// Expanded-node id → pre-expansion call form.
    pub fn macro_calls(&self) -> &HashMap<u64, Expr> {
        &self.macro_calls
    }

    /// The 1-based line / 0-based rune column of a node's start, or
    /// [`crate::SourceLocation::NONE`] if the node has no range.
    pub fn start_location(&self, id: u64) -> crate::SourceLocation {
        match self.offset_range(id) {
            Some(range) => self.location_of_offset(range.start),
            None => crate::SourceLocation::NONE,
        }
    }

    /// Convert a rune offset to a 1-based line / 0-based rune column.
    pub fn location_of_offset(&self, rune_offset: u32) -> crate::SourceLocation {
        // partition_point: number of line starts at or before the offset.
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= rune_offset)
            .saturating_sub(1);
        let column = rune_offset - self.line_starts[line_idx];
        crate::SourceLocation::new(line_idx as u32 + 1, column)
    }
}

/// The output of a successful parse: source text, root node, and metadata.
#[derive(Debug, Clone)]
pub struct ParsedExpr {
    /// The source text that was parsed.
    pub source: String,
    /// Root of the expression tree.
    pub root: Expr,
    /// Per-node position and macro metadata.
    pub info: SourceInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(id: u64, name: &str) -> Expr {
        Expr::new(id, ExprKind::Ident(name.to_string()))
    }

    #[test]
    fn test_walk_visits_preorder() {
        let expr = Expr::new(
            1,
            ExprKind::Call {
                function: "_+_".to_string(),
                target: None,
                args: vec![ident(2, "a"), ident(3, "b")],
            },
        );
        let mut seen = Vec::new();
        expr.walk(&mut |e| {
            seen.push(e.id);
            true
        });
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_walk_stops_early() {
        let expr = Expr::new(
            1,
            ExprKind::List {
                elements: vec![ident(2, "a"), ident(3, "b"), ident(4, "c")],
            },
        );
        let mut seen = Vec::new();
        expr.walk(&mut |e| {
            seen.push(e.id);
            e.id != 3
        });
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_find_by_id() {
        let expr = Expr::new(
            7,
            ExprKind::Select {
                operand: Box::new(ident(8, "request")),
                field: "path".to_string(),
                test_only: false,
            },
        );
        assert!(expr.contains_id(8));
        assert!(!expr.contains_id(9));
        assert_eq!(
            expr.find_by_id(8).map(|e| e.id),
            Some(8),
        );
    }

    #[test]
    fn test_location_of_offset() {
        let info = SourceInfo::new("ab\ncd\ne");
        let loc = info.location_of_offset(0);
        assert_eq!((loc.line, loc.column), (1, 0));
        let loc = info.location_of_offset(4);
        assert_eq!((loc.line, loc.column), (2, 1));
        let loc = info.location_of_offset(6);
        assert_eq!((loc.line, loc.column), (3, 0));
    }
}
