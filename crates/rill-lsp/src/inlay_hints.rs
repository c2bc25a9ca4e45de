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

//! Constant-result inlay hints.
//!
//! A document whose expression checks cleanly and folds to a constant
//! gets one hint after the expression showing the value and its type.

use lsp_types::{InlayHint, InlayHintKind, InlayHintLabel, Range};
use rill_syntax::{check, eval, parse, Env};

use crate::position::PositionIndex;

/// The constant-value hint for a document, when its expression can be
/// evaluated without bindings and the hint falls inside `range`.
pub fn inlay_hints(text: &str, range: Range, env: &Env) -> Vec<InlayHint> {
    let Ok(parsed) = parse(text) else {
        return Vec::new();
    };
    if check(&parsed, env).is_err() {
        return Vec::new();
    }
    let Ok(value) = eval(&parsed) else {
        return Vec::new();
    };

    let index = PositionIndex::new(text);
    let end_byte = text.trim_end().len();
    let position = index.position_of_byte(end_byte);
    let in_range = (range.start.line, range.start.character) <= (position.line, position.character)
        && (position.line, position.character) <= (range.end.line, range.end.character);
    if !in_range {
        return Vec::new();
    }

    vec![InlayHint {
        position,
        label: InlayHintLabel::String(format!("→ {} ({})", value, value.type_of())),
        kind: Some(InlayHintKind::TYPE),
        text_edits: None,
        tooltip: None,
        padding_left: Some(true),
        padding_right: Some(false),
        data: None,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Position;

    fn whole_document() -> Range {
        Range {
            start: Position::new(0, 0),
            end: Position::new(u32::MAX, u32::MAX),
        }
    }

    fn hint_label(source: &str) -> Option<String> {
        let hints = inlay_hints(source, whole_document(), &Env::standard());
        hints.first().map(|h| match &h.label {
            InlayHintLabel::String(s) => s.clone(),
            _ => String::new(),
        })
    }

    #[test]
    fn test_constant_arithmetic() {
        assert_eq!(hint_label("1 + 2 * 3"), Some("→ 7 (int)".to_string()));
    }

    #[test]
    fn test_constant_comprehension() {
        assert_eq!(
            hint_label("[1, 2, 3].map(x, x * 2)"),
            Some("→ [2, 4, 6] (list)".to_string())
        );
    }

    #[test]
    fn test_string_result() {
        assert_eq!(
            hint_label("'a' + 'b'"),
            Some("→ \"ab\" (string)".to_string())
        );
    }

    #[test]
    fn test_hint_sits_after_trimmed_content() {
        let hints = inlay_hints("1 + 2  ", whole_document(), &Env::standard());
        assert_eq!(hints[0].position, Position::new(0, 5));
    }

    #[test]
    fn test_undeclared_variable_has_no_hint() {
        assert!(hint_label("x + 1").is_none());
    }

    #[test]
    fn test_parse_error_has_no_hint() {
        assert!(hint_label("1 +").is_none());
    }

    #[test]
    fn test_division_by_zero_has_no_hint() {
        assert!(hint_label("1 / 0").is_none());
    }

    #[test]
    fn test_hint_outside_requested_range_is_dropped() {
        let range = Range {
            start: Position::new(1, 0),
            end: Position::new(2, 0),
        };
        assert!(inlay_hints("1 + 2", range, &Env::standard()).is_empty());
    }
}
