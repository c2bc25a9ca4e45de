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

//! Whole-document formatting via the canonical unparser.
//!
//! Comment lines before and after the expression are kept in place.
//! Comments inside or alongside the expression cannot be re-attached
//! after unparsing, so such documents are left untouched. String
//! literals are normalized to double-quote form.

use lsp_types::{Position, Range, TextEdit};

use crate::position::PositionIndex;

/// Canonical formatting edits for a document. `None` when the document
/// does not parse, carries interleaved comments, or is already
/// canonical.
pub fn format(text: &str) -> Option<Vec<TextEdit>> {
    let lines: Vec<&str> = text.lines().collect();

    let leading_end = lines
        .iter()
        .position(|line| !is_comment_or_blank(line))
        .unwrap_or(lines.len());
    let trailing_start = lines
        .iter()
        .rposition(|line| !is_comment_or_blank(line))
        .map(|i| i + 1)
        .unwrap_or(leading_end);

    let code_lines = &lines[leading_end..trailing_start];
    if code_lines.is_empty() {
        return None;
    }
    if code_lines.iter().any(|line| has_inline_comment(line)) {
        return None;
    }

    let code = code_lines.join("\n");
    let parsed = rill_syntax::parse(&code).ok()?;
    let canonical = rill_syntax::unparse(&parsed)?;

    let mut formatted = String::new();
    for line in &lines[..leading_end] {
        formatted.push_str(line);
        formatted.push('\n');
    }
    formatted.push_str(&canonical);
    formatted.push('\n');
    for line in &lines[trailing_start..] {
        formatted.push_str(line);
        formatted.push('\n');
    }

    if formatted == text {
        return None;
    }

    let index = PositionIndex::new(text);
    let last_line = index.line_count() - 1;
    Some(vec![TextEdit {
        range: Range {
            start: Position::new(0, 0),
            end: index.end_of_line(last_line),
        },
        new_text: formatted,
    }])
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with("//")
}

/// True when a code line carries a `//` comment outside any string
/// literal.
fn has_inline_comment(line: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev_slash = false;
    for ch in line.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            prev_slash = false;
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                prev_slash = false;
            }
            '/' => {
                if prev_slash {
                    return true;
                }
                prev_slash = true;
            }
            _ => prev_slash = false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatted(source: &str) -> Option<String> {
        format(source).map(|edits| edits[0].new_text.clone())
    }

    #[test]
    fn test_normalizes_whitespace() {
        assert_eq!(formatted("1+2 *  3"), Some("1 + 2 * 3\n".to_string()));
    }

    #[test]
    fn test_preserves_macro_spelling() {
        assert_eq!(
            formatted("[1,2].map(x,x*2)"),
            Some("[1, 2].map(x, x * 2)\n".to_string())
        );
    }

    #[test]
    fn test_already_canonical_needs_no_edit() {
        assert!(format("1 + 2\n").is_none());
    }

    #[test]
    fn test_keeps_leading_comments() {
        let result = formatted("// a policy\n1+1").unwrap();
        assert_eq!(result, "// a policy\n1 + 1\n");
    }

    #[test]
    fn test_keeps_trailing_comments() {
        let result = formatted("1+1\n// the end\n").unwrap();
        assert_eq!(result, "1 + 1\n// the end\n");
    }

    #[test]
    fn test_declines_inline_comments() {
        assert!(format("1 + 1 // inline").is_none());
        assert!(format("1 +\n// between\n1").is_none());
    }

    #[test]
    fn test_slashes_inside_strings_are_not_comments() {
        assert_eq!(
            formatted("'http://x'  + 'y'"),
            Some("\"http://x\" + \"y\"\n".to_string())
        );
    }

    #[test]
    fn test_unparseable_is_untouched() {
        assert!(format("1 +").is_none());
    }

    #[test]
    fn test_comment_only_document_is_untouched() {
        assert!(format("// nothing here\n").is_none());
    }

    #[test]
    fn test_multi_line_expression_collapses() {
        assert_eq!(formatted("1 +\n  2"), Some("1 + 2\n".to_string()));
    }
}
