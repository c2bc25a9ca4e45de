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

//! Parse and type-check diagnostics.
//!
//! Parse failures are errors; an unparseable document is not checked.
//! Type issues are warnings, since the checker works over `dyn` and its
//! verdicts are advisory. Each diagnostic spans from the issue location
//! to the end of that line.

use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};
use rill_syntax::{check, operators, parse, Env, Issue};

use crate::position::PositionIndex;

const SOURCE: &str = "rill";

/// All diagnostics for a document. An empty or blank document has none.
pub fn diagnostics(text: &str, env: &Env) -> Vec<Diagnostic> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let index = PositionIndex::new(text);
    match parse(text) {
        Err(issues) => issues
            .0
            .iter()
            .map(|issue| diagnostic(&index, issue, DiagnosticSeverity::ERROR))
            .collect(),
        Ok(parsed) => match check(&parsed, env) {
            Err(issues) => issues
                .0
                .iter()
                .map(|issue| diagnostic(&index, issue, DiagnosticSeverity::WARNING))
                .collect(),
            Ok(_) => Vec::new(),
        },
    }
}

fn diagnostic(index: &PositionIndex, issue: &Issue, severity: DiagnosticSeverity) -> Diagnostic {
    Diagnostic {
        range: issue_range(index, issue),
        severity: Some(severity),
        source: Some(SOURCE.to_string()),
        message: readable_message(&issue.message),
        ..Diagnostic::default()
    }
}

/// From the issue location to the end of its line. Locations are
/// 1-based lines with 0-based rune columns; an absent location maps to
/// the start of the document.
fn issue_range(index: &PositionIndex, issue: &Issue) -> Range {
    if !issue.location.is_valid() {
        return Range {
            start: Position::new(0, 0),
            end: index.end_of_line(0),
        };
    }
    let line = issue.location.line - 1;
    let (line_start, _) = index.line_span(line);
    let line_start_rune = index.byte_to_rune(line_start);
    let start = index.position_of_rune(line_start_rune + issue.location.column);
    Range {
        start,
        end: index.end_of_line(line),
    }
}

/// Rewrite internal operator names in a message to their surface
/// symbols, so `_+_` reads as `+`.
fn readable_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(open) = rest.find('\'') {
        let (before, quoted) = rest.split_at(open + 1);
        out.push_str(before);
        let Some(close) = quoted.find('\'') else {
            out.push_str(quoted);
            return out;
        };
        let inner = &quoted[..close];
        match operators::find_reverse(inner) {
            Some(symbol) if operators::is_operator(inner) => out.push_str(symbol),
            _ => out.push_str(inner),
        }
        out.push('\'');
        rest = &quoted[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Vec<Diagnostic> {
        diagnostics(source, &Env::standard())
    }

    #[test]
    fn test_empty_document_has_no_diagnostics() {
        assert!(run("").is_empty());
        assert!(run("   \n  ").is_empty());
    }

    #[test]
    fn test_valid_expression_has_no_diagnostics() {
        assert!(run("1 + 2 * 3").is_empty());
    }

    #[test]
    fn test_parse_error_is_error_severity() {
        let diags = run("1 +");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diags[0].source.as_deref(), Some("rill"));
    }

    #[test]
    fn test_type_mismatch_is_warning_with_surface_operator() {
        let diags = run("1 + 'hello'");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::WARNING));
        assert!(diags[0].message.contains("'+'"), "{}", diags[0].message);
        assert!(!diags[0].message.contains("_+_"), "{}", diags[0].message);
    }

    #[test]
    fn test_undeclared_reference_is_warning() {
        let diags = run("unknown_name");
        assert_eq!(diags.len(), 1);
        assert!(
            diags[0].message.contains("undeclared reference to 'unknown_name'"),
            "{}",
            diags[0].message
        );
    }

    #[test]
    fn test_checker_reports_every_issue() {
        let diags = run("foo + bar");
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_range_extends_to_end_of_line() {
        let diags = run("1 + 'a'");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].range.end.character, 7);
    }

    #[test]
    fn test_message_without_quotes_is_untouched() {
        assert_eq!(readable_message("plain message"), "plain message");
    }

    #[test]
    fn test_in_operator_is_rewritten() {
        let rewritten =
            readable_message("found no matching overload for '@in' applied to (int, int)");
        assert!(rewritten.contains("'in'"), "{rewritten}");
    }
}
