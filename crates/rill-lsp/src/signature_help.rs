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

//! Signature help inside call argument lists.
//!
//! The enclosing call is found with a small forward scan that tracks
//! paren depth and string literals, so the text left of the cursor does
//! not need to parse. The active parameter is the number of top-level
//! commas passed so far.

use lsp_types::{
    Documentation, ParameterInformation, ParameterLabel, Position, SignatureHelp,
    SignatureInformation,
};
use rill_syntax::{is_identifier_char, operators, Doc, DocKind, Env};

use crate::position::PositionIndex;

/// Signature help for the call surrounding `position`, or `None` when
/// the cursor is not inside a known call's argument list.
pub fn signature_help(text: &str, position: Position, env: &Env) -> Option<SignatureHelp> {
    let index = PositionIndex::new(text);
    let cursor = index.byte_offset_of(position);
    let before = &text[..cursor];

    let (open, commas) = enclosing_call(before)?;
    let (name, member) = callee_name(before, open)?;

    let signatures = if operators::is_macro(name) {
        let doc = env.macro_doc(name)?;
        vec![signature_info(doc)]
    } else {
        let function = env.function(name)?;
        let overloads: Vec<&Doc> = function
            .doc
            .children
            .iter()
            .filter(|c| c.kind == DocKind::Overload)
            .collect();
        if overloads.is_empty() {
            vec![signature_info(&function.doc)]
        } else {
            let member_form = format!(".{name}(");
            let preferred: Vec<&&Doc> = overloads
                .iter()
                .filter(|o| o.signature.contains(&member_form) == member)
                .collect();
            let chosen: Vec<&Doc> = if preferred.is_empty() {
                overloads.clone()
            } else {
                preferred.into_iter().copied().collect()
            };
            chosen.into_iter().map(signature_info).collect()
        }
    };

    Some(SignatureHelp {
        signatures,
        active_signature: Some(0),
        active_parameter: Some(commas),
    })
}

/// The innermost unclosed `(` before the cursor and the number of
/// top-level commas after it. String literals are skipped.
fn enclosing_call(before: &str) -> Option<(usize, u32)> {
    let mut stack: Vec<(usize, u32)> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in before.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' => stack.push((i, 0)),
            ')' => {
                stack.pop();
            }
            '[' => stack.push((i, u32::MAX)),
            ']' => {
                stack.pop();
            }
            ',' => {
                if let Some(top) = stack.last_mut() {
                    if top.1 != u32::MAX {
                        top.1 += 1;
                    }
                }
            }
            _ => {}
        }
    }
    // Brackets (marked with MAX) are grouping, not calls.
    stack.iter().rev().find(|(_, c)| *c != u32::MAX).copied()
}

/// The identifier directly before the `(` at `open`, and whether it is
/// a member call.
fn callee_name(before: &str, open: usize) -> Option<(&str, bool)> {
    let head = before[..open].trim_end();
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, ch)| is_identifier_char(*ch))
        .last()
        .map(|(i, _)| i)?;
    let name = &head[start..];
    if name.is_empty() {
        return None;
    }
    let member = head[..start].ends_with('.');
    Some((name, member))
}

fn signature_info(doc: &Doc) -> SignatureInformation {
    SignatureInformation {
        label: doc.signature.clone(),
        documentation: (!doc.description.is_empty())
            .then(|| Documentation::String(doc.description.clone())),
        parameters: Some(signature_parameters(&doc.signature)),
        active_parameter: None,
    }
}

/// Parameter labels pulled from the text between the signature's
/// parens.
fn signature_parameters(signature: &str) -> Vec<ParameterInformation> {
    let Some(open) = signature.find('(') else {
        return Vec::new();
    };
    let Some(close) = signature.rfind(')') else {
        return Vec::new();
    };
    if close <= open + 1 {
        return Vec::new();
    }
    signature[open + 1..close]
        .split(',')
        .map(|param| ParameterInformation {
            label: ParameterLabel::Simple(param.trim().to_string()),
            documentation: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn help(source: &str, character: u32) -> Option<SignatureHelp> {
        signature_help(source, Position { line: 0, character }, &Env::standard())
    }

    #[test]
    fn test_help_inside_global_call() {
        let help = help("size([1, 2]", 11).unwrap();
        assert!(!help.signatures.is_empty());
        assert!(help.signatures[0].label.starts_with("size("), "{:?}", help.signatures[0].label);
        assert_eq!(help.active_parameter, Some(0));
    }

    #[test]
    fn test_active_parameter_counts_commas() {
        let help = help("[1].map(x, x + 1", 12).unwrap();
        assert_eq!(help.active_parameter, Some(1));
    }

    #[test]
    fn test_nested_call_uses_inner() {
        let help = help("size(string(1", 13).unwrap();
        assert!(help.signatures[0].label.contains("string("), "{:?}", help.signatures[0].label);
    }

    #[test]
    fn test_member_call_prefers_member_overloads() {
        let help = help("'abc'.contains(", 15).unwrap();
        assert!(
            help.signatures.iter().all(|s| s.label.contains(".contains(")),
            "{:?}",
            help.signatures
        );
    }

    #[test]
    fn test_commas_inside_strings_are_ignored() {
        let help = help("size('a,b'", 10).unwrap();
        assert_eq!(help.active_parameter, Some(0));
    }

    #[test]
    fn test_no_help_outside_calls() {
        assert!(help("1 + 2", 3).is_none());
    }

    #[test]
    fn test_no_help_in_grouping_parens() {
        assert!(help("(1 + 2", 4).is_none());
    }

    #[test]
    fn test_parameters_are_extracted() {
        let help = help("size(", 5).unwrap();
        let params = help.signatures[0].parameters.as_ref().unwrap();
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_macro_signature() {
        let help = help("[1].all(", 8).unwrap();
        assert!(help.signatures[0].label.contains("all("), "{:?}", help.signatures[0].label);
    }
}
