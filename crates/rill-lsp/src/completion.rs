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

//! Context-sensitive completion.
//!
//! Three contexts are recognized from the text left of the cursor:
//! member access after a dot, the right-hand side of a binary operator,
//! and everything else. Member completions are narrowed by the checked
//! receiver type; operator completions by the operand types the
//! operator accepts.

use lsp_types::{
    CompletionItem, CompletionItemKind, Documentation, InsertTextFormat, Position,
};
use rill_syntax::{
    check, is_identifier_char, operators, parse, Env, Function, Type,
};

use crate::position::PositionIndex;

/// Binary operator spellings, longest first so that `<=` wins over `<`.
const OPERATOR_SYMBOLS: [&str; 14] = [
    "&&", "||", "==", "!=", "<=", ">=", "in", "<", ">", "+", "-", "*", "/", "%",
];

/// Completion items for the given cursor position, sorted by label.
pub fn completion(text: &str, position: Position, env: &Env) -> Vec<CompletionItem> {
    let index = PositionIndex::new(text);
    let cursor = index.byte_offset_of(position);
    let before = &text[..cursor];

    let prefix_start = before
        .char_indices()
        .rev()
        .take_while(|(_, ch)| is_identifier_char(*ch))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(before.len());
    let prefix = &before[prefix_start..];
    let stem = &before[..prefix_start];

    let mut items = if let Some(receiver) = stem.strip_suffix('.') {
        member_items(receiver, env)
    } else if let Some(expected) = operator_operand_types(stem, env) {
        operand_items(env, &expected)
    } else {
        global_items(env)
    };

    items.retain(|item| item.label.starts_with(prefix));
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items.dedup_by(|a, b| a.label == b.label);
    items
}

/// Items after `receiver.`: member functions the receiver type
/// accepts, and the comprehension macros.
fn member_items(receiver: &str, env: &Env) -> Vec<CompletionItem> {
    let receiver_type = parse(receiver)
        .ok()
        .and_then(|parsed| check(&parsed, env).ok())
        .map(|checked| checked.result_type())
        .unwrap_or(Type::Dyn);

    let mut items: Vec<CompletionItem> = env
        .functions()
        .iter()
        .filter(|f| f.has_member_overload() && !operators::is_operator(&f.name))
        .filter(|f| receiver_type.is_dyn() || f.accepts_receiver(receiver_type))
        .map(|f| callable_item(f.name.clone(), CompletionItemKind::METHOD, f))
        .collect();
    for doc in env.macros() {
        if doc.name != operators::MACRO_HAS {
            items.push(snippet_item(
                doc.name.clone(),
                CompletionItemKind::FUNCTION,
                &doc.signature,
                &doc.description,
            ));
        }
    }
    items
}

/// When the text ends in a binary operator, the operand types its
/// right-hand side accepts. `None` when the cursor is not in operator
/// position.
fn operator_operand_types(stem: &str, env: &Env) -> Option<Vec<Type>> {
    let trimmed = stem.trim_end();
    let symbol = OPERATOR_SYMBOLS
        .iter()
        .find(|sym| trimmed.ends_with(**sym))?;
    if *symbol == "in" {
        // Reject identifier tails like `min`.
        let head = &trimmed[..trimmed.len() - 2];
        if head.chars().next_back().is_some_and(is_identifier_char) {
            return None;
        }
    }
    let function = env.function(operators::find_by_symbol(symbol)?)?;
    let expected: Vec<Type> = function
        .overloads
        .iter()
        .filter(|o| o.params.len() == 2)
        .map(|o| o.params[1])
        .collect();
    Some(expected)
}

/// Variables and global functions whose type fits one of the expected
/// operand types.
fn operand_items(env: &Env, expected: &[Type]) -> Vec<CompletionItem> {
    let unconstrained = expected.is_empty() || expected.iter().any(Type::is_dyn);
    let fits = |ty: Type| unconstrained || expected.iter().any(|e| ty.assignable_to(e));

    let mut items: Vec<CompletionItem> = env
        .variables()
        .filter(|(_, ty)| fits(*ty))
        .map(|(name, ty)| variable_item(name, ty))
        .collect();
    for function in env.functions() {
        if operators::is_operator(&function.name) || !function.has_global_overload() {
            continue;
        }
        let produces_fit = function
            .overloads
            .iter()
            .any(|o| !o.member && fits(o.result));
        if produces_fit {
            items.push(callable_item(
                function.name.clone(),
                CompletionItemKind::FUNCTION,
                function,
            ));
        }
    }
    items
}

/// Items in plain expression position: variables, global functions, the
/// `has` macro, and the literal keywords.
fn global_items(env: &Env) -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = env
        .variables()
        .map(|(name, ty)| variable_item(name, ty))
        .collect();
    for function in env.functions() {
        if operators::is_operator(&function.name) || !function.has_global_overload() {
            continue;
        }
        items.push(callable_item(
            function.name.clone(),
            CompletionItemKind::FUNCTION,
            function,
        ));
    }
    if let Some(doc) = env.macro_doc(operators::MACRO_HAS) {
        items.push(snippet_item(
            doc.name.clone(),
            CompletionItemKind::FUNCTION,
            &doc.signature,
            &doc.description,
        ));
    }
    for keyword in ["true", "false", "null"] {
        items.push(CompletionItem {
            label: keyword.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            ..CompletionItem::default()
        });
    }
    items
}

fn variable_item(name: &str, ty: Type) -> CompletionItem {
    CompletionItem {
        label: name.to_string(),
        kind: Some(CompletionItemKind::VARIABLE),
        detail: Some(ty.to_string()),
        ..CompletionItem::default()
    }
}

fn callable_item(label: String, kind: CompletionItemKind, function: &Function) -> CompletionItem {
    snippet_item(label, kind, &function.doc.signature, &function.doc.description)
}

fn snippet_item(
    label: String,
    kind: CompletionItemKind,
    signature: &str,
    description: &str,
) -> CompletionItem {
    let insert = format!("{label}($1)");
    CompletionItem {
        label,
        kind: Some(kind),
        detail: (!signature.is_empty()).then(|| signature.to_string()),
        documentation: (!description.is_empty())
            .then(|| Documentation::String(description.to_string())),
        insert_text: Some(insert),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        ..CompletionItem::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(source: &str, character: u32, env: &Env) -> Vec<String> {
        completion(source, Position { line: 0, character }, env)
            .into_iter()
            .map(|item| item.label)
            .collect()
    }

    #[test]
    fn test_member_completion_for_string() {
        let env = Env::standard().with_variable("name", Type::String);
        let labels = labels("name.", 5, &env);
        assert!(labels.contains(&"startsWith".to_string()), "{labels:?}");
        assert!(labels.contains(&"size".to_string()), "{labels:?}");
        assert!(labels.contains(&"map".to_string()), "{labels:?}");
        assert!(!labels.contains(&"has".to_string()), "{labels:?}");
    }

    #[test]
    fn test_member_completion_narrows_by_prefix() {
        let env = Env::standard().with_variable("name", Type::String);
        let labels = labels("name.sta", 8, &env);
        assert_eq!(labels, vec!["startsWith"]);
    }

    #[test]
    fn test_member_snippet_insert() {
        let env = Env::standard().with_variable("name", Type::String);
        let items = completion("name.sta", Position { line: 0, character: 8 }, &env);
        assert_eq!(items[0].insert_text.as_deref(), Some("startsWith($1)"));
        assert_eq!(items[0].insert_text_format, Some(InsertTextFormat::SNIPPET));
    }

    #[test]
    fn test_operator_context_filters_by_type() {
        let env = Env::standard()
            .with_variable("count", Type::Int)
            .with_variable("flag", Type::Bool);
        let labels = labels("count - ", 8, &env);
        assert!(labels.contains(&"count".to_string()), "{labels:?}");
        assert!(!labels.contains(&"flag".to_string()), "{labels:?}");
    }

    #[test]
    fn test_and_operator_wants_bool() {
        let env = Env::standard()
            .with_variable("count", Type::Int)
            .with_variable("flag", Type::Bool);
        let labels = labels("flag && ", 8, &env);
        assert!(labels.contains(&"flag".to_string()), "{labels:?}");
        assert!(!labels.contains(&"count".to_string()), "{labels:?}");
    }

    #[test]
    fn test_identifier_ending_in_operator_letters_is_not_operator_context() {
        let env = Env::standard().with_variable("min", Type::Int);
        // `min ` ends with the letters `in` but is a whole identifier.
        let labels = labels("min ", 4, &env);
        assert!(labels.contains(&"true".to_string()), "{labels:?}");
    }

    #[test]
    fn test_global_completion_has_keywords_and_has() {
        let labels = labels("", 0, &Env::standard());
        assert!(labels.contains(&"true".to_string()));
        assert!(labels.contains(&"has".to_string()));
        assert!(labels.contains(&"size".to_string()));
        assert!(!labels.contains(&"startsWith".to_string()), "{labels:?}");
    }

    #[test]
    fn test_results_are_sorted() {
        let labels = labels("", 0, &Env::standard());
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
    }

    #[test]
    fn test_int_receiver_offers_no_methods() {
        let labels = labels("size([1]).", 10, &Env::standard());
        // Only the macros apply to a non-container receiver.
        assert!(!labels.contains(&"startsWith".to_string()), "{labels:?}");
    }
}
