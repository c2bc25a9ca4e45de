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

//! Hover documentation.

use lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};
use rill_syntax::{check, operators, Doc, DocKind, Env, ExprKind, Type};

use crate::position::PositionIndex;
use crate::walker::{self, IdentKind, Scope};

/// Documentation for the symbol at `position`, or `None` when the text
/// does not parse or nothing documentable sits there.
pub fn hover(text: &str, position: Position, env: &Env) -> Option<Hover> {
    let parsed = rill_syntax::parse(text).ok()?;
    let index = PositionIndex::new(text);
    let offset = index.rune_of_position(position);

    if let Some(ident) = walker::identifier_at_offset(&parsed, offset) {
        let value = match ident.kind {
            IdentKind::Function => callable_markdown(env, &ident.name)?,
            IdentKind::Variable => match walker::resolve_scope(&parsed, &ident) {
                Scope::LoopVariable { macro_name, .. } => format!(
                    "**Loop Variable** `{}`\n\nIteration variable bound by the `{}` macro.",
                    ident.name, macro_name
                ),
                Scope::TopLevel => variable_markdown(&parsed, env, &ident)?,
            },
        };
        return Some(Hover {
            contents: markup(value),
            range: Some(index.range_of(ident.range)),
        });
    }

    // Not a name; an operator under the cursor still gets documentation.
    let node = walker::node_at_offset(&parsed, offset)?;
    if let ExprKind::Call { function, .. } = &node.kind {
        if operators::is_operator(function) {
            let symbol = operators::find_reverse(function)?;
            let doc = &env.function(function)?.doc;
            let value = doc_markdown(&format!("**Operator** `{symbol}`"), doc);
            let range = parsed.info.offset_range(node.id)?;
            return Some(Hover {
                contents: markup(value),
                range: Some(index.range_of(range)),
            });
        }
    }
    None
}

fn callable_markdown(env: &Env, name: &str) -> Option<String> {
    if let Some(doc) = env.macro_doc(name) {
        return Some(doc_markdown(&format!("**Macro** `{name}`"), doc));
    }
    let function = env.function(name)?;
    let label = if function.doc.kind == DocKind::Method {
        "Method"
    } else {
        "Function"
    };
    Some(doc_markdown(&format!("**{label}** `{name}`"), &function.doc))
}

fn variable_markdown(
    parsed: &rill_syntax::ParsedExpr,
    env: &Env,
    ident: &walker::IdentifierAt,
) -> Option<String> {
    if let Some(ty) = env.variable(&ident.name) {
        return Some(format!("**Variable** `{}`\n\n`{}: {}`", ident.name, ident.name, ty));
    }
    if let Some(ty) = Type::from_name(&ident.name) {
        return Some(format!("**Type** `{ty}`\n\nThe `{ty}` type."));
    }
    // Unknown to the environment; fall back to the checked type, which
    // still tells the reader something for expressions under `dyn`.
    let checked = check(parsed, env).ok()?;
    let ty = checked.type_of(ident.node_id)?;
    Some(format!("**Variable** `{}`\n\n`{}: {}`", ident.name, ident.name, ty))
}

fn markup(value: String) -> HoverContents {
    HoverContents::Markup(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    })
}

/// Render a documentation entry with its overloads and examples.
fn doc_markdown(heading: &str, doc: &Doc) -> String {
    let mut out = String::from(heading);
    if !doc.signature.is_empty() {
        out.push_str("\n\n```\n");
        out.push_str(&doc.signature);
        out.push_str("\n```");
    }
    if !doc.description.is_empty() {
        out.push_str("\n\n");
        out.push_str(&doc.description);
    }
    let overloads: Vec<&Doc> = doc
        .children
        .iter()
        .filter(|c| c.kind == DocKind::Overload)
        .collect();
    if !overloads.is_empty() {
        out.push_str("\n\n**Overloads**");
        for overload in overloads {
            out.push_str("\n- `");
            out.push_str(&overload.signature);
            out.push('`');
        }
    }
    let examples: Vec<&Doc> = doc
        .children
        .iter()
        .filter(|c| c.kind == DocKind::Example)
        .collect();
    if !examples.is_empty() {
        out.push_str("\n\n**Examples**");
        for example in examples {
            out.push_str("\n- `");
            out.push_str(&example.signature);
            out.push('`');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hover_text(source: &str, line: u32, character: u32) -> Option<String> {
        let env = Env::standard();
        let result = hover(source, Position { line, character }, &env)?;
        match result.contents {
            HoverContents::Markup(markup) => Some(markup.value),
            _ => None,
        }
    }

    #[test]
    fn test_hover_function() {
        let text = hover_text("size([1, 2])", 0, 1).unwrap();
        assert!(text.starts_with("**Function** `size`"), "{text}");
        assert!(text.contains("**Overloads**"), "{text}");
    }

    #[test]
    fn test_hover_method() {
        let text = hover_text("name.startsWith('a')", 0, 7).unwrap();
        assert!(text.starts_with("**Method** `startsWith`"), "{text}");
    }

    #[test]
    fn test_hover_macro() {
        let text = hover_text("[1].map(x, x)", 0, 5).unwrap();
        assert!(text.starts_with("**Macro** `map`"), "{text}");
    }

    #[test]
    fn test_hover_loop_variable() {
        let text = hover_text("[1].map(x, x + 1)", 0, 8).unwrap();
        assert!(text.starts_with("**Loop Variable** `x`"), "{text}");
        assert!(text.contains("`map` macro"), "{text}");
    }

    #[test]
    fn test_hover_operator() {
        let text = hover_text("1 + 2", 0, 2).unwrap();
        assert!(text.starts_with("**Operator** `+`"), "{text}");
    }

    #[test]
    fn test_hover_type_name() {
        let text = hover_text("int", 0, 1).unwrap();
        assert!(text.starts_with("**Type** `int`"), "{text}");
    }

    #[test]
    fn test_hover_declared_variable() {
        let env = Env::standard().with_variable("count", Type::Int);
        let result = hover("count + 1", Position { line: 0, character: 2 }, &env).unwrap();
        let HoverContents::Markup(markup) = result.contents else {
            panic!("expected markup contents");
        };
        assert!(markup.value.contains("`count: int`"), "{}", markup.value);
    }

    #[test]
    fn test_hover_nothing_on_literal() {
        assert!(hover_text("1 + 2", 0, 4).is_none());
    }

    #[test]
    fn test_hover_unparseable_is_none() {
        assert!(hover_text("1 +", 0, 0).is_none());
    }

    #[test]
    fn test_hover_empty_document_is_none() {
        assert!(hover_text("", 0, 0).is_none());
    }

    #[test]
    fn test_hover_is_idempotent() {
        let first = hover_text("[1].map(x, x)", 0, 5);
        let second = hover_text("[1].map(x, x)", 0, 5);
        assert_eq!(first, second);
    }
}
