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

//! Document highlight for the identifier under the cursor.

use lsp_types::{DocumentHighlight, DocumentHighlightKind, Position};

use crate::position::PositionIndex;
use crate::walker::{self, IdentKind, Scope};

/// Highlight every occurrence of the identifier under `position` in its
/// scope. A loop-variable binder is marked as a write, uses as reads.
pub fn highlights(text: &str, position: Position) -> Option<Vec<DocumentHighlight>> {
    let parsed = rill_syntax::parse(text).ok()?;
    let index = PositionIndex::new(text);
    let offset = index.rune_of_position(position);
    let ident = walker::identifier_at_offset(&parsed, offset)?;
    if ident.kind != IdentKind::Variable {
        return None;
    }
    let scope = walker::resolve_scope(&parsed, &ident);
    let is_loop = matches!(scope, Scope::LoopVariable { .. });
    let highlights = walker::occurrences(&parsed, &ident.name, &scope)
        .into_iter()
        .enumerate()
        .map(|(i, range)| DocumentHighlight {
            range: index.range_of(range),
            // The binder sorts first within a loop scope.
            kind: Some(if is_loop && i == 0 {
                DocumentHighlightKind::WRITE
            } else {
                DocumentHighlightKind::READ
            }),
        })
        .collect();
    Some(highlights)
}
