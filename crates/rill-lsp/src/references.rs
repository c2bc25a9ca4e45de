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

//! Find references to an identifier within its document.

use lsp_types::{Location, Position, Url};

use crate::position::PositionIndex;
use crate::walker::{self, IdentKind};

/// All occurrences of the identifier under `position` in its scope.
/// Function names are not tracked; asking for their references yields
/// `None`.
pub fn references(text: &str, uri: &Url, position: Position) -> Option<Vec<Location>> {
    let parsed = rill_syntax::parse(text).ok()?;
    let index = PositionIndex::new(text);
    let offset = index.rune_of_position(position);
    let ident = walker::identifier_at_offset(&parsed, offset)?;
    if ident.kind != IdentKind::Variable {
        return None;
    }
    let scope = walker::resolve_scope(&parsed, &ident);
    let locations = walker::occurrences(&parsed, &ident.name, &scope)
        .into_iter()
        .map(|range| Location {
            uri: uri.clone(),
            range: index.range_of(range),
        })
        .collect();
    Some(locations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> Url {
        Url::parse("file:///test.rill").unwrap()
    }

    #[test]
    fn test_references_for_variable() {
        let uri = uri();
        let locations =
            references("a + a", &uri, Position { line: 0, character: 0 }).unwrap();
        assert_eq!(locations.len(), 2);
        assert!(locations.iter().all(|l| l.uri == uri));
    }

    #[test]
    fn test_references_for_loop_variable() {
        let locations = references(
            "[1, 2].filter(n, n > 1)",
            &uri(),
            Position { line: 0, character: 17 },
        )
        .unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].range.start.character, 14);
        assert_eq!(locations[1].range.start.character, 17);
    }

    #[test]
    fn test_references_for_function_name_is_none() {
        assert!(references("size([1])", &uri(), Position { line: 0, character: 2 }).is_none());
    }

    #[test]
    fn test_references_outside_any_identifier_is_none() {
        assert!(references("1 + 2", &uri(), Position { line: 0, character: 0 }).is_none());
    }
}
