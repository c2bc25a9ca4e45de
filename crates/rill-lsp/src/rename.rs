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

//! Scope-aware identifier rename.

use std::collections::HashMap;

use lsp_types::{Position, Range, TextEdit, Url, WorkspaceEdit};
use rill_syntax::{is_reserved_word, is_valid_identifier};
use thiserror::Error;

use crate::position::PositionIndex;
use crate::walker::{self, IdentKind};

/// Why a rename request was refused.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("the document does not parse")]
    NoParse,
    #[error("no identifier at the given position")]
    NotAnIdentifier,
    #[error("cannot rename function '{0}'")]
    Function(String),
    #[error("'{0}' is not a valid identifier")]
    InvalidName(String),
    #[error("'{0}' is a reserved word")]
    ReservedName(String),
}

/// The range of the identifier under `position`, when it can be
/// renamed. Function and macro names cannot.
pub fn prepare_rename(text: &str, position: Position) -> Option<Range> {
    let parsed = rill_syntax::parse(text).ok()?;
    let index = PositionIndex::new(text);
    let offset = index.rune_of_position(position);
    let ident = walker::identifier_at_offset(&parsed, offset)?;
    if ident.kind != IdentKind::Variable {
        return None;
    }
    Some(index.range_of(ident.range))
}

/// Rename every occurrence of the identifier under `position` within
/// its scope.
pub fn rename(
    text: &str,
    uri: &Url,
    position: Position,
    new_name: &str,
) -> Result<WorkspaceEdit, RenameError> {
    if !is_valid_identifier(new_name) {
        return Err(RenameError::InvalidName(new_name.to_string()));
    }
    if is_reserved_word(new_name) {
        return Err(RenameError::ReservedName(new_name.to_string()));
    }

    let parsed = rill_syntax::parse(text).map_err(|_| RenameError::NoParse)?;
    let index = PositionIndex::new(text);
    let offset = index.rune_of_position(position);
    let ident =
        walker::identifier_at_offset(&parsed, offset).ok_or(RenameError::NotAnIdentifier)?;
    if ident.kind == IdentKind::Function {
        return Err(RenameError::Function(ident.name));
    }

    let scope = walker::resolve_scope(&parsed, &ident);
    let edits: Vec<TextEdit> = walker::occurrences(&parsed, &ident.name, &scope)
        .into_iter()
        .map(|range| TextEdit {
            range: index.range_of(range),
            new_text: new_name.to_string(),
        })
        .collect();

    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);
    Ok(WorkspaceEdit {
        changes: Some(changes),
        ..WorkspaceEdit::default()
    })
}
