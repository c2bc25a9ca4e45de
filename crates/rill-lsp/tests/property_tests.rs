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

//! Property-based tests for the position index and the feature
//! entry points, which must stay total over arbitrary input.

use lsp_types::Position;
use proptest::prelude::*;
use rill_lsp::PositionIndex;
use rill_syntax::Env;

proptest! {
    #[test]
    fn prop_byte_round_trip(text in "[a-z0-9é𝄞 +.()\\n]{0,200}", byte in 0usize..256) {
        let index = PositionIndex::new(&text);
        let position = index.position_of_byte(byte);
        let back = index.byte_offset_of(position);
        // Round trip through a position lands on the same char start.
        let clamped = {
            let mut b = byte.min(text.len());
            while b > 0 && !text.is_char_boundary(b) {
                b -= 1;
            }
            b
        };
        prop_assert_eq!(back, clamped);
    }

    #[test]
    fn prop_rune_byte_inverse(text in ".{0,200}", rune in 0u32..256) {
        let index = PositionIndex::new(&text);
        let total = text.chars().count() as u32;
        let byte = index.rune_to_byte(rune);
        prop_assert_eq!(index.byte_to_rune(byte), rune.min(total));
    }

    #[test]
    fn prop_positions_never_panic(
        text in "[a-z \n.()+*'\"\\\\]{0,100}",
        line in 0u32..16,
        character in 0u32..64,
    ) {
        let index = PositionIndex::new(&text);
        let position = Position { line, character };
        let byte = index.byte_offset_of(position);
        prop_assert!(byte <= text.len());
        let _ = index.rune_of_position(position);
    }

    #[test]
    fn prop_diagnostics_never_panic(text in ".{0,120}") {
        let env = Env::standard();
        let _ = rill_lsp::diagnostics::diagnostics(&text, &env);
    }

    #[test]
    fn prop_completion_never_panics(
        text in "[a-z0-9 .+<=&|']{0,60}",
        character in 0u32..64,
    ) {
        let env = Env::standard();
        let _ = rill_lsp::completion::completion(
            &text,
            Position { line: 0, character },
            &env,
        );
    }

    #[test]
    fn prop_line_count_matches_newlines(text in "[a-z\n]{0,120}") {
        let index = PositionIndex::new(&text);
        let newlines = text.matches('\n').count() as u32;
        prop_assert_eq!(index.line_count(), newlines + 1);
    }
}
