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

//! Coordinate conversion over one document text.
//!
//! Three coordinate systems meet here: byte offsets into the UTF-8 text,
//! rune (code point) offsets used by the syntax tree, and the wire's
//! 0-based line / UTF-16 column positions. Every conversion is total;
//! out-of-range inputs clamp to the nearest valid location instead of
//! failing.

use lsp_types::{Position, Range};
use rill_syntax::OffsetRange;

/// An index over one text snapshot.
pub struct PositionIndex<'a> {
    text: &'a str,
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
}

impl<'a> PositionIndex<'a> {
    /// Build the line table for `text`.
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0usize];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { text, line_starts }
    }

    /// The underlying text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Number of lines (at least 1, the empty text has one empty line).
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// The byte range of a line, excluding its terminator.
    pub fn line_span(&self, line: u32) -> (usize, usize) {
        let line = (line as usize).min(self.line_starts.len() - 1);
        let start = self.line_starts[line];
        let end = match self.line_starts.get(line + 1) {
            Some(&next) => next - 1,
            None => self.text.len(),
        };
        // Exclude a trailing '\r' from the line content.
        let end = if self.text.as_bytes().get(end.wrapping_sub(1)) == Some(&b'\r') && end > start {
            end - 1
        } else {
            end
        };
        (start, end)
    }

    /// Convert a wire position to a byte offset, clamping past-the-end
    /// lines and columns.
    pub fn byte_offset_of(&self, position: Position) -> usize {
        if position.line as usize >= self.line_starts.len() {
            return self.text.len();
        }
        let (start, end) = self.line_span(position.line);
        let mut units = 0u32;
        for (idx, ch) in self.text[start..end].char_indices() {
            if units >= position.character {
                return start + idx;
            }
            units += ch.len_utf16() as u32;
        }
        end
    }

    /// Convert a byte offset to a wire position. Offsets inside a rune
    /// round down to its start.
    pub fn position_of_byte(&self, byte: usize) -> Position {
        let byte = self.clamp_to_char_start(byte.min(self.text.len()));
        let line = self
            .line_starts
            .partition_point(|&start| start <= byte)
            .saturating_sub(1);
        let start = self.line_starts[line];
        let units: usize = self.text[start..byte].chars().map(|ch| ch.len_utf16()).sum();
        Position {
            line: line as u32,
            character: units as u32,
        }
    }

    fn clamp_to_char_start(&self, mut byte: usize) -> usize {
        while byte > 0 && !self.text.is_char_boundary(byte) {
            byte -= 1;
        }
        byte
    }

    /// Convert a rune offset to a byte offset, clamping past the end.
    pub fn rune_to_byte(&self, rune: u32) -> usize {
        self.text
            .char_indices()
            .nth(rune as usize)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    /// Convert a byte offset to a rune offset.
    pub fn byte_to_rune(&self, byte: usize) -> u32 {
        let byte = byte.min(self.text.len());
        self.text[..self.clamp_to_char_start(byte)].chars().count() as u32
    }

    /// Convert a wire position to a rune offset.
    pub fn rune_of_position(&self, position: Position) -> u32 {
        self.byte_to_rune(self.byte_offset_of(position))
    }

    /// Convert a rune offset to a wire position.
    pub fn position_of_rune(&self, rune: u32) -> Position {
        self.position_of_byte(self.rune_to_byte(rune))
    }

    /// Convert a syntax-tree rune range to a wire range.
    pub fn range_of(&self, range: OffsetRange) -> Range {
        Range {
            start: self.position_of_rune(range.start),
            end: self.position_of_rune(range.stop),
        }
    }

    /// The position just past the last character of a line.
    pub fn end_of_line(&self, line: u32) -> Position {
        let (start, end) = self.line_span(line);
        let units: usize = self.text[start..end].chars().map(|ch| ch.len_utf16()).sum();
        Position {
            line: line.min(self.line_count() - 1),
            character: units as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_round_trip() {
        let index = PositionIndex::new("ab\ncd");
        let pos = Position {
            line: 1,
            character: 1,
        };
        assert_eq!(index.byte_offset_of(pos), 4);
        assert_eq!(index.position_of_byte(4), pos);
    }

    #[test]
    fn test_multibyte_columns_are_utf16() {
        // "é" is 2 bytes, 1 UTF-16 unit; "𝄞" is 4 bytes, 2 UTF-16 units.
        let index = PositionIndex::new("é𝄞x");
        assert_eq!(
            index.byte_offset_of(Position {
                line: 0,
                character: 3
            }),
            6
        );
        assert_eq!(
            index.position_of_byte(6),
            Position {
                line: 0,
                character: 3
            }
        );
    }

    #[test]
    fn test_rune_byte_conversions() {
        let index = PositionIndex::new("é𝄞x");
        assert_eq!(index.rune_to_byte(0), 0);
        assert_eq!(index.rune_to_byte(1), 2);
        assert_eq!(index.rune_to_byte(2), 6);
        assert_eq!(index.rune_to_byte(99), 7);
        assert_eq!(index.byte_to_rune(6), 2);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let index = PositionIndex::new("ab");
        assert_eq!(
            index.byte_offset_of(Position {
                line: 9,
                character: 9
            }),
            2
        );
        assert_eq!(
            index.byte_offset_of(Position {
                line: 0,
                character: 99
            }),
            2
        );
        assert_eq!(
            index.position_of_byte(99),
            Position {
                line: 0,
                character: 2
            }
        );
    }

    #[test]
    fn test_crlf_lines() {
        let index = PositionIndex::new("ab\r\ncd");
        assert_eq!(
            index.byte_offset_of(Position {
                line: 0,
                character: 5
            }),
            2
        );
        assert_eq!(
            index.byte_offset_of(Position {
                line: 1,
                character: 0
            }),
            4
        );
        assert_eq!(
            index.end_of_line(0),
            Position {
                line: 0,
                character: 2
            }
        );
    }

    #[test]
    fn test_empty_text() {
        let index = PositionIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(
            index.byte_offset_of(Position {
                line: 0,
                character: 0
            }),
            0
        );
        assert_eq!(
            index.end_of_line(0),
            Position {
                line: 0,
                character: 0
            }
        );
    }

    #[test]
    fn test_end_of_line_past_last_line() {
        let index = PositionIndex::new("ab\ncd");
        assert_eq!(
            index.end_of_line(7),
            Position {
                line: 1,
                character: 2
            }
        );
    }
}
