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

//! Lexer for Rill expressions.
//!
//! Offsets are counted in runes (code points), matching the offset ranges
//! the parser records in [`crate::SourceInfo`]. Comments (`// ...`) are
//! skipped; the formatter deals with them at the text level.

use crate::error::{Issue, Issues, SourceLocation};

/// One lexical token kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier.
    Ident(String),
    /// Signed integer literal.
    Int(i64),
    /// Unsigned integer literal (`42u`).
    Uint(u64),
    /// Floating-point literal.
    Double(f64),
    /// String literal (decoded).
    Str(String),
    /// Bytes literal (decoded).
    Bytes(Vec<u8>),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `in`
    In,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `?`
    Question,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    EqEq,
    /// `!=`
    Ne,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// End of input.
    Eof,
}

/// A token with its half-open rune-offset span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What the token is.
    pub kind: TokenKind,
    /// Rune offset of the first rune.
    pub start: u32,
    /// Rune offset one past the last rune.
    pub stop: u32,
}

/// Words reserved by the language; not usable as identifiers.
pub const RESERVED_WORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "false", "for", "function", "if", "import", "in",
    "let", "loop", "null", "package", "namespace", "return", "true", "var", "void", "while",
];

/// True if `name` is a reserved word.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// True if `ch` can appear inside an identifier.
pub fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// True if `s` is a syntactically valid identifier (reserved or not).
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(ch) if ch.is_alphabetic() || ch == '_' => {}
        _ => return false,
    }
    chars.all(is_identifier_char)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn location(&self, rune_offset: usize) -> SourceLocation {
        let mut line = 1u32;
        let mut col = 0u32;
        for &ch in self.chars.iter().take(rune_offset) {
            if ch == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        SourceLocation::new(line, col)
    }

    fn error(&self, at: usize, message: impl Into<String>) -> Issues {
        Issues::single(Issue::new(self.location(at), message))
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.pos += 1;
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self) -> Result<TokenKind, Issues> {
        let start = self.pos;
        // Hex integers.
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while matches!(self.peek(), Some(ch) if ch.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            if self.pos == digits_start {
                return Err(self.error(start, "malformed hex literal"));
            }
            let digits: String = self.chars[digits_start..self.pos].iter().collect();
            if matches!(self.peek(), Some('u') | Some('U')) {
                self.pos += 1;
                let value = u64::from_str_radix(&digits, 16)
                    .map_err(|_| self.error(start, "uint literal out of range"))?;
                return Ok(TokenKind::Uint(value));
            }
            let value = i64::from_str_radix(&digits, 16)
                .map_err(|_| self.error(start, "int literal out of range"))?;
            return Ok(TokenKind::Int(value));
        }

        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_double = false;
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(ch) if ch.is_ascii_digit()) {
            is_double = true;
            self.pos += 1;
            while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut ahead = 1;
            if matches!(self.peek_at(ahead), Some('+') | Some('-')) {
                ahead += 1;
            }
            if matches!(self.peek_at(ahead), Some(ch) if ch.is_ascii_digit()) {
                is_double = true;
                self.pos += ahead;
                while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if is_double {
            let value = text
                .parse::<f64>()
                .map_err(|_| self.error(start, "malformed double literal"))?;
            return Ok(TokenKind::Double(value));
        }
        if matches!(self.peek(), Some('u') | Some('U')) {
            self.pos += 1;
            let value = text
                .parse::<u64>()
                .map_err(|_| self.error(start, "uint literal out of range"))?;
            return Ok(TokenKind::Uint(value));
        }
        let value = text
            .parse::<i64>()
            .map_err(|_| self.error(start, "int literal out of range"))?;
        Ok(TokenKind::Int(value))
    }

    fn lex_string(&mut self, quote: char) -> Result<String, Issues> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "unterminated string literal")),
                Some(ch) if ch == quote => break,
                Some('\n') => return Err(self.error(start, "unterminated string literal")),
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.error(start, "unterminated string literal"))?;
                    match escaped {
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        '\\' => value.push('\\'),
                        '\'' => value.push('\''),
                        '"' => value.push('"'),
                        '0' => value.push('\0'),
                        'u' => {
                            let mut code = 0u32;
                            for _ in 0..4 {
                                let digit = self
                                    .bump()
                                    .and_then(|ch| ch.to_digit(16))
                                    .ok_or_else(|| self.error(start, "malformed \\u escape"))?;
                                code = code * 16 + digit;
                            }
                            let ch = char::from_u32(code)
                                .ok_or_else(|| self.error(start, "invalid \\u escape"))?;
                            value.push(ch);
                        }
                        other => {
                            return Err(self.error(
                                start,
                                format!("unsupported escape sequence '\\{other}'"),
                            ))
                        }
                    }
                }
                Some(ch) => value.push(ch),
            }
        }
        Ok(value)
    }

    fn next_token(&mut self) -> Result<Token, Issues> {
        self.skip_trivia();
        let start = self.pos as u32;
        let Some(ch) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                start,
                stop: start,
            });
        };

        let kind = match ch {
            '(' => {
                self.pos += 1;
                TokenKind::LParen
            }
            ')' => {
                self.pos += 1;
                TokenKind::RParen
            }
            '[' => {
                self.pos += 1;
                TokenKind::LBracket
            }
            ']' => {
                self.pos += 1;
                TokenKind::RBracket
            }
            '{' => {
                self.pos += 1;
                TokenKind::LBrace
            }
            '}' => {
                self.pos += 1;
                TokenKind::RBrace
            }
            ',' => {
                self.pos += 1;
                TokenKind::Comma
            }
            ':' => {
                self.pos += 1;
                TokenKind::Colon
            }
            '.' => {
                self.pos += 1;
                TokenKind::Dot
            }
            '?' => {
                self.pos += 1;
                TokenKind::Question
            }
            '+' => {
                self.pos += 1;
                TokenKind::Plus
            }
            '-' => {
                self.pos += 1;
                TokenKind::Minus
            }
            '*' => {
                self.pos += 1;
                TokenKind::Star
            }
            '/' => {
                self.pos += 1;
                TokenKind::Slash
            }
            '%' => {
                self.pos += 1;
                TokenKind::Percent
            }
            '!' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.pos += 1;
                    TokenKind::Ne
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.pos += 1;
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.pos += 1;
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '=' => {
                if self.peek_at(1) == Some('=') {
                    self.pos += 2;
                    TokenKind::EqEq
                } else {
                    return Err(self.error(self.pos, "unexpected character '='"));
                }
            }
            '&' => {
                if self.peek_at(1) == Some('&') {
                    self.pos += 2;
                    TokenKind::AndAnd
                } else {
                    return Err(self.error(self.pos, "unexpected character '&'"));
                }
            }
            '|' => {
                if self.peek_at(1) == Some('|') {
                    self.pos += 2;
                    TokenKind::OrOr
                } else {
                    return Err(self.error(self.pos, "unexpected character '|'"));
                }
            }
            '"' | '\'' => {
                let value = self.lex_string(ch)?;
                TokenKind::Str(value)
            }
            'b' if matches!(self.peek_at(1), Some('"') | Some('\'')) => {
                self.pos += 1;
                let quote = self.peek().unwrap_or('"');
                let value = self.lex_string(quote)?;
                TokenKind::Bytes(value.into_bytes())
            }
            ch if ch.is_ascii_digit() => self.lex_number()?,
            ch if ch.is_alphabetic() || ch == '_' => {
                let word_start = self.pos;
                while matches!(self.peek(), Some(c) if is_identifier_char(c)) {
                    self.pos += 1;
                }
                let word: String = self.chars[word_start..self.pos].iter().collect();
                match word.as_str() {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "null" => TokenKind::Null,
                    "in" => TokenKind::In,
                    _ => TokenKind::Ident(word),
                }
            }
            other => {
                return Err(self.error(self.pos, format!("unexpected character '{other}'")));
            }
        };

        Ok(Token {
            kind,
            start,
            stop: self.pos as u32,
        })
    }
}

/// Tokenize `source` into a vector ending with an `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Issues> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("a + 2"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Plus,
                TokenKind::Int(2),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42u")[0], TokenKind::Uint(42));
        assert_eq!(kinds("0x2A")[0], TokenKind::Int(42));
        assert_eq!(kinds("1.5")[0], TokenKind::Double(1.5));
        assert_eq!(kinds("2e3")[0], TokenKind::Double(2000.0));
    }

    #[test]
    fn test_strings_and_bytes() {
        assert_eq!(kinds("\"hi\\n\"")[0], TokenKind::Str("hi\n".to_string()));
        assert_eq!(kinds("'ok'")[0], TokenKind::Str("ok".to_string()));
        assert_eq!(kinds("b\"ab\"")[0], TokenKind::Bytes(b"ab".to_vec()));
    }

    #[test]
    fn test_rune_spans() {
        // "é" is one rune; spans count runes, not bytes.
        let tokens = tokenize("'é' + x").unwrap();
        assert_eq!((tokens[0].start, tokens[0].stop), (0, 3));
        assert_eq!((tokens[1].start, tokens[1].stop), (4, 5));
        assert_eq!((tokens[2].start, tokens[2].stop), (6, 7));
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            kinds("1 // trailing\n+ 2"),
            vec![TokenKind::Int(1), TokenKind::Plus, TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_errors() {
        let err = tokenize("'oops").unwrap_err();
        assert!(err.errors()[0].message.contains("unterminated"));
    }

    #[test]
    fn test_reserved_words() {
        assert!(is_reserved_word("while"));
        assert!(is_reserved_word("in"));
        assert!(!is_reserved_word("value"));
        assert!(is_valid_identifier("_private"));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier(""));
    }
}
