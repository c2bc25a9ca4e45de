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

//! Parsing, type checking, and evaluation of Rill expressions.
//!
//! The pipeline is [`parse`] then [`check`] then optionally [`eval`].
//! Parsing expands comprehension macros (`has`, `all`, `exists`,
//! `exists_one`, `map`, `filter`) into [`ExprKind::Comprehension`] nodes
//! and records the pre-expansion call forms in [`SourceInfo`]. All
//! recorded positions are rune (code point) offsets into the source text.

pub mod ast;
pub mod check;
pub mod display;
pub mod env;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod types;

pub use ast::{Expr, ExprKind, Literal, MapEntry, OffsetRange, ParsedExpr, SourceInfo, StructField};
pub use check::{check, CheckedExpr};
pub use display::unparse;
pub use env::{Doc, DocKind, Env, Function, Overload};
pub use error::{Issue, Issues, SourceLocation, SyntaxResult};
pub use eval::{eval, EvalError, Value};
pub use lexer::{is_identifier_char, is_reserved_word, is_valid_identifier};
pub use parser::{parse, parse_with_options, ParseOptions};
pub use types::Type;
