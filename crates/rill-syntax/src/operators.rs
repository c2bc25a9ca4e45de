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

//! Operator names.
//!
//! Operators are ordinary functions with internal names that cannot be
//! spelled as identifiers (`_+_`, `!_`, `@in`). Type-check messages use the
//! internal names; user-facing surfaces rewrite them via [`find_reverse`].

/// Logical and.
pub const LOGICAL_AND: &str = "_&&_";
/// Logical or.
pub const LOGICAL_OR: &str = "_||_";
/// Logical not (unary).
pub const LOGICAL_NOT: &str = "!_";
/// Equality.
pub const EQUALS: &str = "_==_";
/// Inequality.
pub const NOT_EQUALS: &str = "_!=_";
/// Less than.
pub const LESS: &str = "_<_";
/// Less than or equal.
pub const LESS_EQUALS: &str = "_<=_";
/// Greater than.
pub const GREATER: &str = "_>_";
/// Greater than or equal.
pub const GREATER_EQUALS: &str = "_>=_";
/// Addition / concatenation.
pub const ADD: &str = "_+_";
/// Subtraction.
pub const SUBTRACT: &str = "_-_";
/// Multiplication.
pub const MULTIPLY: &str = "_*_";
/// Division.
pub const DIVIDE: &str = "_/_";
/// Modulo.
pub const MODULO: &str = "_%_";
/// Arithmetic negation (unary).
pub const NEGATE: &str = "-_";
/// Membership test.
pub const IN: &str = "@in";
/// Indexing, `a[b]`.
pub const INDEX: &str = "@index";
/// Ternary conditional.
pub const CONDITIONAL: &str = "_?_:_";

/// Comprehension macro names (surface spellings).
pub const MACRO_HAS: &str = "has";
/// `all` macro.
pub const MACRO_ALL: &str = "all";
/// `exists` macro.
pub const MACRO_EXISTS: &str = "exists";
/// `exists_one` macro.
pub const MACRO_EXISTS_ONE: &str = "exists_one";
/// `map` macro.
pub const MACRO_MAP: &str = "map";
/// `filter` macro.
pub const MACRO_FILTER: &str = "filter";

/// The hidden accumulator variable introduced by macro expansion.
pub const ACCUMULATOR_VAR: &str = "__result__";

/// True if `name` is one of the comprehension macros.
pub fn is_macro(name: &str) -> bool {
    matches!(
        name,
        MACRO_HAS | MACRO_ALL | MACRO_EXISTS | MACRO_EXISTS_ONE | MACRO_MAP | MACRO_FILTER
    )
}

/// Map an internal operator function name to its display symbol.
///
/// Returns `None` for names that are not operators. The conditional
/// operator displays as `?` by convention.
pub fn find_reverse(function: &str) -> Option<&'static str> {
    let symbol = match function {
        LOGICAL_AND => "&&",
        LOGICAL_OR => "||",
        LOGICAL_NOT => "!",
        EQUALS => "==",
        NOT_EQUALS => "!=",
        LESS => "<",
        LESS_EQUALS => "<=",
        GREATER => ">",
        GREATER_EQUALS => ">=",
        ADD => "+",
        SUBTRACT => "-",
        MULTIPLY => "*",
        DIVIDE => "/",
        MODULO => "%",
        NEGATE => "-",
        IN => "in",
        INDEX => "[]",
        CONDITIONAL => "?",
        _ => return None,
    };
    Some(symbol)
}

/// Map a binary operator display symbol back to its internal name.
/// Unary spellings (`!`, unary `-`) and `[]` are not included.
pub fn find_by_symbol(symbol: &str) -> Option<&'static str> {
    let function = match symbol {
        "&&" => LOGICAL_AND,
        "||" => LOGICAL_OR,
        "==" => EQUALS,
        "!=" => NOT_EQUALS,
        "<" => LESS,
        "<=" => LESS_EQUALS,
        ">" => GREATER,
        ">=" => GREATER_EQUALS,
        "+" => ADD,
        "-" => SUBTRACT,
        "*" => MULTIPLY,
        "/" => DIVIDE,
        "%" => MODULO,
        "in" => IN,
        _ => return None,
    };
    Some(function)
}

/// True if `name` is an internal operator function name.
pub fn is_operator(name: &str) -> bool {
    find_reverse(name).is_some()
}
