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

//! The Rill type lattice.

use std::fmt;

/// A Rill value type.
///
/// `Dyn` is the top type: it is assignable to and from everything, and is
/// the type given to loop variables and to values of unknown shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    Uint,
    /// IEEE-754 double.
    Double,
    /// UTF-8 string.
    String,
    /// Byte string.
    Bytes,
    /// Boolean.
    Bool,
    /// The null type.
    Null,
    /// Heterogeneous list.
    List,
    /// Heterogeneous map.
    Map,
    /// A type value (result of `type(x)`).
    Type,
    /// Statically unknown.
    Dyn,
}

impl Type {
    /// True for the statically unknown type.
    pub fn is_dyn(&self) -> bool {
        matches!(self, Type::Dyn)
    }

    /// True if a value of `self` can be used where `other` is expected.
    pub fn assignable_to(&self, other: &Type) -> bool {
        self == other || self.is_dyn() || other.is_dyn()
    }

    /// The display name, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Uint => "uint",
            Type::Double => "double",
            Type::String => "string",
            Type::Bytes => "bytes",
            Type::Bool => "bool",
            Type::Null => "null",
            Type::List => "list",
            Type::Map => "map",
            Type::Type => "type",
            Type::Dyn => "dyn",
        }
    }

    /// Parse a display name back into a type.
    pub fn from_name(name: &str) -> Option<Type> {
        let ty = match name {
            "int" => Type::Int,
            "uint" => Type::Uint,
            "double" => Type::Double,
            "string" => Type::String,
            "bytes" => Type::Bytes,
            "bool" => Type::Bool,
            "null" => Type::Null,
            "list" => Type::List,
            "map" => Type::Map,
            "type" => Type::Type,
            "dyn" => Type::Dyn,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dyn_is_assignable_both_ways() {
        assert!(Type::Dyn.assignable_to(&Type::Int));
        assert!(Type::Int.assignable_to(&Type::Dyn));
        assert!(!Type::Int.assignable_to(&Type::String));
    }

    #[test]
    fn test_names_round_trip() {
        for ty in [
            Type::Int,
            Type::Uint,
            Type::Double,
            Type::String,
            Type::Bytes,
            Type::Bool,
            Type::Null,
            Type::List,
            Type::Map,
            Type::Type,
            Type::Dyn,
        ] {
            assert_eq!(Type::from_name(ty.name()), Some(ty));
        }
    }
}
