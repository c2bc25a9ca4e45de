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

//! Property-based tests for the parser and unparser.

use proptest::prelude::*;
use rill_syntax::ast::SourceInfo;
use rill_syntax::{check, parse, unparse, Env};

// A small generator of well-formed arithmetic expressions. Identifier
// leaves start with 'v' so they never collide with reserved words.
fn arb_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0i64..1000).prop_map(|v| v.to_string()),
        "v[a-z]{0,4}".prop_map(|v| v.to_string()),
    ];
    leaf.prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} + {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} * {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} - {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} < {b}")),
            inner.prop_map(|a| format!("({a})")),
        ]
    })
}

proptest! {
    // Parsing must reject or accept arbitrary input without panicking.
    #[test]
    fn prop_parse_never_panics(content in ".*") {
        let _ = parse(&content);
    }

    // Checking a parseable input must not panic either.
    #[test]
    fn prop_check_never_panics(content in ".*") {
        if let Ok(parsed) = parse(&content) {
            let _ = check(&parsed, &Env::standard());
        }
    }

    // Canonical rendering is a fixed point: rendering, reparsing, and
    // rendering again yields the same text.
    #[test]
    fn prop_unparse_is_stable(source in arb_expr()) {
        let parsed = parse(&source).unwrap();
        let rendered = unparse(&parsed).unwrap();
        let reparsed = parse(&rendered).unwrap();
        prop_assert_eq!(unparse(&reparsed).unwrap(), rendered);
    }

    // Every rune offset maps to a valid 1-based line.
    #[test]
    fn prop_locations_are_valid(content in ".*") {
        let info = SourceInfo::new(&content);
        let runes = content.chars().count() as u32;
        for offset in 0..=runes {
            let location = info.location_of_offset(offset);
            prop_assert!(location.line >= 1);
        }
    }
}
