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

//! Error types for Rill parsing and type checking.

use std::fmt;
use thiserror::Error;

/// A source location: 1-based line, 0-based column (counted in runes).
///
/// Issues carry no end position; consumers that need a range synthesize
/// one (end-of-line by convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number, 1-based. Line 0 means "no location".
    pub line: u32,
    /// Column number, 0-based, in runes.
    pub column: u32,
}

impl SourceLocation {
    /// A location that points nowhere (line 0).
    pub const NONE: SourceLocation = SourceLocation { line: 0, column: 0 };

    /// Create a location from a 1-based line and 0-based column.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// True if this location points at real source.
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single parse or type-check issue.
#[derive(Debug, Clone, Error)]
#[error("{location}: {message}")]
pub struct Issue {
    /// Where the issue was detected.
    pub location: SourceLocation,
    /// Human-readable message. Operator names appear in their internal
    /// spelling (e.g. `_+_`); presentation layers rewrite them.
    pub message: String,
}

impl Issue {
    /// Create a new issue.
    pub fn new(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

/// A non-empty collection of issues from one parse or check pass.
#[derive(Debug, Clone, Error)]
pub struct Issues(pub Vec<Issue>);

impl Issues {
    /// Wrap a single issue.
    pub fn single(issue: Issue) -> Self {
        Self(vec![issue])
    }

    /// The individual issues, in source order.
    pub fn errors(&self) -> &[Issue] {
        &self.0
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Result alias for fallible syntax operations.
pub type SyntaxResult<T> = Result<T, Issues>;
