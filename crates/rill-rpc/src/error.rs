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

//! Transport errors and the JSON-RPC error codes.

use thiserror::Error;

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// The message was not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// The parameters are invalid for the method.
pub const INVALID_PARAMS: i64 = -32602;
/// An internal error occurred while handling the request.
pub const INTERNAL_ERROR: i64 = -32603;

/// A transport-level failure.
///
/// Framing failures are fatal: the connection terminates and every pending
/// call resolves with [`Error::Closed`]. A body that is not valid JSON is
/// recoverable; the peer gets a [`PARSE_ERROR`] response and the
/// connection keeps running.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection has terminated.
    #[error("connection closed")]
    Closed,

    /// Reading from or writing to the underlying stream failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The frame header was malformed or missing Content-Length.
    #[error("invalid frame header: {0}")]
    InvalidHeader(String),

    /// A payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The peer answered a call with an error response.
    #[error("{message} (code {code})")]
    Response {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the peer.
        message: String,
        /// Optional structured data.
        data: Option<serde_json::Value>,
    },

    /// A call did not complete within its deadline.
    #[error("request timed out")]
    Timeout,
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;
