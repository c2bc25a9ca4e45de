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

//! Content-Length framed JSON-RPC 2.0 over arbitrary byte streams.
//!
//! [`Connection`] drives a full-duplex peer: outbound calls are correlated
//! by id, and inbound requests and notifications are dispatched in arrival
//! order to a [`Handler`].

pub mod codec;
pub mod connection;
pub mod error;
pub mod message;

pub use connection::{Connection, Handler};
pub use error::{
    Error, Result, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
pub use message::{Id, Incoming, ResponseError, WireMessage};
