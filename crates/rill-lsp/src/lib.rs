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

//! Language server for Rill expressions.
//!
//! Documents are whole expressions. Analysis reparses on demand; the
//! store only holds text. The server speaks LSP over the JSON-RPC
//! transport in `rill-rpc`.

pub mod completion;
pub mod diagnostics;
pub mod format;
pub mod highlight;
pub mod hover;
pub mod inlay_hints;
pub mod position;
pub mod references;
pub mod rename;
pub mod semantic_tokens;
pub mod server;
pub mod signature_help;
pub mod store;
pub mod walker;

pub use position::PositionIndex;
pub use server::{serve, serve_stdio, Server};
pub use store::{Document, Store, StoreError};
