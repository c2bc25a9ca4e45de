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

//! Rill Language Server binary.
//!
//! Provides IDE integration for Rill expressions through the Language
//! Server Protocol, over stdio.
//!
//! # Usage
//!
//! ```bash
//! # Run the language server (stdio transport)
//! rill-lsp
//!
//! # With debug logging
//! RUST_LOG=debug rill-lsp
//! ```

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Log to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("rill_lsp=info".parse().expect("valid log directive"))
                .add_directive("rill_rpc=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = rill_lsp::serve_stdio().await;
    ExitCode::from(code as u8)
}
