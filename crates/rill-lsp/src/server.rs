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

//! The language server: lifecycle, document sync, and feature dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lsp_types::{
    CompletionOptions, CompletionParams, DiagnosticOptions, DiagnosticServerCapabilities,
    DocumentDiagnosticParams, DocumentDiagnosticReport, DocumentDiagnosticReportResult,
    DocumentFormattingParams, DocumentHighlightParams, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, FullDocumentDiagnosticReport,
    HoverParams, HoverProviderCapability, InitializeResult, InlayHintParams, OneOf,
    PublishDiagnosticsParams, ReferenceParams, RelatedFullDocumentDiagnosticReport,
    RenameOptions, RenameParams, SemanticTokensFullOptions, SemanticTokensOptions,
    SemanticTokensServerCapabilities, ServerCapabilities, ServerInfo, SignatureHelpOptions,
    SignatureHelpParams, TextDocumentPositionParams, TextDocumentSyncCapability,
    TextDocumentSyncKind, Url, WorkDoneProgressOptions,
};
use rill_rpc::{Connection, Handler, ResponseError};
use rill_syntax::Env;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;
use tracing::debug;

use crate::store::{Document, Store};
use crate::{
    completion, diagnostics, format, highlight, hover, inlay_hints, references, rename,
    semantic_tokens, signature_help,
};

struct State {
    store: Store,
    env: Env,
    shutdown_requested: AtomicBool,
    exited: AtomicBool,
    clean_exit: AtomicBool,
    exit: Notify,
}

/// The Rill language server. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct Server {
    state: Arc<State>,
}

impl Server {
    pub fn new(env: Env) -> Self {
        Server {
            state: Arc::new(State {
                store: Store::new(),
                env,
                shutdown_requested: AtomicBool::new(false),
                exited: AtomicBool::new(false),
                clean_exit: AtomicBool::new(false),
                exit: Notify::new(),
            }),
        }
    }

    /// Wait for the `exit` notification. Returns the process exit code:
    /// zero when `shutdown` was requested first.
    pub async fn exited(&self) -> i32 {
        loop {
            if self.state.exited.load(Ordering::Acquire) {
                return i32::from(!self.state.clean_exit.load(Ordering::Acquire));
            }
            let notified = self.state.exit.notified();
            if self.state.exited.load(Ordering::Acquire) {
                return i32::from(!self.state.clean_exit.load(Ordering::Acquire));
            }
            notified.await;
        }
    }

    /// Snapshot of an open document. Requests naming a URI that is not
    /// open get an empty result, never an error reply.
    fn document(&self, uri: &Url) -> Option<Document> {
        let doc = self.state.store.snapshot(uri);
        if doc.is_none() {
            debug!(%uri, "request for a document that is not open");
        }
        doc
    }

    async fn publish_diagnostics(&self, conn: &Connection, uri: Url, version: i32, text: &str) {
        let params = PublishDiagnosticsParams {
            uri,
            diagnostics: diagnostics::diagnostics(text, &self.state.env),
            version: Some(version),
        };
        if let Err(err) = conn.notify("textDocument/publishDiagnostics", params).await {
            debug!(error = %err, "failed to publish diagnostics");
        }
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    ..CompletionOptions::default()
                }),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
                    retrigger_characters: None,
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                references_provider: Some(OneOf::Left(true)),
                document_highlight_provider: Some(OneOf::Left(true)),
                document_formatting_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                })),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: semantic_tokens::legend(),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            range: None,
                            work_done_progress_options: WorkDoneProgressOptions::default(),
                        },
                    ),
                ),
                inlay_hint_provider: Some(OneOf::Left(true)),
                diagnostic_provider: Some(DiagnosticServerCapabilities::Options(
                    DiagnosticOptions {
                        identifier: Some("rill".to_string()),
                        inter_file_dependencies: false,
                        workspace_diagnostics: false,
                        work_done_progress_options: WorkDoneProgressOptions::default(),
                    },
                )),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "rill-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        }
    }
}

fn parse_params<P: DeserializeOwned>(params: Option<Value>) -> Result<P, ResponseError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|err| ResponseError::invalid_params(err.to_string()))
}

fn to_value(value: impl serde::Serialize) -> Result<Value, ResponseError> {
    serde_json::to_value(value).map_err(|err| ResponseError::internal(err.to_string()))
}

#[async_trait]
impl Handler for Server {
    async fn handle_request(
        &self,
        _conn: &Connection,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, ResponseError> {
        debug!(method, "request");
        match method {
            "initialize" => to_value(self.initialize_result()),
            "shutdown" => {
                self.state.shutdown_requested.store(true, Ordering::Release);
                Ok(Value::Null)
            }
            "textDocument/hover" => {
                let params: HoverParams = parse_params(params)?;
                let pos = params.text_document_position_params;
                let Some(doc) = self.document(&pos.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(hover::hover(&doc.text, pos.position, &self.state.env))
            }
            "textDocument/completion" => {
                let params: CompletionParams = parse_params(params)?;
                let pos = params.text_document_position;
                let Some(doc) = self.document(&pos.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(completion::completion(
                    &doc.text,
                    pos.position,
                    &self.state.env,
                ))
            }
            "textDocument/signatureHelp" => {
                let params: SignatureHelpParams = parse_params(params)?;
                let pos = params.text_document_position_params;
                let Some(doc) = self.document(&pos.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(signature_help::signature_help(
                    &doc.text,
                    pos.position,
                    &self.state.env,
                ))
            }
            "textDocument/references" => {
                let params: ReferenceParams = parse_params(params)?;
                let pos = params.text_document_position;
                let Some(doc) = self.document(&pos.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(references::references(
                    &doc.text,
                    &pos.text_document.uri,
                    pos.position,
                ))
            }
            "textDocument/documentHighlight" => {
                let params: DocumentHighlightParams = parse_params(params)?;
                let pos = params.text_document_position_params;
                let Some(doc) = self.document(&pos.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(highlight::highlights(&doc.text, pos.position))
            }
            "textDocument/prepareRename" => {
                let params: TextDocumentPositionParams = parse_params(params)?;
                let Some(doc) = self.document(&params.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(rename::prepare_rename(&doc.text, params.position))
            }
            "textDocument/rename" => {
                let params: RenameParams = parse_params(params)?;
                let pos = params.text_document_position;
                let Some(doc) = self.document(&pos.text_document.uri) else {
                    return Ok(Value::Null);
                };
                match rename::rename(
                    &doc.text,
                    &pos.text_document.uri,
                    pos.position,
                    &params.new_name,
                ) {
                    Ok(edit) => to_value(edit),
                    // A bad replacement name is a caller mistake; an
                    // unusable cursor position just yields no edit.
                    Err(
                        err @ (rename::RenameError::InvalidName(_)
                        | rename::RenameError::ReservedName(_)),
                    ) => Err(ResponseError::invalid_params(err.to_string())),
                    Err(_) => Ok(Value::Null),
                }
            }
            "textDocument/semanticTokens/full" => {
                let params: lsp_types::SemanticTokensParams = parse_params(params)?;
                let Some(doc) = self.document(&params.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(semantic_tokens::semantic_tokens(&doc.text))
            }
            "textDocument/formatting" => {
                let params: DocumentFormattingParams = parse_params(params)?;
                let Some(doc) = self.document(&params.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(format::format(&doc.text))
            }
            "textDocument/inlayHint" => {
                let params: InlayHintParams = parse_params(params)?;
                let Some(doc) = self.document(&params.text_document.uri) else {
                    return Ok(Value::Null);
                };
                to_value(inlay_hints::inlay_hints(
                    &doc.text,
                    params.range,
                    &self.state.env,
                ))
            }
            "textDocument/diagnostic" => {
                let params: DocumentDiagnosticParams = parse_params(params)?;
                // A pull for an unopened document reports no items.
                let items = match self.document(&params.text_document.uri) {
                    Some(doc) => diagnostics::diagnostics(&doc.text, &self.state.env),
                    None => Vec::new(),
                };
                to_value(DocumentDiagnosticReportResult::Report(
                    DocumentDiagnosticReport::Full(RelatedFullDocumentDiagnosticReport {
                        related_documents: None,
                        full_document_diagnostic_report: FullDocumentDiagnosticReport {
                            result_id: None,
                            items,
                        },
                    }),
                ))
            }
            _ => Err(ResponseError::method_not_found(method)),
        }
    }

    async fn handle_notification(&self, conn: &Connection, method: &str, params: Option<Value>) {
        debug!(method, "notification");
        match method {
            "initialized" => {}
            "exit" => {
                let clean = self.state.shutdown_requested.load(Ordering::Acquire);
                self.state.clean_exit.store(clean, Ordering::Release);
                self.state.exited.store(true, Ordering::Release);
                self.state.exit.notify_waiters();
            }
            "textDocument/didOpen" => {
                let Ok(params) = serde_json::from_value::<DidOpenTextDocumentParams>(
                    params.unwrap_or(Value::Null),
                ) else {
                    return;
                };
                let doc = params.text_document;
                self.state
                    .store
                    .open(doc.uri.clone(), doc.version, doc.text.clone());
                self.publish_diagnostics(conn, doc.uri, doc.version, &doc.text)
                    .await;
            }
            "textDocument/didChange" => {
                let Ok(params) = serde_json::from_value::<DidChangeTextDocumentParams>(
                    params.unwrap_or(Value::Null),
                ) else {
                    return;
                };
                // Full sync: the last change carries the whole document.
                let Some(change) = params.content_changes.into_iter().last() else {
                    return;
                };
                let uri = params.text_document.uri;
                let version = params.text_document.version;
                if let Err(err) = self.state.store.update(&uri, version, change.text.clone()) {
                    debug!(error = %err, "dropping change for unopened document");
                    return;
                }
                self.publish_diagnostics(conn, uri, version, &change.text)
                    .await;
            }
            "textDocument/didClose" => {
                let Ok(params) = serde_json::from_value::<DidCloseTextDocumentParams>(
                    params.unwrap_or(Value::Null),
                ) else {
                    return;
                };
                let uri = params.text_document.uri;
                if self.state.store.close(&uri).is_ok() {
                    // Clear any published diagnostics for the closed file.
                    let params = PublishDiagnosticsParams {
                        uri,
                        diagnostics: Vec::new(),
                        version: None,
                    };
                    if let Err(err) = conn
                        .notify("textDocument/publishDiagnostics", params)
                        .await
                    {
                        debug!(error = %err, "failed to clear diagnostics");
                    }
                }
            }
            other => {
                debug!(method = other, "ignoring unknown notification");
            }
        }
    }
}

/// Run the server over an arbitrary stream pair until the client exits
/// or the stream closes. Returns the process exit code.
pub async fn serve<R, W>(reader: R, writer: W) -> i32
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let server = Server::new(Env::standard());
    let conn = Connection::new(reader, writer, server.clone());
    tokio::select! {
        code = server.exited() => code,
        () = conn.closed() => 0,
    }
}

/// Run the server over stdin and stdout.
pub async fn serve_stdio() -> i32 {
    serve(tokio::io::stdin(), tokio::io::stdout()).await
}
