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

//! End-to-end server tests over an in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rill_lsp::Server;
use rill_rpc::{Connection, Error, Handler, ResponseError, INVALID_PARAMS, METHOD_NOT_FOUND};
use rill_syntax::Env;
use serde_json::{json, Value};

type NotificationLog = Arc<Mutex<Vec<(String, Value)>>>;

struct ClientHandler {
    notifications: NotificationLog,
}

#[async_trait]
impl Handler for ClientHandler {
    async fn handle_request(
        &self,
        _conn: &Connection,
        method: &str,
        _params: Option<Value>,
    ) -> Result<Value, ResponseError> {
        Err(ResponseError::method_not_found(method))
    }

    async fn handle_notification(&self, _conn: &Connection, method: &str, params: Option<Value>) {
        self.notifications
            .lock()
            .push((method.to_string(), params.unwrap_or(Value::Null)));
    }
}

fn setup() -> (Connection, Server, NotificationLog) {
    let (client_stream, server_stream) = tokio::io::duplex(64 * 1024);
    let (client_read, client_write) = tokio::io::split(client_stream);
    let (server_read, server_write) = tokio::io::split(server_stream);

    let server = Server::new(Env::standard());
    let _server_conn = Connection::new(server_read, server_write, server.clone());

    let notifications: NotificationLog = Arc::new(Mutex::new(Vec::new()));
    let client = Connection::new(
        client_read,
        client_write,
        ClientHandler {
            notifications: notifications.clone(),
        },
    );
    (client, server, notifications)
}

async fn open(client: &Connection, uri: &str, text: &str) {
    client
        .notify(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": "rill",
                    "version": 1,
                    "text": text,
                }
            }),
        )
        .await
        .unwrap();
}

async fn wait_for_notification(log: &NotificationLog, method: &str) -> Value {
    for _ in 0..200 {
        let found = log
            .lock()
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v.clone());
        if let Some(value) = found {
            return value;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {method}");
}

fn doc_position(uri: &str, line: u32, character: u32) -> Value {
    json!({
        "textDocument": { "uri": uri },
        "position": { "line": line, "character": character },
    })
}

#[tokio::test]
async fn test_initialize() {
    let (client, _server, _log) = setup();
    let result = client.call("initialize", json!({})).await.unwrap();
    assert_eq!(result["capabilities"]["textDocumentSync"], json!(1));
    assert_eq!(result["serverInfo"]["name"], json!("rill-lsp"));
    assert_eq!(
        result["capabilities"]["completionProvider"]["triggerCharacters"],
        json!(["."])
    );
}

#[tokio::test]
async fn test_did_open_publishes_diagnostics() {
    let (client, _server, log) = setup();
    open(&client, "file:///a.rill", "1 + 'hello'").await;
    let params = wait_for_notification(&log, "textDocument/publishDiagnostics").await;
    assert_eq!(params["uri"], json!("file:///a.rill"));
    let diags = params["diagnostics"].as_array().unwrap();
    assert_eq!(diags.len(), 1);
    assert!(diags[0]["message"].as_str().unwrap().contains("'+'"));
}

#[tokio::test]
async fn test_did_change_republishes() {
    let (client, _server, log) = setup();
    open(&client, "file:///a.rill", "1 +").await;
    client
        .notify(
            "textDocument/didChange",
            json!({
                "textDocument": { "uri": "file:///a.rill", "version": 2 },
                "contentChanges": [{ "text": "1 + 2" }],
            }),
        )
        .await
        .unwrap();
    for _ in 0..200 {
        let clean = log.lock().iter().any(|(m, v)| {
            m == "textDocument/publishDiagnostics"
                && v["version"] == json!(2)
                && v["diagnostics"].as_array().is_some_and(Vec::is_empty)
        });
        if clean {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no clean diagnostics after change");
}

#[tokio::test]
async fn test_hover_over_macro() {
    let (client, _server, _log) = setup();
    open(&client, "file:///a.rill", "[1].map(x, x)").await;
    let result = client
        .call("textDocument/hover", doc_position("file:///a.rill", 0, 5))
        .await
        .unwrap();
    let text = result["contents"]["value"].as_str().unwrap();
    assert!(text.starts_with("**Macro** `map`"), "{text}");
}

#[tokio::test]
async fn test_rename_variable() {
    let (client, _server, _log) = setup();
    open(&client, "file:///a.rill", "x + x + x").await;
    let mut params = doc_position("file:///a.rill", 0, 0);
    params["newName"] = json!("y");
    let result = client.call("textDocument/rename", params).await.unwrap();
    let edits = result["changes"]["file:///a.rill"].as_array().unwrap();
    assert_eq!(edits.len(), 3);
}

#[tokio::test]
async fn test_rename_function_yields_no_edit() {
    let (client, _server, _log) = setup();
    open(&client, "file:///a.rill", "size([1])").await;
    let mut params = doc_position("file:///a.rill", 0, 1);
    params["newName"] = json!("length");
    let result = client.call("textDocument/rename", params).await.unwrap();
    assert_eq!(result, Value::Null);
}

#[tokio::test]
async fn test_rename_to_reserved_word_is_an_error() {
    let (client, _server, _log) = setup();
    open(&client, "file:///a.rill", "x + 1").await;
    let mut params = doc_position("file:///a.rill", 0, 0);
    params["newName"] = json!("true");
    let err = client
        .call("textDocument/rename", params)
        .await
        .unwrap_err();
    let Error::Response { code, message, .. } = err else {
        panic!("expected a response error");
    };
    assert_eq!(code, INVALID_PARAMS);
    assert!(message.contains("reserved"), "{message}");
}

#[tokio::test]
async fn test_pull_diagnostics() {
    let (client, _server, _log) = setup();
    open(&client, "file:///a.rill", "unknown_var").await;
    let result = client
        .call(
            "textDocument/diagnostic",
            json!({ "textDocument": { "uri": "file:///a.rill" } }),
        )
        .await
        .unwrap();
    assert_eq!(result["kind"], json!("full"));
    let items = result["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_formatting() {
    let (client, _server, _log) = setup();
    open(&client, "file:///a.rill", "1+2 *  3").await;
    let result = client
        .call(
            "textDocument/formatting",
            json!({
                "textDocument": { "uri": "file:///a.rill" },
                "options": { "tabSize": 4, "insertSpaces": true },
            }),
        )
        .await
        .unwrap();
    let edits = result.as_array().unwrap();
    assert_eq!(edits[0]["newText"], json!("1 + 2 * 3\n"));
}

#[tokio::test]
async fn test_semantic_tokens() {
    let (client, _server, _log) = setup();
    open(&client, "file:///a.rill", "x + 1").await;
    let result = client
        .call(
            "textDocument/semanticTokens/full",
            json!({ "textDocument": { "uri": "file:///a.rill" } }),
        )
        .await
        .unwrap();
    let data = result["data"].as_array().unwrap();
    // Three tokens, five integers each.
    assert_eq!(data.len(), 15);
}

#[tokio::test]
async fn test_completion_after_dot() {
    let (client, _server, _log) = setup();
    open(&client, "file:///a.rill", "'abc'.").await;
    let result = client
        .call(
            "textDocument/completion",
            doc_position("file:///a.rill", 0, 6),
        )
        .await
        .unwrap();
    let labels: Vec<&str> = result
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["label"].as_str())
        .collect();
    assert!(labels.contains(&"startsWith"), "{labels:?}");
}

#[tokio::test]
async fn test_request_against_unopened_document_is_null() {
    let (client, _server, _log) = setup();
    let result = client
        .call("textDocument/hover", doc_position("file:///nope.rill", 0, 0))
        .await
        .unwrap();
    assert_eq!(result, Value::Null);
}

#[tokio::test]
async fn test_pull_diagnostics_for_unopened_document_is_empty() {
    let (client, _server, _log) = setup();
    let result = client
        .call(
            "textDocument/diagnostic",
            json!({ "textDocument": { "uri": "file:///nope.rill" } }),
        )
        .await
        .unwrap();
    assert_eq!(result["kind"], "full");
    assert_eq!(result["items"], json!([]));
}

#[tokio::test]
async fn test_unknown_method() {
    let (client, _server, _log) = setup();
    let err = client.call("textDocument/fold", json!({})).await.unwrap_err();
    let Error::Response { code, .. } = err else {
        panic!("expected a response error");
    };
    assert_eq!(code, METHOD_NOT_FOUND);
}

#[tokio::test]
async fn test_shutdown_then_exit_is_clean() {
    let (client, server, _log) = setup();
    client.call("shutdown", json!(null)).await.unwrap();
    client.notify("exit", json!(null)).await.unwrap();
    let code = tokio::time::timeout(Duration::from_secs(1), server.exited())
        .await
        .unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn test_exit_without_shutdown_is_unclean() {
    let (client, server, _log) = setup();
    client.notify("exit", json!(null)).await.unwrap();
    let code = tokio::time::timeout(Duration::from_secs(1), server.exited())
        .await
        .unwrap();
    assert_eq!(code, 1);
}
