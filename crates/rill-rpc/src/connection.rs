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

//! A full-duplex JSON-RPC connection.
//!
//! Two tasks drive a connection. The reader task decodes frames and
//! resolves replies to outbound calls immediately, so a handler that
//! issues its own outbound call cannot deadlock the connection. Requests
//! and notifications are forwarded to a dispatch task that invokes the
//! [`Handler`] one message at a time, preserving arrival order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, warn};

use crate::codec;
use crate::error::{self, Error, Result};
use crate::message::{Id, Incoming, ResponseError, WireMessage};

/// Application-level message handling.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle one request and produce its reply.
    async fn handle_request(
        &self,
        conn: &Connection,
        method: &str,
        params: Option<Value>,
    ) -> std::result::Result<Value, ResponseError>;

    /// Handle one notification.
    async fn handle_notification(&self, conn: &Connection, method: &str, params: Option<Value>);
}

type ReplySlot = oneshot::Sender<Result<Value>>;

struct Inner {
    writer: tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    pending: Mutex<HashMap<Id, ReplySlot>>,
    next_id: AtomicI64,
    closed: AtomicBool,
    done: Notify,
}

/// A handle to a running connection. Cloning is cheap and all clones
/// refer to the same connection.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    /// Start a connection over a reader/writer pair and spawn its tasks.
    /// The connection runs until the reader reaches end of stream or a
    /// fatal framing error occurs.
    pub fn new<R, W, H>(reader: R, writer: W, handler: H) -> Connection
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
        H: Handler,
    {
        let conn = Connection {
            inner: Arc::new(Inner {
                writer: tokio::sync::Mutex::new(Box::new(writer)),
                pending: Mutex::new(HashMap::new()),
                next_id: AtomicI64::new(1),
                closed: AtomicBool::new(false),
                done: Notify::new(),
            }),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(read_loop(conn.clone(), reader, tx));
        tokio::spawn(dispatch_loop(conn.clone(), rx, handler));
        conn
    }

    /// Send a request and wait for its reply.
    pub async fn call(&self, method: &str, params: impl Serialize) -> Result<Value> {
        let (_id, rx) = self.start_call(method, params).await?;
        rx.await.map_err(|_| Error::Closed)?
    }

    /// [`Connection::call`] with a deadline. On timeout the reply slot is
    /// discarded; a late reply is then dropped as unknown.
    pub async fn call_with_timeout(
        &self,
        timeout: Duration,
        method: &str,
        params: impl Serialize,
    ) -> Result<Value> {
        let (id, rx) = self.start_call(method, params).await?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(reply) => reply.map_err(|_| Error::Closed)?,
            Err(_) => {
                self.inner.pending.lock().remove(&id);
                Err(Error::Timeout)
            }
        }
    }

    async fn start_call(
        &self,
        method: &str,
        params: impl Serialize,
    ) -> Result<(Id, oneshot::Receiver<Result<Value>>)> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let id = Id::Number(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(id.clone(), tx);
        let message = WireMessage::request(id.clone(), method, Some(serde_json::to_value(params)?));
        if let Err(e) = self.send_message(&message).await {
            self.inner.pending.lock().remove(&id);
            return Err(e);
        }
        Ok((id, rx))
    }

    /// Send a notification.
    pub async fn notify(&self, method: &str, params: impl Serialize) -> Result<()> {
        let message = WireMessage::notification(method, Some(serde_json::to_value(params)?));
        self.send_message(&message).await
    }

    /// True once the connection has terminated.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Wait until the connection terminates.
    pub async fn closed(&self) {
        loop {
            if self.is_closed() {
                return;
            }
            let notified = self.inner.done.notified();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }

    async fn send_message(&self, message: &WireMessage) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let body = serde_json::to_vec(message)?;
        let mut writer = self.inner.writer.lock().await;
        codec::write_frame(&mut *writer, &body).await
    }

    /// Resolve a reply against the pending-call table. Each slot is
    /// single-use; a second reply with the same id is dropped.
    fn resolve(&self, id: Option<Id>, result: Option<Value>, error: Option<ResponseError>) {
        let Some(id) = id else {
            warn!("dropping response without an id");
            return;
        };
        let slot = self.inner.pending.lock().remove(&id);
        let Some(slot) = slot else {
            warn!(%id, "dropping reply for unknown or already answered call");
            return;
        };
        let outcome = match error {
            Some(error) => Err(Error::Response {
                code: error.code,
                message: error.message,
                data: error.data,
            }),
            None => Ok(result.unwrap_or(Value::Null)),
        };
        let _ = slot.send(outcome);
    }

    fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let pending: Vec<ReplySlot> = {
            let mut map = self.inner.pending.lock();
            map.drain().map(|(_, slot)| slot).collect()
        };
        for slot in pending {
            let _ = slot.send(Err(Error::Closed));
        }
        self.inner.done.notify_waiters();
    }
}

async fn read_loop<R>(
    conn: Connection,
    reader: R,
    dispatch: mpsc::UnboundedSender<Incoming>,
) where
    R: AsyncRead + Send + Unpin + 'static,
{
    let mut reader = BufReader::new(reader);
    loop {
        match codec::read_frame(&mut reader).await {
            Ok(Some(body)) => match serde_json::from_slice::<WireMessage>(&body) {
                Ok(message) => match message.classify() {
                    // Replies are resolved here, not on the dispatch task,
                    // so they get through while a handler is running.
                    Incoming::Response { id, result, error } => conn.resolve(id, result, error),
                    incoming => {
                        if dispatch.send(incoming).is_err() {
                            break;
                        }
                    }
                },
                // A malformed body is recoverable; report it and continue.
                Err(e) => {
                    debug!(error = %e, "received invalid JSON body");
                    let response = WireMessage::error_response(
                        None,
                        ResponseError::new(error::PARSE_ERROR, format!("invalid JSON body: {e}")),
                    );
                    if conn.send_message(&response).await.is_err() {
                        break;
                    }
                }
            },
            Ok(None) => {
                debug!("peer closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "fatal transport error");
                break;
            }
        }
    }
    drop(dispatch);
    conn.shutdown();
}

async fn dispatch_loop<H>(
    conn: Connection,
    mut incoming: mpsc::UnboundedReceiver<Incoming>,
    handler: H,
) where
    H: Handler,
{
    while let Some(message) = incoming.recv().await {
        match message {
            Incoming::Request { id, method, params } => {
                debug!(%id, %method, "handling request");
                let response = match handler.handle_request(&conn, &method, params).await {
                    Ok(result) => WireMessage::response(Some(id), result),
                    Err(error) => WireMessage::error_response(Some(id), error),
                };
                if conn.send_message(&response).await.is_err() {
                    break;
                }
            }
            Incoming::Notification { method, params } => {
                debug!(%method, "handling notification");
                handler.handle_notification(&conn, &method, params).await;
            }
            // Responses never reach the dispatch channel.
            Incoming::Response { .. } => {}
        }
    }
    conn.shutdown();
}
