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

//! JSON-RPC 2.0 message shapes.
//!
//! A decoded body is classified by the presence of its fields: a `method`
//! makes it a request (with `id`) or a notification (without), anything
//! else is a response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The protocol version string sent in every message.
pub const VERSION: &str = "2.0";

/// A request or response id. The wire form is a JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric id.
    Number(i64),
    /// String id.
    String(String),
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::String(s) => write!(f, "{s}"),
        }
    }
}

/// The error member of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// JSON-RPC error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    /// Create an error with a code and message.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// A [`crate::error::METHOD_NOT_FOUND`] error for `method`.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            crate::error::METHOD_NOT_FOUND,
            format!("method not found: {method}"),
        )
    }

    /// A [`crate::error::INVALID_PARAMS`] error.
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(crate::error::INVALID_PARAMS, detail)
    }

    /// An [`crate::error::INTERNAL_ERROR`] error.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(crate::error::INTERNAL_ERROR, detail)
    }
}

/// The loose wire shape used for both encoding and classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireMessage {
    /// Protocol version. Tolerated if absent on input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Message id; absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// Method name; absent for responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Call or notification parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Successful response payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error response payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl WireMessage {
    /// Build a request message.
    pub fn request(id: Id, method: &str, params: Option<Value>) -> Self {
        WireMessage {
            jsonrpc: Some(VERSION.to_string()),
            id: Some(id),
            method: Some(method.to_string()),
            params,
            ..WireMessage::default()
        }
    }

    /// Build a notification message.
    pub fn notification(method: &str, params: Option<Value>) -> Self {
        WireMessage {
            jsonrpc: Some(VERSION.to_string()),
            method: Some(method.to_string()),
            params,
            ..WireMessage::default()
        }
    }

    /// Build a success response. `id` is `None` only for protocol-level
    /// errors where the request id could not be recovered.
    pub fn response(id: Option<Id>, result: Value) -> Self {
        WireMessage {
            jsonrpc: Some(VERSION.to_string()),
            id,
            result: Some(result),
            ..WireMessage::default()
        }
    }

    /// Build an error response.
    pub fn error_response(id: Option<Id>, error: ResponseError) -> Self {
        WireMessage {
            jsonrpc: Some(VERSION.to_string()),
            id,
            error: Some(error),
            ..WireMessage::default()
        }
    }

    /// Classify this message by its populated fields.
    pub fn classify(self) -> Incoming {
        match (self.method, self.id) {
            (Some(method), Some(id)) => Incoming::Request {
                id,
                method,
                params: self.params,
            },
            (Some(method), None) => Incoming::Notification {
                method,
                params: self.params,
            },
            (None, id) => Incoming::Response {
                id,
                result: self.result,
                error: self.error,
            },
        }
    }
}

/// A classified incoming message.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// A call expecting a reply.
    Request {
        /// Id to echo in the reply.
        id: Id,
        /// Method name.
        method: String,
        /// Parameters.
        params: Option<Value>,
    },
    /// A one-way message.
    Notification {
        /// Method name.
        method: String,
        /// Parameters.
        params: Option<Value>,
    },
    /// A reply to an outbound call.
    Response {
        /// Id of the call being answered.
        id: Option<Id>,
        /// Success payload.
        result: Option<Value>,
        /// Error payload.
        error: Option<ResponseError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_wire_form_is_untagged() {
        assert_eq!(serde_json::to_value(Id::Number(7)).unwrap(), json!(7));
        assert_eq!(
            serde_json::to_value(Id::String("a".into())).unwrap(),
            json!("a")
        );
        assert_eq!(serde_json::from_value::<Id>(json!(7)).unwrap(), Id::Number(7));
    }

    #[test]
    fn test_classification() {
        let msg: WireMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "method": "m"})).unwrap();
        assert!(matches!(msg.classify(), Incoming::Request { .. }));

        let msg: WireMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "m"})).unwrap();
        assert!(matches!(msg.classify(), Incoming::Notification { .. }));

        let msg: WireMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        assert!(matches!(msg.classify(), Incoming::Response { .. }));
    }

    #[test]
    fn test_notifications_omit_id() {
        let wire = serde_json::to_value(WireMessage::notification("m", None)).unwrap();
        assert!(wire.get("id").is_none());
        assert!(wire.get("result").is_none());
    }

    #[test]
    fn test_error_response_round_trips() {
        let wire = WireMessage::error_response(
            Some(Id::Number(3)),
            ResponseError::method_not_found("nope"),
        );
        let value = serde_json::to_value(&wire).unwrap();
        assert_eq!(value["error"]["code"], json!(crate::error::METHOD_NOT_FOUND));
        let parsed: WireMessage = serde_json::from_value(value).unwrap();
        let Incoming::Response { error, .. } = parsed.classify() else {
            panic!("expected response");
        };
        assert!(error.unwrap().message.contains("nope"));
    }
}
