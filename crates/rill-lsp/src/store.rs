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

//! Open-document store.
//!
//! All open documents live behind one exclusive lock. Documents are
//! replaced whole on change (full sync); handlers work on snapshots, so
//! the lock is held only for the map operation itself.

use std::collections::HashMap;

use lsp_types::Url;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// A document store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation referenced a URI that is not open.
    #[error("document not open: {0}")]
    NotOpen(Url),
}

/// One open document.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document URI.
    pub uri: Url,
    /// Version reported by the client, monotonically increasing per URI.
    pub version: i32,
    /// Full text content.
    pub text: String,
}

/// The set of open documents.
#[derive(Default)]
pub struct Store {
    documents: Mutex<HashMap<Url, Document>>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Store::default()
    }

    /// Open a document. Re-opening an already open URI replaces it.
    pub fn open(&self, uri: Url, version: i32, text: String) {
        debug!(%uri, version, "open document");
        let document = Document {
            uri: uri.clone(),
            version,
            text,
        };
        self.documents.lock().insert(uri, document);
    }

    /// Replace the content of an open document.
    pub fn update(&self, uri: &Url, version: i32, text: String) -> Result<(), StoreError> {
        debug!(%uri, version, "update document");
        let mut documents = self.documents.lock();
        let Some(document) = documents.get_mut(uri) else {
            return Err(StoreError::NotOpen(uri.clone()));
        };
        document.version = version;
        document.text = text;
        Ok(())
    }

    /// Close a document and drop its content.
    pub fn close(&self, uri: &Url) -> Result<(), StoreError> {
        debug!(%uri, "close document");
        match self.documents.lock().remove(uri) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotOpen(uri.clone())),
        }
    }

    /// A snapshot of an open document.
    pub fn snapshot(&self, uri: &Url) -> Option<Document> {
        self.documents.lock().get(uri).cloned()
    }

    /// The number of open documents.
    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    /// True when no documents are open.
    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_open_and_snapshot() {
        let store = Store::new();
        store.open(uri("file:///a.rill"), 1, "1 + 2".to_string());
        let doc = store.snapshot(&uri("file:///a.rill")).unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.text, "1 + 2");
    }

    #[test]
    fn test_update_replaces_whole_text() {
        let store = Store::new();
        store.open(uri("file:///a.rill"), 1, "1".to_string());
        store
            .update(&uri("file:///a.rill"), 2, "2 + 3".to_string())
            .unwrap();
        let doc = store.snapshot(&uri("file:///a.rill")).unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.text, "2 + 3");
    }

    #[test]
    fn test_update_unknown_uri_fails() {
        let store = Store::new();
        let err = store
            .update(&uri("file:///missing.rill"), 1, String::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotOpen(_)));
    }

    #[test]
    fn test_close_removes_document() {
        let store = Store::new();
        store.open(uri("file:///a.rill"), 1, "x".to_string());
        store.close(&uri("file:///a.rill")).unwrap();
        assert!(store.snapshot(&uri("file:///a.rill")).is_none());
        assert!(store.close(&uri("file:///a.rill")).is_err());
    }

    #[test]
    fn test_snapshot_is_decoupled() {
        let store = Store::new();
        store.open(uri("file:///a.rill"), 1, "old".to_string());
        let snap = store.snapshot(&uri("file:///a.rill")).unwrap();
        store
            .update(&uri("file:///a.rill"), 2, "new".to_string())
            .unwrap();
        assert_eq!(snap.text, "old");
    }
}
