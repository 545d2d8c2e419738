//! # Store Session Collaborator
//!
//! The pipeline never talks to a graph store directly; it goes through the
//! [`Session`] trait. A session knows two things: whether a domain entity has
//! a persisted identity, and how to run a parameter-bound query string into a
//! tabular result.
//!
//! [`MemorySession`] is a canned-response implementation used by tests and
//! demos. Real deployments implement [`Session`] over a driver; transport,
//! timeouts, and cancellation live there, not here.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binder::ParameterMap;
use crate::value::Value;

/// Store-side execution failure: malformed query text, constraint violation,
/// connectivity loss. Carries the store's message verbatim; the pipeline adds
/// no retry and no wrapping.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct StoreError {
    message: String,
}

impl StoreError {
    /// Create a store error from the store's own message
    pub fn new(message: impl Into<String>) -> Self {
        StoreError {
            message: message.into(),
        }
    }
}

/// Raw tabular result as the store returns it: a column header plus rows of
/// cells. The pipeline reads it and hands it on; it never mutates it and
/// never retains it past the current call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabularResult {
    /// Column names, in store order
    pub columns: Vec<String>,

    /// Rows of cells, one cell per column
    pub rows: Vec<Vec<Value>>,
}

impl TabularResult {
    /// Create a result from a column header and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        TabularResult { columns, rows }
    }

    /// An empty result with no columns
    pub fn empty() -> Self {
        TabularResult::default()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The single scalar cell of a one-row, one-column result
    pub fn scalar(&self) -> Option<&Value> {
        match (self.rows.len(), self.columns.len()) {
            (1, 1) => self.rows[0].first(),
            _ => None,
        }
    }
}

/// Graph-store session: identity resolution plus query execution.
///
/// Implementations own blocking behavior. The pipeline runs on the calling
/// thread and imposes no timeout of its own; a session that needs one must
/// surface it as a [`StoreError`].
pub trait Session: Send + Sync {
    /// Resolve a value to its persisted store identity.
    ///
    /// Returns `Some(identity)` when the value is a domain entity the store
    /// has persisted; `None` when it is not an entity or not persisted.
    fn resolve_identity(&self, value: &Value) -> Option<Value>;

    /// Execute a resolved query string with its parameter map.
    fn run(&self, query: &str, parameters: &ParameterMap) -> Result<TabularResult, StoreError>;
}

/// In-memory session with a persisted-entity identity table and canned query
/// responses, keyed by query text.
///
/// Interior mutability via `parking_lot::RwLock` so a shared session can be
/// seeded while queries run on other threads.
#[derive(Default)]
pub struct MemorySession {
    /// (label, key) -> store-assigned identity
    identities: RwLock<HashMap<(String, String), Value>>,

    /// query text -> canned result
    responses: RwLock<HashMap<String, TabularResult>>,

    /// query text -> canned failure
    failures: RwLock<HashMap<String, String>>,
}

impl MemorySession {
    /// Create an empty session
    pub fn new() -> Self {
        MemorySession::default()
    }

    /// Mark an entity as persisted with the given store identity
    pub fn persist_entity(&self, label: &str, key: &Value, identity: Value) {
        self.identities
            .write()
            .insert((label.to_string(), key.to_string()), identity);
    }

    /// Seed the canned result for a query text
    pub fn respond(&self, query: &str, result: TabularResult) {
        self.responses.write().insert(query.to_string(), result);
    }

    /// Seed a canned failure for a query text
    pub fn fail(&self, query: &str, message: &str) {
        self.failures
            .write()
            .insert(query.to_string(), message.to_string());
    }
}

impl Session for MemorySession {
    fn resolve_identity(&self, value: &Value) -> Option<Value> {
        let Value::Entity(entity) = value else {
            return None;
        };
        self.identities
            .read()
            .get(&(entity.label.clone(), entity.key.to_string()))
            .cloned()
    }

    fn run(&self, query: &str, _parameters: &ParameterMap) -> Result<TabularResult, StoreError> {
        if let Some(message) = self.failures.read().get(query) {
            return Err(StoreError::new(message.clone()));
        }
        Ok(self
            .responses
            .read()
            .get(query)
            .cloned()
            .unwrap_or_else(TabularResult::empty))
    }
}
