//! # Parameter Binder
//!
//! Resolves one call's argument values into a flat [`ParameterMap`] keyed by
//! both position and declared name.
//!
//! ## Binding rules
//!
//! - Index and name addressing are supported at the same time, so every
//!   parameter is always bound under the string form of its index.
//! - A parameter additionally binds under its declared name iff it carries
//!   one and is not a special (framework-reserved) parameter. Paging and
//!   sorting carriers must never shadow user query placeholders.
//! - A domain-entity argument with a resolvable persisted identity binds as
//!   that identity; a transient entity or a plain value binds unchanged.
//!
//! Binding has no side effects: it never mutates the store or the arguments.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::metadata::ParameterDescriptor;
use crate::session::Session;
use crate::value::Value;

/// Resolved parameters for one invocation: key (index string or declared
/// name) to resolved value. Call-local, discarded after execution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterMap {
    entries: HashMap<String, Value>,
}

impl ParameterMap {
    /// Create an empty map
    pub fn new() -> Self {
        ParameterMap::default()
    }

    /// Look up a bound value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether a key is bound
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over bound entries (order unspecified)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }
}

/// Bind one call's arguments against the method's declared parameters.
///
/// `descriptors` and `arguments` must have equal length; a mismatch is an
/// [`QueryError::ArityMismatch`] attributed to `method_name`. Two non-special
/// descriptors sharing a declared name resolve last-writer-wins here; method
/// registration rejects that configuration up front
/// (see [`crate::metadata::QueryMethod::new`]).
pub fn bind(
    method_name: &str,
    descriptors: &[ParameterDescriptor],
    arguments: &[Value],
    session: &dyn Session,
) -> QueryResult<ParameterMap> {
    if descriptors.len() != arguments.len() {
        return Err(QueryError::ArityMismatch {
            method: method_name.to_string(),
            expected: descriptors.len(),
            actual: arguments.len(),
        });
    }

    let mut map = ParameterMap::new();
    for (position, descriptor) in descriptors.iter().enumerate() {
        // Descriptors straight from QueryMethod are always the dense
        // sequence 0..n; guard anyway so hand-built lists cannot panic.
        let argument =
            arguments
                .get(descriptor.index)
                .ok_or_else(|| QueryError::IndexOutOfOrder {
                    position,
                    declared: descriptor.index,
                })?;
        let resolved = resolve_value(argument, session);

        // Parameters are addressable by index and by name at the same time,
        // so they are always bound by index.
        map.insert(descriptor.index.to_string(), resolved.clone());

        // Never bind special parameters as named values.
        if descriptor.is_named() {
            if let Some(name) = &descriptor.name {
                map.insert(name.clone(), resolved);
            }
        }
    }
    Ok(map)
}

/// The argument might be an entity; substitute its persisted identity when
/// the store knows one.
fn resolve_value(argument: &Value, session: &dyn Session) -> Value {
    match session.resolve_identity(argument) {
        Some(identity) => identity,
        // Either not an entity or not persisted
        None => argument.clone(),
    }
}
