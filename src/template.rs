//! # Query Templates
//!
//! Compiled form of a method's annotated query text, plus the per-method
//! compile-once cache slot.
//!
//! ## Design
//!
//! Compilation scans the primary and count text for `{placeholder}` markers
//! and records the recognized names. It is a pure function of the method's
//! static metadata, so the cache slot tolerates racing first compilations:
//! both racers produce the same template, last write wins, readers never see
//! partial state. `ArcSwapOption` gives that without a mutex.

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::metadata::QueryMethod;

/// Immutable compiled representation of an annotated query: the raw texts
/// plus the set of placeholder names they reference. Compiled once per query
/// method and shared read-only across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    query: String,
    count_query: Option<String>,
    placeholders: BTreeSet<String>,
}

impl QueryTemplate {
    /// Compile a method's annotation texts into a template.
    ///
    /// Placeholders are `{name}` or `{index}` markers; the count query's
    /// placeholders are recognized too, so an unresolved count parameter
    /// fails at assembly like any other.
    pub fn compile(method: &QueryMethod) -> Self {
        let mut placeholders = scan_placeholders(method.query());
        if let Some(count) = method.count_query() {
            placeholders.extend(scan_placeholders(count));
        }
        QueryTemplate {
            query: method.query().to_string(),
            count_query: method.count_query().map(ToString::to_string),
            placeholders,
        }
    }

    /// Primary query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Count-query text, if declared
    pub fn count_query(&self) -> Option<&str> {
        self.count_query.as_deref()
    }

    /// Placeholder names the texts reference
    pub fn placeholders(&self) -> &BTreeSet<String> {
        &self.placeholders
    }
}

/// Extract `{placeholder}` names from a query text.
///
/// A marker is an open brace, one or more characters that are alphanumeric
/// or `_`, and a close brace. Braces that do not fit that shape (map
/// literals, quantifiers) are left alone.
fn scan_placeholders(text: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
                end += 1;
            }
            if end > start && end < bytes.len() && bytes[end] == b'}' {
                names.insert(text[start..end].to_string());
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    names
}

/// Write-once memoization of a method's compiled template.
///
/// First use compiles and publishes; later uses load the published value.
/// Concurrent first uses may both compile, which is benign: compilation is
/// deterministic over immutable metadata.
#[derive(Debug, Default)]
pub struct TemplateSlot {
    slot: ArcSwapOption<QueryTemplate>,
}

impl TemplateSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        TemplateSlot {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Return the compiled template, compiling and publishing on first use
    pub fn get_or_compile(&self, method: &QueryMethod) -> Arc<QueryTemplate> {
        if let Some(existing) = self.slot.load_full() {
            return existing;
        }
        let compiled = Arc::new(QueryTemplate::compile(method));
        self.slot.store(Some(Arc::clone(&compiled)));
        compiled
    }
}
