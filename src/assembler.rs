//! # Query Assembler
//!
//! Combines a compiled template with one call's resolved parameters into an
//! executable [`QueryDescriptor`]. The only check that happens here is the
//! one that must not wait for the store: every placeholder the template
//! references has to be bound, or the call fails with a clearly attributed
//! unresolved-parameter error instead of a silent null substitution.

use serde::{Deserialize, Serialize};

use crate::binder::ParameterMap;
use crate::error::{QueryError, QueryResult};
use crate::template::QueryTemplate;

/// Executable query: resolved texts plus the parameter map. Immutable once
/// built, passed opaquely to execution, discarded after the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    query: String,
    count_query: Option<String>,
    parameters: ParameterMap,
}

impl QueryDescriptor {
    /// Primary query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Count-query text, carried through from the template unchanged
    pub fn count_query(&self) -> Option<&str> {
        self.count_query.as_deref()
    }

    /// Bound parameters
    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }
}

/// Assemble a descriptor, verifying every referenced placeholder is bound.
///
/// `method_name` is used only for error attribution.
pub fn assemble(
    method_name: &str,
    template: &QueryTemplate,
    parameters: ParameterMap,
) -> QueryResult<QueryDescriptor> {
    for placeholder in template.placeholders() {
        if !parameters.contains(placeholder) {
            return Err(QueryError::UnresolvedParameter {
                method: method_name.to_string(),
                placeholder: placeholder.clone(),
            });
        }
    }
    Ok(QueryDescriptor {
        query: template.query().to_string(),
        count_query: template.count_query().map(ToString::to_string),
        parameters,
    })
}
