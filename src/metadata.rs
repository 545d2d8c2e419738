//! # Query-Method Metadata
//!
//! Everything the pipeline needs to know about a repository method is fixed
//! at registration time and held here: the annotated query text, the ordered
//! parameter descriptors, the return shape, and any declared projection
//! target. Nothing in this module is inspected per call; the pipeline reads
//! precomputed descriptors instead of walking signatures at runtime.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Per-declared-parameter metadata, built once when the owning method is
/// registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Zero-based position in the method signature
    pub index: usize,

    /// Declared placeholder name, if the parameter carries one
    pub name: Option<String>,

    /// Framework-reserved parameter (paging/sorting carrier). Special
    /// parameters are never bound under a name key.
    pub special: bool,
}

impl ParameterDescriptor {
    /// A positional parameter with no declared name
    pub fn positional(index: usize) -> Self {
        ParameterDescriptor {
            index,
            name: None,
            special: false,
        }
    }

    /// A named, bindable parameter
    pub fn named(index: usize, name: impl Into<String>) -> Self {
        ParameterDescriptor {
            index,
            name: Some(name.into()),
            special: false,
        }
    }

    /// A framework-reserved parameter (e.g. a page request). May carry a
    /// name for diagnostics; it still never binds under it.
    pub fn special(index: usize, name: impl Into<String>) -> Self {
        ParameterDescriptor {
            index,
            name: Some(name.into()),
            special: true,
        }
    }

    /// Whether this parameter binds under its declared name
    pub fn is_named(&self) -> bool {
        self.name.is_some() && !self.special
    }
}

/// Declared return shape of a query method, classified once at registration
/// time from the method signature and carried into dispatch and adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnShape {
    /// The store's native tabular result, passed through untouched
    Raw,
    /// At most one converted object
    Single,
    /// All converted objects
    Collection,
    /// A page of converted objects plus a total from the count query
    Paged,
    /// A single scalar cell (exists/count style signatures)
    Scalar,
}

/// Caller-specified target shape for converted results. Declared on the
/// method, or supplied per call as a dynamic projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionTarget {
    /// Projection type name, resolved against store metadata
    pub type_name: String,

    /// Fields the projection exposes; selected from row columns in order
    pub fields: Vec<String>,
}

impl ProjectionTarget {
    /// Create a projection target
    pub fn new(type_name: impl Into<String>, fields: Vec<String>) -> Self {
        ProjectionTarget {
            type_name: type_name.into(),
            fields,
        }
    }
}

/// Static description of one annotated repository method.
///
/// Immutable after construction; the compiled template derived from it is
/// cached separately (see [`crate::template::TemplateSlot`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMethod {
    name: String,
    query: String,
    count_query: Option<String>,
    parameters: Vec<ParameterDescriptor>,
    return_shape: ReturnShape,
    projection: Option<ProjectionTarget>,
}

impl QueryMethod {
    /// Build and validate a query-method description.
    ///
    /// Rejects descriptor lists whose indices are not the dense sequence
    /// `0..n`, and rejects two non-special parameters sharing a declared
    /// name. The latter would otherwise resolve by silent last-writer-wins
    /// in the binder, which is never what the template author meant.
    pub fn new(
        name: impl Into<String>,
        query: impl Into<String>,
        count_query: Option<String>,
        parameters: Vec<ParameterDescriptor>,
        return_shape: ReturnShape,
    ) -> QueryResult<Self> {
        let parameters_checked = Self::validate_parameters(parameters)?;
        Ok(QueryMethod {
            name: name.into(),
            query: query.into(),
            count_query,
            parameters: parameters_checked,
            return_shape,
            projection: None,
        })
    }

    /// Attach a declared projection target
    pub fn with_projection(mut self, projection: ProjectionTarget) -> Self {
        self.projection = Some(projection);
        self
    }

    fn validate_parameters(
        parameters: Vec<ParameterDescriptor>,
    ) -> QueryResult<Vec<ParameterDescriptor>> {
        for (position, descriptor) in parameters.iter().enumerate() {
            if descriptor.index != position {
                return Err(QueryError::IndexOutOfOrder {
                    position,
                    declared: descriptor.index,
                });
            }
        }
        for (i, a) in parameters.iter().enumerate() {
            if !a.is_named() {
                continue;
            }
            for b in parameters.iter().skip(i + 1) {
                if b.is_named() && a.name == b.name {
                    return Err(QueryError::DuplicateParameterName {
                        name: a.name.clone().unwrap_or_default(),
                        first: a.index,
                        second: b.index,
                    });
                }
            }
        }
        Ok(parameters)
    }

    /// Method name, used for logging and error attribution
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotated query text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Annotated count-query text, if declared
    pub fn count_query(&self) -> Option<&str> {
        self.count_query.as_deref()
    }

    /// Ordered parameter descriptors
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Declared return shape
    pub fn return_shape(&self) -> ReturnShape {
        self.return_shape
    }

    /// Declared projection target, if any
    pub fn projection(&self) -> Option<&ProjectionTarget> {
        self.projection.as_ref()
    }
}
