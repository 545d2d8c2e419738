//! # graphrepo
//!
//! Repository-query machinery for a graph-database object mapper: given an
//! annotated query template and the runtime arguments of a method call,
//! resolve a concrete parameter-bound query, execute it against a graph
//! store, and shape the raw result to what the method signature demands.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! call arguments
//!     ↓
//! [binder]     → ParameterMap (index keys always, name keys when bindable,
//!                entities dereferenced to persisted identities)
//!     ↓
//! [template]   → QueryTemplate (compiled once per method, cached)
//!     ↓
//! [assembler]  → QueryDescriptor (placeholders verified against the map)
//!     ↓
//! [dispatch]   → raw TabularResult (+ count-query total for paged shapes)
//!     ↓
//! [adapter]    → ReturnValue (raw passthrough, single, collection, page,
//!                scalar; optional projection)
//! ```
//!
//! The graph store itself, annotation scanning, and network transport are
//! external collaborators behind the [`Session`], [`ResultProcessor`], and
//! metadata seams.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use graphrepo::{
//!     MemorySession, MetadataResultProcessor, ParameterDescriptor, QueryMethod,
//!     RepositoryQuery, ReturnShape, StoreMetadata, Value,
//! };
//!
//! let session = Arc::new(MemorySession::new());
//! let processor = Arc::new(MetadataResultProcessor::new(Arc::new(StoreMetadata::new())));
//!
//! let method = QueryMethod::new(
//!     "findByName",
//!     "MATCH (n:Person) WHERE n.name = {name} RETURN n",
//!     None,
//!     vec![ParameterDescriptor::named(0, "name")],
//!     ReturnShape::Collection,
//! )?;
//!
//! let query = RepositoryQuery::new(method, session, processor);
//! let people = query.execute(&[Value::from("alice")])?;
//! ```

pub mod adapter;
pub mod assembler;
pub mod binder;
pub mod dispatch;
pub mod error;
pub mod metadata;
pub mod query;
pub mod session;
pub mod template;
pub mod value;

pub use crate::adapter::{
    MetadataResultProcessor, ResultProcessor, ReturnValue, StoreMetadata,
};
pub use crate::assembler::{assemble, QueryDescriptor};
pub use crate::binder::{bind, ParameterMap};
pub use crate::dispatch::{ExecutionDispatcher, RawExecution};
pub use crate::error::{ConversionError, QueryError, QueryResult};
pub use crate::metadata::{ParameterDescriptor, ProjectionTarget, QueryMethod, ReturnShape};
pub use crate::query::{QueryRegistry, RepositoryQuery};
pub use crate::session::{MemorySession, Session, StoreError, TabularResult};
pub use crate::template::{QueryTemplate, TemplateSlot};
pub use crate::value::{EntityRef, Value};
