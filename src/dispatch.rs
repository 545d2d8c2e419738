//! # Execution Dispatcher
//!
//! Chooses what to run for a given return shape and hands the store's raw
//! result back for adaptation. Store failures propagate verbatim; there is
//! no retry here and no timeout of our own — blocking behavior belongs to
//! the session.

use crate::assembler::QueryDescriptor;
use crate::error::{ConversionError, QueryResult};
use crate::metadata::ReturnShape;
use crate::session::{Session, TabularResult};

/// Dispatcher output: the primary query's raw result, plus the count-query
/// total when a paged dispatch ran one.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExecution {
    /// Primary query result, untouched
    pub result: TabularResult,

    /// Count-query scalar, populated only for paged dispatch with a
    /// declared count query
    pub total: Option<i64>,
}

/// Shape-directed query execution against a [`Session`].
pub struct ExecutionDispatcher<'a> {
    session: &'a dyn Session,
}

impl<'a> ExecutionDispatcher<'a> {
    /// Create a dispatcher over a session
    pub fn new(session: &'a dyn Session) -> Self {
        ExecutionDispatcher { session }
    }

    /// Execute the descriptor according to the declared return shape.
    ///
    /// Raw, single, collection, and scalar shapes run the primary query
    /// only. Paged additionally runs the count query when one is declared
    /// and reads its single scalar cell as the page total.
    pub fn dispatch(
        &self,
        method_name: &str,
        descriptor: &QueryDescriptor,
        shape: ReturnShape,
    ) -> QueryResult<RawExecution> {
        let result = self
            .session
            .run(descriptor.query(), descriptor.parameters())?;

        let total = match (shape, descriptor.count_query()) {
            (ReturnShape::Paged, Some(count_query)) => {
                let count_result = self.session.run(count_query, descriptor.parameters())?;
                Some(read_count(&count_result)?)
            }
            _ => None,
        };

        tracing::debug!(method = %method_name, shape = ?shape, "query dispatched");
        Ok(RawExecution { result, total })
    }
}

/// Read the single scalar cell of a count-query result
fn read_count(result: &TabularResult) -> Result<i64, ConversionError> {
    result
        .scalar()
        .and_then(crate::value::Value::as_int)
        .ok_or(ConversionError::NotScalar {
            rows: result.len(),
            columns: result.columns.len(),
        })
}
