//! # Result Adapter
//!
//! Converts the store's raw tabular result into the value the caller's
//! declared return shape demands.
//!
//! The one hard rule: a raw-shaped method receives the [`TabularResult`]
//! untouched, without the processor ever seeing it. Every other shape goes
//! through the [`ResultProcessor`] collaborator, which owns the mapping from
//! raw rows to domain values and projections.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dispatch::RawExecution;
use crate::error::{ConversionError, QueryResult};
use crate::metadata::{ProjectionTarget, ReturnShape};
use crate::session::TabularResult;
use crate::value::Value;

/// Adapted return value, matching the method's declared shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnValue {
    /// The store's native result, unconverted
    Raw(TabularResult),
    /// At most one converted object
    Single(Option<Value>),
    /// All converted objects
    Collection(Vec<Value>),
    /// A page of converted objects and the count-query total, when known
    Page {
        items: Vec<Value>,
        total: Option<i64>,
    },
    /// A single scalar cell
    Scalar(Value),
}

/// Result-processing collaborator: maps raw rows onto domain or projection
/// values using the store's metadata model. Converted values belong to the
/// caller; nothing is cached here.
pub trait ResultProcessor: Send + Sync {
    /// Convert every row of a result, honoring an optional projection target
    fn convert(
        &self,
        result: &TabularResult,
        projection: Option<&ProjectionTarget>,
    ) -> Result<Vec<Value>, ConversionError>;
}

/// Store metadata model: the projection types the mapping context knows.
///
/// Registration happens once at startup; lookups are concurrent reads.
#[derive(Default)]
pub struct StoreMetadata {
    projection_types: RwLock<BTreeMap<String, Vec<String>>>,
}

impl StoreMetadata {
    /// Create an empty metadata model
    pub fn new() -> Self {
        StoreMetadata::default()
    }

    /// Register a projection type and the fields it exposes
    pub fn register_projection(&self, type_name: &str, fields: Vec<String>) {
        self.projection_types
            .write()
            .insert(type_name.to_string(), fields);
    }

    /// Whether a projection type is known
    pub fn knows_projection(&self, type_name: &str) -> bool {
        self.projection_types.read().contains_key(type_name)
    }
}

/// Default metadata-driven converter.
///
/// One-column rows unwrap to the bare cell value; wider rows become maps
/// keyed by column name. A projection target narrows the row map to exactly
/// its declared fields and fails on a missing one.
pub struct MetadataResultProcessor {
    metadata: Arc<StoreMetadata>,
}

impl MetadataResultProcessor {
    /// Create a processor over a shared metadata model
    pub fn new(metadata: Arc<StoreMetadata>) -> Self {
        MetadataResultProcessor { metadata }
    }

    fn convert_row(
        &self,
        columns: &[String],
        row: &[Value],
        projection: Option<&ProjectionTarget>,
    ) -> Result<Value, ConversionError> {
        if row.len() != columns.len() {
            return Err(ConversionError::RowArity {
                expected: columns.len(),
                actual: row.len(),
            });
        }

        if let Some(target) = projection {
            if !self.metadata.knows_projection(&target.type_name) {
                return Err(ConversionError::UnknownTarget(target.type_name.clone()));
            }
            let mut projected = BTreeMap::new();
            for field in &target.fields {
                let position = columns.iter().position(|c| c == field).ok_or_else(|| {
                    ConversionError::MissingField {
                        target: target.type_name.clone(),
                        field: field.clone(),
                    }
                })?;
                projected.insert(field.clone(), row[position].clone());
            }
            return Ok(Value::Map(projected));
        }

        match row {
            [cell] => Ok(cell.clone()),
            cells => Ok(Value::Map(
                columns.iter().cloned().zip(cells.iter().cloned()).collect(),
            )),
        }
    }
}

impl ResultProcessor for MetadataResultProcessor {
    fn convert(
        &self,
        result: &TabularResult,
        projection: Option<&ProjectionTarget>,
    ) -> Result<Vec<Value>, ConversionError> {
        result
            .rows
            .iter()
            .map(|row| self.convert_row(&result.columns, row, projection))
            .collect()
    }
}

/// Adapt a raw execution to the declared return shape.
///
/// `projection` is the effective target: the call-time dynamic projection if
/// one was supplied, otherwise the method's declared target.
pub fn adapt(
    execution: RawExecution,
    shape: ReturnShape,
    projection: Option<&ProjectionTarget>,
    processor: &dyn ResultProcessor,
) -> QueryResult<ReturnValue> {
    let RawExecution { result, total } = execution;

    match shape {
        // Declared return type is the store's own result type: hand it over
        // with no conversion applied.
        ReturnShape::Raw => Ok(ReturnValue::Raw(result)),
        ReturnShape::Single => {
            let mut converted = processor.convert(&result, projection)?;
            match converted.len() {
                0 => Ok(ReturnValue::Single(None)),
                1 => Ok(ReturnValue::Single(converted.pop())),
                n => Err(ConversionError::TooManyRows(n).into()),
            }
        }
        ReturnShape::Collection => Ok(ReturnValue::Collection(
            processor.convert(&result, projection)?,
        )),
        ReturnShape::Paged => Ok(ReturnValue::Page {
            items: processor.convert(&result, projection)?,
            total,
        }),
        ReturnShape::Scalar => {
            let scalar = result.scalar().cloned().ok_or(ConversionError::NotScalar {
                rows: result.len(),
                columns: result.columns.len(),
            })?;
            Ok(ReturnValue::Scalar(scalar))
        }
    }
}
