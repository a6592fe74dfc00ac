//! Row encoding
//!
//! Applies each column's bound converter to the cells of a row. Null cells
//! never reach a converter; they become a null of the column's target type.

use crate::converter::{ConversionError, RawValue, Value};
use crate::resolver::ColumnMapping;
use numbermap_core::TargetType;
use serde::Serialize;

/// Row encoding errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("Row has {actual} cells but the table has {expected} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("Column '{column}': {source}")]
    Conversion {
        column: String,
        source: ConversionError,
    },

    #[error("Row {row}: {source}")]
    AtRow { row: usize, source: Box<RowError> },
}

/// A column that survived resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedColumn {
    pub name: String,
    pub mapping: ColumnMapping,
    pub nullable: bool,
}

impl MappedColumn {
    pub fn new(name: impl Into<String>, mapping: ColumnMapping, nullable: bool) -> Self {
        Self {
            name: name.into(),
            mapping,
            nullable,
        }
    }

    pub fn target_type(&self) -> TargetType {
        self.mapping.target_type()
    }
}

/// Encoded cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Null of the column's target type
    Null(TargetType),
    Value(Value),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }
}

/// Encodes rows against a fixed set of mapped columns
#[derive(Debug, Clone)]
pub struct RowEncoder {
    columns: Vec<MappedColumn>,
}

impl RowEncoder {
    pub fn new(columns: Vec<MappedColumn>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[MappedColumn] {
        &self.columns
    }

    /// Encode a single row, one cell per column in column order
    pub fn encode_row(&self, row: &[Option<RawValue>]) -> Result<Vec<Cell>, RowError> {
        if row.len() != self.columns.len() {
            return Err(RowError::ColumnCountMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }

        self.columns
            .iter()
            .zip(row)
            .map(|(column, cell)| match cell {
                None => Ok(Cell::Null(column.target_type())),
                Some(raw) => column
                    .mapping
                    .converter
                    .convert(raw)
                    .map(Cell::Value)
                    .map_err(|source| RowError::Conversion {
                        column: column.name.clone(),
                        source,
                    }),
            })
            .collect()
    }

    /// Encode rows in order, stopping at the first failure
    pub fn encode_rows<R>(&self, rows: &[R]) -> Result<Vec<Vec<Cell>>, RowError>
    where
        R: AsRef<[Option<RawValue>]>,
    {
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                self.encode_row(row.as_ref()).map_err(|source| RowError::AtRow {
                    row: index,
                    source: Box::new(source),
                })
            })
            .collect()
    }
}
