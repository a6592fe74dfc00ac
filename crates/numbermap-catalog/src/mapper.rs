//! Table mapping: column metadata in, target schema out

use crate::adapter::{FetchError, MetadataSource, TableIdentifier};
use numbermap_core::ConnectorConfig;
use numbermap_engine::{ColumnMapper, MappedColumn, Resolution, ResolveError, RowEncoder};
use serde::Serialize;

/// Errors that can occur while mapping a table
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Column '{column}' of {table}: {source}")]
    Column {
        table: String,
        column: String,
        source: ResolveError,
    },

    /// Every column was excluded, or the table has none
    #[error("Table not found: {0} has no readable columns")]
    NoColumns(String),
}

/// Column dropped from the mapped schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedColumn {
    pub name: String,
    pub reason: String,
}

/// Target schema of a source table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedTable {
    pub table: TableIdentifier,
    pub columns: Vec<MappedColumn>,
    pub skipped: Vec<SkippedColumn>,
}

impl MappedTable {
    pub fn find_column(&self, name: &str) -> Option<&MappedColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Row encoder over the mapped columns, in column order
    pub fn encoder(&self) -> RowEncoder {
        RowEncoder::new(self.columns.clone())
    }
}

/// Fetch a table's column metadata and map every column
///
/// The first column that fails to resolve fails the whole table. Excluded
/// columns are collected in [`MappedTable::skipped`].
pub async fn map_table(
    source: &dyn MetadataSource,
    table: &TableIdentifier,
    config: &ConnectorConfig,
) -> Result<MappedTable, MapError> {
    let metadata = source.fetch_columns(table, config.synonyms_enabled).await?;
    let mapper = ColumnMapper::new(&config.policy);

    let mut columns = Vec::with_capacity(metadata.len());
    let mut skipped = Vec::new();

    for column in metadata {
        let resolution = mapper
            .map_column(&column.name, column.type_code, column.column_size, column.decimal_digits)
            .map_err(|source| MapError::Column {
                table: table.fqn(),
                column: column.name.clone(),
                source,
            })?;

        match resolution {
            Resolution::Mapped(mapping) => columns.push(MappedColumn::new(column.name, mapping, column.nullable)),
            Resolution::Excluded { reason } => skipped.push(SkippedColumn {
                name: column.name,
                reason,
            }),
        }
    }

    if columns.is_empty() {
        return Err(MapError::NoColumns(table.fqn()));
    }

    tracing::debug!(
        table = %table,
        source = source.name(),
        mapped = columns.len(),
        skipped = skipped.len(),
        "mapped table"
    );

    Ok(MappedTable {
        table: table.clone(),
        columns,
        skipped,
    })
}
