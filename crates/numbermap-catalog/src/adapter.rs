//! Metadata source trait for fetching column declarations

use numbermap_core::TypeCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a table in the source database
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Catalog name
    pub database: String,

    /// Schema (owner) name
    pub schema: String,

    /// Table, view or synonym name
    pub table: String,
}

impl TableIdentifier {
    /// Create a new table identifier
    pub fn new(database: impl Into<String>, schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Parse `database.schema.table`
    pub fn parse(fqn: &str) -> Option<Self> {
        let mut parts = fqn.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(database), Some(schema), Some(table), None)
                if !database.is_empty() && !schema.is_empty() && !table.is_empty() =>
            {
                Some(Self::new(database, schema, table))
            }
            _ => None,
        }
    }

    /// Get fully qualified name
    pub fn fqn(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.table)
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// One row of driver column metadata
///
/// `column_size` and `decimal_digits` are reported exactly as the driver
/// returns them, sentinel values included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    pub type_code: TypeCode,
    #[serde(default)]
    pub column_size: i32,
    #[serde(default)]
    pub decimal_digits: i32,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, type_code: TypeCode, column_size: i32, decimal_digits: i32) -> Self {
        Self {
            name: name.into(),
            type_code,
            column_size,
            decimal_digits,
            nullable: true,
        }
    }

    /// NUMERIC column with the given driver precision and scale
    pub fn number(name: impl Into<String>, precision: i32, scale: i32) -> Self {
        Self::new(name, TypeCode::NUMERIC, precision, scale)
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Errors that can occur when fetching metadata
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Trait for sources that can report column metadata
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Get the source name (e.g., "Oracle", "Mock")
    fn name(&self) -> &'static str;

    /// List schema names in a database
    ///
    /// With `include_synonyms`, schemas that only own synonyms are listed too.
    async fn list_schemas(&self, database: &str, include_synonyms: bool) -> Result<Vec<String>, FetchError>;

    /// Fetch column metadata for a table, in column order
    ///
    /// With `include_synonyms`, a synonym resolves to the columns of the
    /// table it points at.
    async fn fetch_columns(
        &self,
        table: &TableIdentifier,
        include_synonyms: bool,
    ) -> Result<Vec<ColumnMetadata>, FetchError>;
}
