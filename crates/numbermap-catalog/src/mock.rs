//! Mock metadata source for testing
//!
//! This source returns predefined column metadata without connecting to any
//! database. Synonyms are stored separately and only followed when the caller
//! asks for them, the same way a real source only resolves synonyms when
//! `synonyms.enabled` is set.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use numbermap_catalog::{MockSource, MetadataSource, TableIdentifier, ColumnMetadata};
//!
//! let source = MockSource::new();
//! let table = TableIdentifier::new("orcl", "sales", "orders");
//! source.add_table(table.clone(), vec![ColumnMetadata::number("id", 10, 0)]).await;
//!
//! let columns = source.fetch_columns(&table, false).await?;
//! ```

use crate::adapter::{ColumnMetadata, FetchError, MetadataSource, TableIdentifier};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock metadata source for testing
///
/// Tables and synonyms live behind shared locks, so clones see the same
/// state.
#[derive(Clone)]
pub struct MockSource {
    /// Column metadata by table FQN
    tables: Arc<RwLock<HashMap<String, Vec<ColumnMetadata>>>>,

    /// Synonym FQN to the table it names
    synonyms: Arc<RwLock<HashMap<String, TableIdentifier>>>,

    /// Errors to return for specific tables
    errors: Arc<RwLock<HashMap<String, FetchError>>>,
}

impl MockSource {
    /// Create a new mock source with no tables
    pub fn new() -> Self {
        MockSourceBuilder::new().build()
    }

    /// Add column metadata for a table
    pub async fn add_table(&self, table: TableIdentifier, columns: Vec<ColumnMetadata>) {
        self.tables.write().await.insert(table.fqn(), columns);
    }

    /// Add a synonym that names another table
    pub async fn add_synonym(&self, synonym: TableIdentifier, target: TableIdentifier) {
        self.synonyms.write().await.insert(synonym.fqn(), target);
    }

    /// Configure an error to be returned for a specific table
    pub async fn add_error_for_table(&self, table: TableIdentifier, error: FetchError) {
        self.errors.write().await.insert(table.fqn(), error);
    }

    /// Get the number of tables stored in the source
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MetadataSource for MockSource {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn list_schemas(&self, database: &str, include_synonyms: bool) -> Result<Vec<String>, FetchError> {
        let prefix = format!("{}.", database);
        let schema_of = |fqn: &str| -> Option<String> {
            fqn.strip_prefix(&prefix)
                .and_then(|rest| rest.split('.').next())
                .map(str::to_string)
        };

        let mut schemas: BTreeSet<String> = self.tables.read().await.keys().filter_map(|fqn| schema_of(fqn)).collect();
        if include_synonyms {
            schemas.extend(self.synonyms.read().await.keys().filter_map(|fqn| schema_of(fqn)));
        }
        schemas.retain(|schema| !schema.eq_ignore_ascii_case("information_schema"));

        Ok(schemas.into_iter().collect())
    }

    async fn fetch_columns(
        &self,
        table: &TableIdentifier,
        include_synonyms: bool,
    ) -> Result<Vec<ColumnMetadata>, FetchError> {
        if let Some(error) = self.errors.read().await.get(&table.fqn()) {
            return Err(error.clone());
        }

        let tables = self.tables.read().await;
        if let Some(columns) = tables.get(&table.fqn()) {
            return Ok(columns.clone());
        }

        if include_synonyms {
            if let Some(target) = self.synonyms.read().await.get(&table.fqn()) {
                tracing::debug!(synonym = %table, target = %target, "resolved synonym");
                return tables
                    .get(&target.fqn())
                    .cloned()
                    .ok_or_else(|| FetchError::TableNotFound(target.fqn()));
            }
        }

        Err(FetchError::TableNotFound(table.fqn()))
    }
}

/// Builder for creating MockSource with multiple tables
///
/// ```rust,ignore
/// let source = MockSourceBuilder::new()
///     .with_table("orcl", "sales", "orders", vec![ColumnMetadata::number("id", 10, 0)])
///     .with_synonym("orcl", "public", "orders", TableIdentifier::new("orcl", "sales", "orders"))
///     .build();
/// ```
pub struct MockSourceBuilder {
    tables: HashMap<String, Vec<ColumnMetadata>>,
    synonyms: HashMap<String, TableIdentifier>,
    errors: HashMap<String, FetchError>,
}

impl MockSourceBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            synonyms: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    /// Add column metadata for a table
    pub fn with_table(mut self, database: &str, schema: &str, table: &str, columns: Vec<ColumnMetadata>) -> Self {
        self.tables.insert(TableIdentifier::new(database, schema, table).fqn(), columns);
        self
    }

    /// Add a synonym for a table
    pub fn with_synonym(mut self, database: &str, schema: &str, synonym: &str, target: TableIdentifier) -> Self {
        self.synonyms
            .insert(TableIdentifier::new(database, schema, synonym).fqn(), target);
        self
    }

    /// Add an error for a specific table
    pub fn with_error(mut self, table: TableIdentifier, error: FetchError) -> Self {
        self.errors.insert(table.fqn(), error);
        self
    }

    /// Build the MockSource
    pub fn build(self) -> MockSource {
        MockSource {
            tables: Arc::new(RwLock::new(self.tables)),
            synonyms: Arc::new(RwLock::new(self.synonyms)),
            errors: Arc::new(RwLock::new(self.errors)),
        }
    }
}

impl Default for MockSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
