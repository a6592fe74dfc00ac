//! Column metadata sources for NUMBER mapping
//!
//! This crate sits at the metadata-fetch boundary: it fetches a table's
//! column declarations from a [`MetadataSource`] and maps them into a target
//! schema with the numeric policy.
//!
//! ## Example
//!
//! ```rust,ignore
//! use numbermap_catalog::{map_table, MockSource, TableIdentifier};
//! use numbermap_core::ConnectorConfig;
//!
//! let source = MockSource::new();
//! let table = TableIdentifier::new("orcl", "sales", "orders");
//! let mapped = map_table(&source, &table, &ConnectorConfig::default()).await?;
//! ```

pub mod adapter;
pub mod mock;
pub mod mapper;

pub use adapter::{ColumnMetadata, FetchError, MetadataSource, TableIdentifier};
pub use mock::{MockSource, MockSourceBuilder};
pub use mapper::{map_table, MapError, MappedTable, SkippedColumn};
