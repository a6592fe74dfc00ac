//! numbermap engine - NUMBER resolution and value conversion
//!
//! This crate turns column declarations into target types:
//! - Resolver pipeline over the numeric policy
//! - Rounding-aware value converters
//! - Column mapping with the unsupported-type fallback
//! - Row encoding with typed nulls

pub mod converter;
pub mod resolver;
pub mod column;
pub mod row;

pub use converter::{format_unscaled, ConversionError, Converter, RawValue, Value};
pub use resolver::{ColumnMapping, Resolution, ResolveError, Resolver};
pub use column::ColumnMapper;
pub use row::{Cell, MappedColumn, RowEncoder, RowError};
