//! Test fixtures for metadata source integration tests
//!
//! Column metadata as a source database driver reports it, including the
//! undefined-scale sentinel and negative scales.

use numbermap_catalog::{ColumnMetadata, MockSource, MockSourceBuilder, TableIdentifier};
use numbermap_core::{TypeCode, UNDEFINED_SCALE};

pub const DATABASE: &str = "orcl";

pub fn orders_table() -> TableIdentifier {
    TableIdentifier::new(DATABASE, "sales", "orders")
}

pub fn orders_synonym() -> TableIdentifier {
    TableIdentifier::new(DATABASE, "public", "orders")
}

pub fn measurements_table() -> TableIdentifier {
    TableIdentifier::new(DATABASE, "lab", "measurements")
}

/// A typical orders table
///
/// - Declared integer key (`NUMBER(10)`)
/// - Money column (`NUMBER(12, 2)`)
/// - Unconstrained quantity (`NUMBER`)
/// - Text and a large object
pub fn orders_columns() -> Vec<ColumnMetadata> {
    vec![
        ColumnMetadata::number("order_id", 10, 0).not_null(),
        ColumnMetadata::number("total", 12, 2).not_null(),
        ColumnMetadata::number("quantity", 0, UNDEFINED_SCALE),
        ColumnMetadata::new("status", TypeCode::VARCHAR, 20, 0),
        ColumnMetadata::new("notes", TypeCode::CLOB, 0, 0),
    ]
}

/// Scientific data with edge-case declarations
///
/// - `NUMBER(*, -3)` style negative scale
/// - Precision above the 38-digit limit
/// - Scale above the limit
/// - `FLOAT`-style undefined scale with a precision
pub fn measurements_columns() -> Vec<ColumnMetadata> {
    vec![
        ColumnMetadata::number("reading_id", 18, 0).not_null(),
        ColumnMetadata::number("rounded_count", 5, -3),
        ColumnMetadata::number("huge", 45, 2),
        ColumnMetadata::number("tiny", 10, 50),
        ColumnMetadata::number("ratio", 20, UNDEFINED_SCALE),
        ColumnMetadata::new("taken_at", TypeCode::TIMESTAMP, 0, 0),
    ]
}

/// Mock source with both tables and a public synonym for orders
pub fn source() -> MockSource {
    MockSourceBuilder::new()
        .with_table(DATABASE, "sales", "orders", orders_columns())
        .with_table(DATABASE, "lab", "measurements", measurements_columns())
        .with_synonym(DATABASE, "public", "orders", orders_table())
        .build()
}

/// Same tables, described as JSON the way `numbermap map --metadata` reads them
pub fn orders_json() -> &'static str {
    r#"{
        "orcl.sales.orders": [
            {"name": "order_id", "type_code": 2, "column_size": 10, "decimal_digits": 0, "nullable": false},
            {"name": "total", "type_code": 2, "column_size": 12, "decimal_digits": 2, "nullable": false},
            {"name": "quantity", "type_code": 2, "column_size": 0, "decimal_digits": -127},
            {"name": "status", "type_code": 12, "column_size": 20},
            {"name": "notes", "type_code": 2005}
        ]
    }"#
}
