//! Column mapping for every source type code
//!
//! NUMERIC and DECIMAL columns go through the [`Resolver`]. Character columns
//! are read as text. Anything else follows the policy's unsupported-type
//! strategy.

use crate::converter::Converter;
use crate::resolver::{ColumnMapping, Resolution, ResolveError, Resolver};
use numbermap_core::{HandlingStrategy, Policy, TypeCode, TypeDescriptor};

/// Maps raw driver column metadata to a [`Resolution`]
#[derive(Debug, Clone, Copy)]
pub struct ColumnMapper<'a> {
    resolver: Resolver<'a>,
}

impl<'a> ColumnMapper<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self {
            resolver: Resolver::new(policy),
        }
    }

    /// Map one column from its driver triple
    ///
    /// `precision` and `scale` are the raw driver values: the column size and
    /// decimal digits reported in column metadata.
    pub fn map_column(
        &self,
        column: &str,
        type_code: TypeCode,
        precision: i32,
        scale: i32,
    ) -> Result<Resolution, ResolveError> {
        if type_code.is_numeric() {
            let td = TypeDescriptor::from_driver(type_code, precision, scale)?;
            let resolution = self.resolver.resolve(&td)?;
            if let Resolution::Excluded { reason } = &resolution {
                tracing::info!(column, %reason, "skipping column");
            } else if resolution.mapping().is_some_and(|m| m.converter == Converter::DecimalText) {
                tracing::info!(column, descriptor = %td, "reading NUMBER column as text");
            }
            return Ok(resolution);
        }

        if type_code.is_character() {
            return Ok(Resolution::Mapped(ColumnMapping {
                converter: Converter::Text,
                stages: Vec::new(),
            }));
        }

        self.unsupported(column, type_code)
    }

    fn unsupported(&self, column: &str, type_code: TypeCode) -> Result<Resolution, ResolveError> {
        let strategy = self.resolver.policy().unsupported_type_strategy();
        tracing::warn!(column, type_code = %type_code, strategy = %strategy, "unsupported column type");

        match strategy {
            HandlingStrategy::Varchar => Ok(Resolution::Mapped(ColumnMapping {
                converter: Converter::Text,
                stages: vec!["unsupported-type"],
            })),
            HandlingStrategy::Ignore => {
                tracing::info!(column, type_code = %type_code, "skipping column");
                Ok(Resolution::Excluded {
                    reason: format!("unsupported type {}", type_code),
                })
            }
            // rejected by the policy setter, treated as FAIL if it ever gets here
            HandlingStrategy::Fail | HandlingStrategy::Round => Err(ResolveError::Unsupported {
                column: column.to_string(),
                type_name: type_code.name(),
            }),
        }
    }
}
