//! numbermap core
//!
//! Domain model for mapping variadic source NUMBER columns onto the fixed set
//! of target representations: normalized type descriptors, the target type
//! vocabulary, the numeric policy and connector configuration loading.

pub mod descriptor;
pub mod types;
pub mod policy;
pub mod config;

pub use descriptor::{TypeDescriptor, TypeCode, DescriptorError, MAX_PRECISION, UNDEFINED_SCALE};
pub use types::{NumericKind, TargetType, DecimalType, RoundingMode, HandlingStrategy, ParseTokenError};
pub use policy::{Policy, ConfigError, MAX_DOUBLE_SCALE};
pub use config::ConnectorConfig;
