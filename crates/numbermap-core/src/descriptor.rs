//! Normalized NUMBER column declarations
//!
//! Drivers report a NUMBER column as a `(precision, scale)` pair where a
//! precision of 0 means "not declared", a negative scale shifts digits to the
//! left of the decimal point, and the driver constant [`UNDEFINED_SCALE`]
//! means "scale not declared". [`TypeDescriptor`] folds these encodings into
//! a canonical form once, at construction.

use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Maximum decimal precision supported by the target engine
pub const MAX_PRECISION: u32 = 38;

/// Scale reported by the driver for a NUMBER declared without a scale
pub const UNDEFINED_SCALE: i32 = -127;

/// Driver column type code (`java.sql.Types` numbering, as reported in
/// column metadata)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TypeCode(pub i32);

impl TypeCode {
    pub const LONGNVARCHAR: TypeCode = TypeCode(-16);
    pub const NCHAR: TypeCode = TypeCode(-15);
    pub const NVARCHAR: TypeCode = TypeCode(-9);
    pub const LONGVARCHAR: TypeCode = TypeCode(-1);
    pub const CHAR: TypeCode = TypeCode(1);
    pub const NUMERIC: TypeCode = TypeCode(2);
    pub const DECIMAL: TypeCode = TypeCode(3);
    pub const INTEGER: TypeCode = TypeCode(4);
    pub const DOUBLE: TypeCode = TypeCode(8);
    pub const VARCHAR: TypeCode = TypeCode(12);
    pub const DATE: TypeCode = TypeCode(91);
    pub const TIMESTAMP: TypeCode = TypeCode(93);
    pub const OTHER: TypeCode = TypeCode(1111);
    pub const BLOB: TypeCode = TypeCode(2004);
    pub const CLOB: TypeCode = TypeCode(2005);

    /// NUMERIC and DECIMAL columns, both handled by the number resolver
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::NUMERIC | Self::DECIMAL)
    }

    /// Character columns, read as unbounded text
    pub fn is_character(self) -> bool {
        matches!(
            self,
            Self::CHAR | Self::VARCHAR | Self::LONGVARCHAR | Self::NCHAR | Self::NVARCHAR | Self::LONGNVARCHAR
        )
    }

    /// Human readable name used in diagnostics
    pub fn name(self) -> String {
        let name = match self {
            Self::LONGNVARCHAR => "LONGNVARCHAR",
            Self::NCHAR => "NCHAR",
            Self::NVARCHAR => "NVARCHAR",
            Self::LONGVARCHAR => "LONGVARCHAR",
            Self::CHAR => "CHAR",
            Self::NUMERIC => "NUMERIC",
            Self::DECIMAL => "DECIMAL",
            Self::INTEGER => "INTEGER",
            Self::DOUBLE => "DOUBLE",
            Self::VARCHAR => "VARCHAR",
            Self::DATE => "DATE",
            Self::TIMESTAMP => "TIMESTAMP",
            Self::OTHER => "OTHER",
            Self::BLOB => "BLOB",
            Self::CLOB => "CLOB",
            TypeCode(code) => return format!("TYPE({})", code),
        };
        name.to_string()
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors raised while building a descriptor from raw driver metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("Negative precision {precision} reported for {type_code} column")]
    NegativePrecision { type_code: TypeCode, precision: i32 },
}

/// Canonical `(precision, scale)` declaration of a column
///
/// Equality and hashing consider only the normalized precision and scale, so
/// descriptors can key the explicit override tables of a
/// [`Policy`](crate::Policy) regardless of the column's type code.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TypeDescriptor {
    type_code: TypeCode,
    precision: u32,
    scale: Option<u32>,
}

impl TypeDescriptor {
    /// Build a descriptor from a declared precision and an optional scale
    ///
    /// `None` is an undefined scale. A negative scale is folded into the
    /// precision: `(4, -10)` becomes `(14, 0)`.
    pub fn new(type_code: TypeCode, precision: u32, scale: Option<i32>) -> Self {
        let (precision, scale) = match scale {
            None => (precision, None),
            Some(scale) if scale < 0 => (precision.saturating_add(scale.unsigned_abs()), Some(0)),
            Some(scale) => (precision, Some(scale.unsigned_abs())),
        };

        Self {
            type_code,
            precision,
            scale,
        }
    }

    /// Shorthand for a NUMERIC column descriptor
    pub fn numeric(precision: u32, scale: Option<i32>) -> Self {
        Self::new(TypeCode::NUMERIC, precision, scale)
    }

    /// Build a descriptor from the raw driver triple
    ///
    /// The driver reports an undefined scale as [`UNDEFINED_SCALE`]; that
    /// value is translated to `None` here and never leaks further.
    pub fn from_driver(type_code: TypeCode, precision: i32, scale: i32) -> Result<Self, DescriptorError> {
        if precision < 0 {
            return Err(DescriptorError::NegativePrecision { type_code, precision });
        }
        let scale = (scale != UNDEFINED_SCALE).then_some(scale);
        Ok(Self::new(type_code, precision.unsigned_abs(), scale))
    }

    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    /// Normalized precision, 0 when undefined
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Normalized scale, `None` when undefined
    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    pub fn is_precision_undefined(&self) -> bool {
        self.precision == 0
    }

    pub fn is_precision_limit_exceeded(&self) -> bool {
        !self.is_precision_undefined() && self.precision > MAX_PRECISION
    }

    pub fn is_scale_undefined(&self) -> bool {
        self.scale.is_none()
    }

    pub fn is_scale_limit_exceeded(&self) -> bool {
        self.scale.is_some_and(|scale| scale > MAX_PRECISION)
    }

    /// Either precision or scale exceeds [`MAX_PRECISION`]
    pub fn is_type_limit_exceeded(&self) -> bool {
        self.is_precision_limit_exceeded() || self.is_scale_limit_exceeded()
    }

    /// Precision or scale is undefined, or the type exceeds limits
    pub fn needs_rounding(&self) -> bool {
        self.is_precision_undefined() || self.is_scale_undefined() || self.is_type_limit_exceeded()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.precision == other.precision && self.scale == other.scale
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.precision.hash(state);
        self.scale.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = if self.is_precision_undefined() {
            "undefined".to_string()
        } else {
            self.precision.to_string()
        };
        match self.scale {
            Some(scale) => write!(f, "{}(precision={}, scale={})", self.type_code, precision, scale),
            None => write!(f, "{}(precision={}, scale=undefined)", self.type_code, precision),
        }
    }
}
