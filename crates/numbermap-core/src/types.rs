//! Target type vocabulary
//!
//! Configuration tokens (`DECIMAL`, `HALF_EVEN`, `ROUND`, ...) and the
//! concrete types a column resolves to. Tokens parse case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A configuration token that is not one of the allowed values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{token}' is not a valid {what}, allowed values: {allowed}")]
pub struct ParseTokenError {
    pub what: &'static str,
    pub token: String,
    pub allowed: String,
}

fn parse_token<T: Copy>(what: &'static str, token: &str, variants: &[(&str, T)]) -> Result<T, ParseTokenError> {
    let upper = token.trim().to_ascii_uppercase();
    variants
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, value)| *value)
        .ok_or_else(|| ParseTokenError {
            what,
            token: token.to_string(),
            allowed: variants.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", "),
        })
}

/// Representation a NUMBER column can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NumericKind {
    Decimal,
    Double,
    Integer,
    Varchar,
}

impl NumericKind {
    const VARIANTS: [(&'static str, NumericKind); 4] = [
        ("DECIMAL", Self::Decimal),
        ("DOUBLE", Self::Double),
        ("INTEGER", Self::Integer),
        ("VARCHAR", Self::Varchar),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decimal => "DECIMAL",
            Self::Double => "DOUBLE",
            Self::Integer => "INTEGER",
            Self::Varchar => "VARCHAR",
        }
    }
}

impl FromStr for NumericKind {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token("numeric type", s, &Self::VARIANTS)
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy for a column whose type cannot be represented as declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HandlingStrategy {
    /// Keep the type and round values into it
    Round,
    /// Read the column as unbounded text
    Varchar,
    /// Drop the column from the table schema
    Ignore,
    /// Fail the query
    Fail,
}

impl HandlingStrategy {
    const VARIANTS: [(&'static str, HandlingStrategy); 4] = [
        ("ROUND", Self::Round),
        ("VARCHAR", Self::Varchar),
        ("IGNORE", Self::Ignore),
        ("FAIL", Self::Fail),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Round => "ROUND",
            Self::Varchar => "VARCHAR",
            Self::Ignore => "IGNORE",
            Self::Fail => "FAIL",
        }
    }
}

impl FromStr for HandlingStrategy {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token("handling strategy", s, &Self::VARIANTS)
    }
}

impl fmt::Display for HandlingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounding applied when a value is rescaled to fewer fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingMode {
    /// Toward positive infinity
    Ceiling,
    /// Toward zero
    Down,
    /// Toward negative infinity
    Floor,
    /// Nearest neighbor, ties to the even neighbor
    HalfEven,
    /// Nearest neighbor, ties toward zero
    HalfDown,
    /// Nearest neighbor, ties away from zero
    HalfUp,
    /// Away from zero
    Up,
    /// Rounding is not allowed; discarding a non-zero digit is an error
    Unnecessary,
}

impl RoundingMode {
    const VARIANTS: [(&'static str, RoundingMode); 8] = [
        ("CEILING", Self::Ceiling),
        ("DOWN", Self::Down),
        ("FLOOR", Self::Floor),
        ("HALF_EVEN", Self::HalfEven),
        ("HALF_DOWN", Self::HalfDown),
        ("HALF_UP", Self::HalfUp),
        ("UP", Self::Up),
        ("UNNECESSARY", Self::Unnecessary),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ceiling => "CEILING",
            Self::Down => "DOWN",
            Self::Floor => "FLOOR",
            Self::HalfEven => "HALF_EVEN",
            Self::HalfDown => "HALF_DOWN",
            Self::HalfUp => "HALF_UP",
            Self::Up => "UP",
            Self::Unnecessary => "UNNECESSARY",
        }
    }

    /// Every mode, in declaration order
    pub fn all() -> impl Iterator<Item = RoundingMode> {
        Self::VARIANTS.into_iter().map(|(_, mode)| mode)
    }
}

impl FromStr for RoundingMode {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token("rounding mode", s, &Self::VARIANTS)
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded decimal type of the target engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecimalType {
    pub precision: u32,
    pub scale: u32,
}

impl DecimalType {
    pub fn new(precision: u32, scale: u32) -> Self {
        Self { precision, scale }
    }

    /// Precision within `1..=38` and scale no larger than precision
    pub fn is_valid(&self) -> bool {
        (1..=crate::MAX_PRECISION).contains(&self.precision) && self.scale <= self.precision
    }
}

impl fmt::Display for DecimalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DECIMAL({}, {})", self.precision, self.scale)
    }
}

/// Concrete column type after resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TargetType {
    /// Fixed-point decimal, at most 38 digits
    Decimal(DecimalType),

    /// 64-bit signed integer
    BigInt,

    /// Double-precision float
    Double,

    /// Unbounded text
    Varchar,
}

impl TargetType {
    pub fn decimal(precision: u32, scale: u32) -> Self {
        Self::Decimal(DecimalType::new(precision, scale))
    }

    /// The configuration kind this type belongs to
    pub fn kind(&self) -> NumericKind {
        match self {
            Self::Decimal(_) => NumericKind::Decimal,
            Self::BigInt => NumericKind::Integer,
            Self::Double => NumericKind::Double,
            Self::Varchar => NumericKind::Varchar,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal(decimal) => write!(f, "{}", decimal),
            Self::BigInt => write!(f, "BIGINT"),
            Self::Double => write!(f, "DOUBLE"),
            Self::Varchar => write!(f, "VARCHAR"),
        }
    }
}
