//! Value converters
//!
//! A [`Converter`] is bound to its target type once, at resolution time, and
//! then applied to every non-null cell of the column. Converters are plain
//! data: they hold no per-row state and can be shared across threads.

use bigdecimal::{BigDecimal, ToPrimitive};
use numbermap_core::{DecimalType, RoundingMode, TargetType};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Errors raised while converting a single cell
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("Rounding necessary: {value} does not fit scale {scale} without rounding")]
    RoundingNecessary { value: String, scale: u32 },

    #[error("Value {value} overflows {target}")]
    Overflow { value: String, target: String },

    #[error("Invalid numeric value '{0}'")]
    InvalidNumber(String),
}

/// A cell as read from the source database
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Exact decimal value
    Number(BigDecimal),

    /// Character data, or a number rendered as text by the driver
    Text(String),
}

impl RawValue {
    /// Parse a decimal literal such as `-12.50` or `1E+5`
    pub fn number(literal: &str) -> Result<Self, ConversionError> {
        BigDecimal::from_str(literal.trim())
            .map(Self::Number)
            .map_err(|_| ConversionError::InvalidNumber(literal.to_string()))
    }

    fn to_decimal(&self) -> Result<BigDecimal, ConversionError> {
        match self {
            Self::Number(value) => Ok(value.clone()),
            Self::Text(text) => BigDecimal::from_str(text.trim())
                .map_err(|_| ConversionError::InvalidNumber(text.clone())),
        }
    }
}

/// Encoded target value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Fixed-point decimal: `unscaled * 10^-scale`
    Decimal { unscaled: i128, scale: u32 },
    BigInt(i64),
    Double(f64),
    Varchar(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal { unscaled, scale } => f.write_str(&format_unscaled(*unscaled, *scale)),
            Self::BigInt(value) => write!(f, "{}", value),
            Self::Double(value) => write!(f, "{}", value),
            Self::Varchar(value) => f.write_str(value),
        }
    }
}

/// Conversion strategy bound to a target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "converter", rename_all = "snake_case")]
pub enum Converter {
    /// Values must already fit the type; rounding is an error
    Decimal(DecimalType),

    /// Values are rescaled to the type's scale with `mode`
    RoundingDecimal { decimal: DecimalType, mode: RoundingMode },

    /// Truncates toward zero into a 64-bit integer
    Integer,

    /// Direct cast, may lose precision
    Double,

    /// Rescale to `scale` digits with `mode`, then cast
    RoundingDouble { scale: u32, mode: RoundingMode },

    /// Numeric value rendered as plain decimal text
    DecimalText,

    /// Character data passed through unchanged
    Text,
}

impl Converter {
    pub fn target_type(&self) -> TargetType {
        match self {
            Self::Decimal(decimal) | Self::RoundingDecimal { decimal, .. } => TargetType::Decimal(*decimal),
            Self::Integer => TargetType::BigInt,
            Self::Double | Self::RoundingDouble { .. } => TargetType::Double,
            Self::DecimalText | Self::Text => TargetType::Varchar,
        }
    }

    /// Converter rescales values rather than requiring them to fit
    pub fn is_rounding(&self) -> bool {
        matches!(self, Self::RoundingDecimal { .. } | Self::RoundingDouble { .. })
    }

    /// Convert one non-null cell
    pub fn convert(&self, raw: &RawValue) -> Result<Value, ConversionError> {
        match self {
            Self::Decimal(decimal) => {
                let value = raw.to_decimal()?;
                let rescaled = rescale(&value, decimal.scale, RoundingMode::Unnecessary)?;
                encode_decimal(&rescaled, *decimal)
            }
            Self::RoundingDecimal { decimal, mode } => {
                let value = raw.to_decimal()?;
                let rescaled = rescale(&value, decimal.scale, *mode)?;
                encode_decimal(&rescaled, *decimal)
            }
            Self::Integer => {
                let value = raw.to_decimal()?;
                let (digits, _) = value.with_scale(0).as_bigint_and_exponent();
                digits.to_i64().map(Value::BigInt).ok_or_else(|| ConversionError::Overflow {
                    value: plain_string(&value),
                    target: TargetType::BigInt.to_string(),
                })
            }
            Self::Double => to_double(&raw.to_decimal()?),
            Self::RoundingDouble { scale, mode } => {
                let value = raw.to_decimal()?;
                to_double(&rescale(&value, *scale, *mode)?)
            }
            Self::DecimalText => match raw {
                RawValue::Number(value) => Ok(Value::Varchar(plain_string(value))),
                // driver text may carry an exponent; digits and trailing zeros survive
                RawValue::Text(_) => Ok(Value::Varchar(plain_string(&raw.to_decimal()?))),
            },
            Self::Text => match raw {
                RawValue::Number(value) => Ok(Value::Varchar(plain_string(value))),
                RawValue::Text(text) => Ok(Value::Varchar(text.clone())),
            },
        }
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal(decimal) => write!(f, "decimal {}", decimal),
            Self::RoundingDecimal { decimal, mode } => write!(f, "rounding decimal {} ({})", decimal, mode),
            Self::Integer => write!(f, "integer"),
            Self::Double => write!(f, "double"),
            Self::RoundingDouble { scale, mode } => write!(f, "rounding double scale {} ({})", scale, mode),
            Self::DecimalText => write!(f, "decimal text"),
            Self::Text => write!(f, "text"),
        }
    }
}

fn to_bigdecimal_mode(mode: RoundingMode) -> Option<bigdecimal::RoundingMode> {
    match mode {
        RoundingMode::Ceiling => Some(bigdecimal::RoundingMode::Ceiling),
        RoundingMode::Down => Some(bigdecimal::RoundingMode::Down),
        RoundingMode::Floor => Some(bigdecimal::RoundingMode::Floor),
        RoundingMode::HalfEven => Some(bigdecimal::RoundingMode::HalfEven),
        RoundingMode::HalfDown => Some(bigdecimal::RoundingMode::HalfDown),
        RoundingMode::HalfUp => Some(bigdecimal::RoundingMode::HalfUp),
        RoundingMode::Up => Some(bigdecimal::RoundingMode::Up),
        RoundingMode::Unnecessary => None,
    }
}

/// Rescale `value` to exactly `scale` fractional digits
pub fn rescale(value: &BigDecimal, scale: u32, mode: RoundingMode) -> Result<BigDecimal, ConversionError> {
    let target = i64::from(scale);
    let (_, current) = value.as_bigint_and_exponent();
    if current <= target {
        return Ok(value.with_scale(target));
    }

    match to_bigdecimal_mode(mode) {
        Some(mode) => Ok(value.with_scale_round(target, mode)),
        None => {
            let truncated = value.with_scale(target);
            if &truncated == value {
                Ok(truncated)
            } else {
                Err(ConversionError::RoundingNecessary {
                    value: plain_string(value),
                    scale,
                })
            }
        }
    }
}

fn encode_decimal(rescaled: &BigDecimal, decimal: DecimalType) -> Result<Value, ConversionError> {
    let (digits, _) = rescaled.as_bigint_and_exponent();
    digits
        .to_i128()
        .filter(|unscaled| fits_precision(*unscaled, decimal.precision))
        .map(|unscaled| Value::Decimal {
            unscaled,
            scale: decimal.scale,
        })
        .ok_or_else(|| ConversionError::Overflow {
            value: plain_string(rescaled),
            target: decimal.to_string(),
        })
}

fn fits_precision(unscaled: i128, precision: u32) -> bool {
    match 10u128.checked_pow(precision) {
        Some(limit) => unscaled.unsigned_abs() < limit,
        None => true,
    }
}

/// Nearest double to the exact decimal value
fn to_double(value: &BigDecimal) -> Result<Value, ConversionError> {
    let text = plain_string(value);
    text.parse::<f64>()
        .ok()
        .filter(|double| double.is_finite())
        .map(Value::Double)
        .ok_or(ConversionError::Overflow {
            value: text,
            target: TargetType::Double.to_string(),
        })
}

/// Insert the decimal point `scale` digits from the right of `digits`
fn place_point(negative: bool, digits: &str, scale: usize) -> String {
    let mut out = String::with_capacity(digits.len() + scale + 3);
    if negative {
        out.push('-');
    }
    if scale == 0 {
        out.push_str(digits);
    } else if digits.len() > scale {
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        out.push_str(int_part);
        out.push('.');
        out.push_str(frac_part);
    } else {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take(scale - digits.len()));
        out.push_str(digits);
    }
    out
}

/// Plain decimal text without exponent, keeping trailing zeros of the scale
pub fn plain_string(value: &BigDecimal) -> String {
    let (digits, exponent) = value.as_bigint_and_exponent();
    let digits = digits.to_string();
    let (negative, magnitude) = match digits.strip_prefix('-') {
        Some(magnitude) => (true, magnitude),
        None => (false, digits.as_str()),
    };

    if exponent <= 0 {
        let zeros = usize::try_from(exponent.unsigned_abs()).unwrap_or(0);
        let mut shifted = magnitude.to_string();
        if magnitude != "0" {
            shifted.extend(std::iter::repeat('0').take(zeros));
        }
        place_point(negative, &shifted, 0)
    } else {
        let scale = usize::try_from(exponent).unwrap_or(usize::MAX);
        place_point(negative, magnitude, scale)
    }
}

/// Render a fixed-point value, e.g. `(-1250, 2)` as `-12.50`
pub fn format_unscaled(unscaled: i128, scale: u32) -> String {
    let magnitude = unscaled.unsigned_abs().to_string();
    place_point(unscaled < 0, &magnitude, scale as usize)
}
