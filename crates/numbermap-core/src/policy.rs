//! Numeric mapping policy
//!
//! [`Policy`] holds every setting that drives NUMBER resolution. Setters
//! validate their own constraint and fail immediately; the one cross-setting
//! check (decimal rounding mode vs. the ROUND limit strategy) is deferred
//! until the rounding mode is read, so a policy that never needs to round
//! stays usable.
//!
//! A policy is built once per connector and then only read. It holds no
//! interior mutability, so `&Policy` can be shared across threads freely.

use crate::config::keys;
use crate::descriptor::{TypeDescriptor, MAX_PRECISION};
use crate::types::{DecimalType, HandlingStrategy, NumericKind, RoundingMode};
use std::collections::{HashMap, HashSet};

/// Largest fixed scale that still round-trips through a double
pub const MAX_DOUBLE_SCALE: u32 = 15;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("'{key}' is set, and conflicts with '{other}'")]
    Conflict { key: String, other: String },

    #[error("'{key}' must be set to a mode other than UNNECESSARY if '{limit_key}' is set to ROUND")]
    RoundModeRequired { key: String, limit_key: String },

    #[error("Unknown configuration property '{0}'")]
    UnknownKey(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Settings that decide how NUMBER columns are represented
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    default_type: NumericKind,
    zero_scale_type: Option<NumericKind>,
    null_scale_type: Option<NumericKind>,
    exceeds_limits: HandlingStrategy,
    unsupported_type: HandlingStrategy,
    integer_types: HashSet<TypeDescriptor>,
    double_types: HashSet<TypeDescriptor>,
    decimal_types: HashSet<TypeDescriptor>,
    decimal_round_mode: RoundingMode,
    decimal_default_scale_fixed: Option<u32>,
    decimal_default_scale_ratio: Option<f64>,
    precision_map: HashMap<TypeDescriptor, DecimalType>,
    double_round_mode: RoundingMode,
    double_default_scale_fixed: Option<u32>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            default_type: NumericKind::Decimal,
            zero_scale_type: None,
            null_scale_type: None,
            exceeds_limits: HandlingStrategy::Round,
            unsupported_type: HandlingStrategy::Ignore,
            integer_types: HashSet::new(),
            double_types: HashSet::new(),
            decimal_types: HashSet::new(),
            decimal_round_mode: RoundingMode::HalfEven,
            decimal_default_scale_fixed: None,
            decimal_default_scale_ratio: None,
            precision_map: HashMap::new(),
            double_round_mode: RoundingMode::HalfEven,
            double_default_scale_fixed: None,
        }
    }
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    // -- number.type ---------------------------------------------------------

    pub fn default_type(&self) -> NumericKind {
        self.default_type
    }

    pub fn set_default_type(&mut self, kind: NumericKind) -> &mut Self {
        self.default_type = kind;
        self
    }

    /// Type used for columns declared with a scale of zero, overriding the
    /// default type
    pub fn zero_scale_type(&self) -> Option<NumericKind> {
        self.zero_scale_type
    }

    pub fn set_zero_scale_type(&mut self, kind: Option<NumericKind>) -> &mut Self {
        self.zero_scale_type = kind;
        self
    }

    /// Type used for columns declared without a scale, overriding the
    /// default type
    pub fn null_scale_type(&self) -> Option<NumericKind> {
        self.null_scale_type
    }

    pub fn set_null_scale_type(&mut self, kind: Option<NumericKind>) -> &mut Self {
        self.null_scale_type = kind;
        self
    }

    /// `(precision, scale)` declarations always read as integers
    pub fn integer_types(&self) -> &HashSet<TypeDescriptor> {
        &self.integer_types
    }

    pub fn set_integer_types(&mut self, types: impl IntoIterator<Item = TypeDescriptor>) -> &mut Self {
        self.integer_types = types.into_iter().collect();
        self
    }

    /// `(precision, scale)` declarations always read as doubles
    pub fn double_types(&self) -> &HashSet<TypeDescriptor> {
        &self.double_types
    }

    pub fn set_double_types(&mut self, types: impl IntoIterator<Item = TypeDescriptor>) -> &mut Self {
        self.double_types = types.into_iter().collect();
        self
    }

    /// `(precision, scale)` declarations always read as decimals
    pub fn decimal_types(&self) -> &HashSet<TypeDescriptor> {
        &self.decimal_types
    }

    pub fn set_decimal_types(&mut self, types: impl IntoIterator<Item = TypeDescriptor>) -> &mut Self {
        self.decimal_types = types.into_iter().collect();
        self
    }

    // -- limits and unsupported types ----------------------------------------

    /// What to do with a DECIMAL column whose precision or scale exceeds 38
    pub fn exceeds_limits(&self) -> HandlingStrategy {
        self.exceeds_limits
    }

    pub fn set_exceeds_limits(&mut self, strategy: HandlingStrategy) -> &mut Self {
        self.exceeds_limits = strategy;
        self
    }

    pub fn unsupported_type_strategy(&self) -> HandlingStrategy {
        self.unsupported_type
    }

    /// ROUND has no meaning for a type that cannot be read at all
    pub fn set_unsupported_type_strategy(&mut self, strategy: HandlingStrategy) -> Result<&mut Self, ConfigError> {
        if strategy == HandlingStrategy::Round {
            return Err(ConfigError::invalid(
                keys::UNSUPPORTED_TYPE_STRATEGY,
                strategy,
                "ROUND is not a valid unsupported-type strategy",
            ));
        }
        self.unsupported_type = strategy;
        Ok(self)
    }

    // -- number.decimal ------------------------------------------------------

    /// Rounding mode for decimal columns that may need rounding
    ///
    /// Fails when the limit strategy is ROUND and the mode is UNNECESSARY.
    /// The check happens here rather than in the setter so that the two
    /// settings can be assigned in any order.
    pub fn decimal_round_mode(&self) -> Result<RoundingMode, ConfigError> {
        if self.exceeds_limits == HandlingStrategy::Round && self.decimal_round_mode == RoundingMode::Unnecessary {
            return Err(ConfigError::RoundModeRequired {
                key: keys::DECIMAL_ROUND_MODE.to_string(),
                limit_key: keys::EXCEEDS_LIMITS.to_string(),
            });
        }
        Ok(self.decimal_round_mode)
    }

    pub fn set_decimal_round_mode(&mut self, mode: RoundingMode) -> &mut Self {
        self.decimal_round_mode = mode;
        self
    }

    pub fn decimal_default_scale_fixed(&self) -> Option<u32> {
        self.decimal_default_scale_fixed
    }

    /// Fixed scale for decimal columns declared without one
    pub fn set_decimal_default_scale_fixed(&mut self, scale: Option<u32>) -> Result<&mut Self, ConfigError> {
        let Some(scale) = scale else {
            self.decimal_default_scale_fixed = None;
            return Ok(self);
        };
        if scale > MAX_PRECISION {
            return Err(ConfigError::invalid(
                keys::DECIMAL_DEFAULT_SCALE_FIXED,
                scale,
                format!("exceeds the maximum decimal precision {}", MAX_PRECISION),
            ));
        }
        if self.decimal_default_scale_ratio.is_some() {
            return Err(ConfigError::Conflict {
                key: keys::DECIMAL_DEFAULT_SCALE_RATIO.to_string(),
                other: keys::DECIMAL_DEFAULT_SCALE_FIXED.to_string(),
            });
        }
        self.decimal_default_scale_fixed = Some(scale);
        Ok(self)
    }

    pub fn decimal_default_scale_ratio(&self) -> Option<f64> {
        self.decimal_default_scale_ratio
    }

    /// Scale as a fraction of the effective precision, for decimal columns
    /// declared without a scale
    ///
    /// `0.5` maps `(16, undefined)` to `DECIMAL(16, 8)` and `(40, undefined)`
    /// to `DECIMAL(38, 19)`.
    pub fn set_decimal_default_scale_ratio(&mut self, ratio: Option<f64>) -> Result<&mut Self, ConfigError> {
        let Some(ratio) = ratio else {
            self.decimal_default_scale_ratio = None;
            return Ok(self);
        };
        if self.decimal_default_scale_fixed.is_some() {
            return Err(ConfigError::Conflict {
                key: keys::DECIMAL_DEFAULT_SCALE_FIXED.to_string(),
                other: keys::DECIMAL_DEFAULT_SCALE_RATIO.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::invalid(
                keys::DECIMAL_DEFAULT_SCALE_RATIO,
                ratio,
                "must be between 0.0 and 1.0",
            ));
        }
        self.decimal_default_scale_ratio = Some(ratio);
        Ok(self)
    }

    /// A fixed or ratio default scale is configured
    pub fn is_decimal_default_scale_configured(&self) -> bool {
        self.decimal_default_scale_fixed.is_some() || self.decimal_default_scale_ratio.is_some()
    }

    /// Explicit `(precision, scale)` to `DECIMAL(p, s)` mappings
    pub fn precision_map(&self) -> &HashMap<TypeDescriptor, DecimalType> {
        &self.precision_map
    }

    pub fn set_precision_map(
        &mut self,
        entries: impl IntoIterator<Item = (TypeDescriptor, DecimalType)>,
    ) -> Result<&mut Self, ConfigError> {
        let mut map = HashMap::new();
        for (declared, target) in entries {
            if !target.is_valid() {
                return Err(ConfigError::invalid(
                    keys::DECIMAL_PRECISION_MAP,
                    format!("{}={}:{}", declared, target.precision, target.scale),
                    format!("target must satisfy 0 < precision <= {} and scale <= precision", MAX_PRECISION),
                ));
            }
            map.insert(declared, target);
        }
        self.precision_map = map;
        Ok(self)
    }

    // -- number.double -------------------------------------------------------

    pub fn double_round_mode(&self) -> RoundingMode {
        self.double_round_mode
    }

    pub fn set_double_round_mode(&mut self, mode: RoundingMode) -> &mut Self {
        self.double_round_mode = mode;
        self
    }

    pub fn double_default_scale_fixed(&self) -> Option<u32> {
        self.double_default_scale_fixed
    }

    /// Scale double values are rounded to before narrowing
    pub fn set_double_default_scale_fixed(&mut self, scale: Option<u32>) -> Result<&mut Self, ConfigError> {
        if let Some(scale) = scale.filter(|scale| *scale > MAX_DOUBLE_SCALE) {
            return Err(ConfigError::invalid(
                keys::DOUBLE_DEFAULT_SCALE_FIXED,
                scale,
                format!("exceeds the double type maximum {}", MAX_DOUBLE_SCALE),
            ));
        }
        self.double_default_scale_fixed = scale;
        Ok(self)
    }

    /// Run the deferred checks now
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decimal_round_mode()?;
        Ok(())
    }
}
