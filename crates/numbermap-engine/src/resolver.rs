//! NUMBER type resolution
//!
//! Resolution runs in two phases. First an ordered pipeline of guarded stages
//! picks the [`NumericKind`], starting from the policy default; every stage
//! may override the kind chosen by the stages before it, and the limit stage
//! may stop resolution altogether. Then the chosen kind is turned into a
//! concrete [`TargetType`] and its [`Converter`].
//!
//! The resolver is a pure function of `(descriptor, policy)`: no I/O, no
//! hidden state, and the same inputs always give the same outcome.

use crate::converter::Converter;
use numbermap_core::config::keys;
use numbermap_core::{
    ConfigError, DecimalType, DescriptorError, HandlingStrategy, NumericKind, Policy, RoundingMode, TargetType,
    TypeDescriptor, MAX_PRECISION,
};
use serde::Serialize;

/// Errors that stop resolution of a column
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Type {descriptor} exceeds the maximum decimal precision {}", MAX_PRECISION)]
    LimitExceeded { descriptor: String },

    #[error(
        "No default scale for {descriptor}: set '{}' or '{}'",
        keys::DECIMAL_DEFAULT_SCALE_FIXED,
        keys::DECIMAL_DEFAULT_SCALE_RATIO
    )]
    NoDefaultScale { descriptor: String },

    #[error("Unsupported column type {type_name} for column '{column}'")]
    Unsupported { column: String, type_name: String },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Resolved column: its converter and the stages that changed the kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub converter: Converter,
    pub stages: Vec<&'static str>,
}

impl ColumnMapping {
    pub fn target_type(&self) -> TargetType {
        self.converter.target_type()
    }
}

/// Outcome of resolving a single column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Resolution {
    Mapped(ColumnMapping),

    /// Caller drops the column from the schema
    Excluded { reason: String },
}

impl Resolution {
    pub fn mapping(&self) -> Option<&ColumnMapping> {
        match self {
            Self::Mapped(mapping) => Some(mapping),
            Self::Excluded { .. } => None,
        }
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded { .. })
    }
}

/// What a stage decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Keep,
    Set(NumericKind),
    Exclude,
    Fail,
}

/// A guarded override of the numeric kind
struct Stage {
    name: &'static str,
    apply: fn(&TypeDescriptor, &Policy, NumericKind) -> Step,
}

/// Stages in priority order; later stages win
const STAGES: [Stage; 4] = [
    Stage {
        name: "null-scale-type",
        apply: null_scale_stage,
    },
    Stage {
        name: "zero-scale-type",
        apply: zero_scale_stage,
    },
    Stage {
        name: "exceeds-limits",
        apply: exceeds_limits_stage,
    },
    Stage {
        name: "explicit-type",
        apply: explicit_type_stage,
    },
];

fn null_scale_stage(td: &TypeDescriptor, policy: &Policy, _: NumericKind) -> Step {
    match policy.null_scale_type() {
        Some(kind) if td.is_scale_undefined() => Step::Set(kind),
        _ => Step::Keep,
    }
}

fn zero_scale_stage(td: &TypeDescriptor, policy: &Policy, _: NumericKind) -> Step {
    match policy.zero_scale_type() {
        Some(kind) if td.scale() == Some(0) => Step::Set(kind),
        _ => Step::Keep,
    }
}

fn exceeds_limits_stage(td: &TypeDescriptor, policy: &Policy, kind: NumericKind) -> Step {
    if kind != NumericKind::Decimal || !td.is_type_limit_exceeded() {
        return Step::Keep;
    }
    match policy.exceeds_limits() {
        HandlingStrategy::Round => Step::Keep,
        HandlingStrategy::Varchar => Step::Set(NumericKind::Varchar),
        HandlingStrategy::Ignore => Step::Exclude,
        HandlingStrategy::Fail => Step::Fail,
    }
}

/// First match wins: integer, then double, then decimal
fn explicit_type_stage(td: &TypeDescriptor, policy: &Policy, kind: NumericKind) -> Step {
    let overrides = [
        (policy.integer_types(), NumericKind::Integer),
        (policy.double_types(), NumericKind::Double),
        (policy.decimal_types(), NumericKind::Decimal),
    ];
    overrides
        .into_iter()
        .find(|(types, forced)| types.contains(td) && kind != *forced)
        .map_or(Step::Keep, |(_, forced)| Step::Set(forced))
}

/// Resolves NUMBER columns against a shared policy
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    policy: &'a Policy,
}

impl<'a> Resolver<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &'a Policy {
        self.policy
    }

    /// Resolve one column declaration
    pub fn resolve(&self, td: &TypeDescriptor) -> Result<Resolution, ResolveError> {
        let mut kind = self.policy.default_type();
        let mut fired = Vec::new();

        for stage in &STAGES {
            match (stage.apply)(td, self.policy, kind) {
                Step::Keep => {}
                Step::Set(next) => {
                    kind = next;
                    fired.push(stage.name);
                }
                Step::Exclude => {
                    tracing::debug!(descriptor = %td, stage = stage.name, "column excluded");
                    return Ok(Resolution::Excluded {
                        reason: format!("{} exceeds the maximum decimal precision {}", td, MAX_PRECISION),
                    });
                }
                Step::Fail => {
                    return Err(ResolveError::LimitExceeded {
                        descriptor: td.to_string(),
                    });
                }
            }
        }

        let converter = self.converter_for(td, kind)?;
        tracing::debug!(
            descriptor = %td,
            target = %converter.target_type(),
            converter = %converter,
            stages = ?fired,
            "resolved NUMBER column"
        );

        Ok(Resolution::Mapped(ColumnMapping {
            converter,
            stages: fired,
        }))
    }

    fn converter_for(&self, td: &TypeDescriptor, kind: NumericKind) -> Result<Converter, ResolveError> {
        match kind {
            NumericKind::Decimal => self.decimal_converter(td),
            NumericKind::Integer => Ok(Converter::Integer),
            NumericKind::Double => Ok(self.double_converter()),
            NumericKind::Varchar => Ok(Converter::DecimalText),
        }
    }

    fn decimal_converter(&self, td: &TypeDescriptor) -> Result<Converter, ResolveError> {
        if let Some(mapped) = self.policy.precision_map().get(td) {
            return Ok(Converter::Decimal(*mapped));
        }

        let scale_covers_precision = td.scale().is_some_and(|scale| scale >= td.precision());
        let mut precision = if td.is_precision_undefined() || td.is_type_limit_exceeded() || scale_covers_precision {
            MAX_PRECISION
        } else {
            td.precision()
        };

        let scale = match td.scale() {
            Some(scale) if !td.is_scale_limit_exceeded() => scale,
            _ => {
                let scale = self.default_scale(td, precision)?;
                if precision <= scale {
                    precision = MAX_PRECISION;
                }
                scale
            }
        };

        let decimal = DecimalType::new(precision, scale);
        if td.needs_rounding() {
            let mode = self.policy.decimal_round_mode()?;
            Ok(Converter::RoundingDecimal { decimal, mode })
        } else {
            Ok(Converter::Decimal(decimal))
        }
    }

    fn default_scale(&self, td: &TypeDescriptor, precision: u32) -> Result<u32, ResolveError> {
        if let Some(fixed) = self.policy.decimal_default_scale_fixed() {
            return Ok(fixed);
        }
        if let Some(ratio) = self.policy.decimal_default_scale_ratio() {
            // ratio is within [0, 1], so the product is a small non-negative number
            return Ok((ratio * f64::from(precision.min(MAX_PRECISION))).floor() as u32);
        }
        Err(ResolveError::NoDefaultScale {
            descriptor: td.to_string(),
        })
    }

    fn double_converter(&self) -> Converter {
        match (self.policy.double_default_scale_fixed(), self.policy.double_round_mode()) {
            (Some(scale), mode) if mode != RoundingMode::Unnecessary => Converter::RoundingDouble { scale, mode },
            _ => Converter::Double,
        }
    }
}
