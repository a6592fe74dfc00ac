//! Connector configuration (numbermap.toml or a flat property map)
//!
//! Properties are flat dotted keys such as `number.decimal.round-mode`.
//! A TOML file may nest them in tables; nested tables are flattened back to
//! dotted keys before the properties are applied.

use crate::descriptor::{TypeDescriptor, TypeCode};
use crate::policy::{ConfigError, Policy};
use crate::types::{DecimalType, NumericKind, ParseTokenError, RoundingMode};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;

/// Recognized property names
pub mod keys {
    pub const SYNONYMS_ENABLED: &str = "synonyms.enabled";
    pub const UNSUPPORTED_TYPE_STRATEGY: &str = "unsupported-type.handling-strategy";
    pub const EXCEEDS_LIMITS: &str = "number.exceeds-limits";
    pub const TYPE_DEFAULT: &str = "number.type.default";
    pub const ZERO_SCALE_TYPE: &str = "number.type.zero-scale-type";
    pub const NULL_SCALE_TYPE: &str = "number.type.null-scale-type";
    pub const AS_INTEGER: &str = "number.type.as-integer";
    pub const AS_DOUBLE: &str = "number.type.as-double";
    pub const AS_DECIMAL: &str = "number.type.as-decimal";
    pub const DECIMAL_ROUND_MODE: &str = "number.decimal.round-mode";
    pub const DECIMAL_DEFAULT_SCALE_FIXED: &str = "number.decimal.default-scale.fixed";
    pub const DECIMAL_DEFAULT_SCALE_RATIO: &str = "number.decimal.default-scale.ratio";
    pub const DECIMAL_PRECISION_MAP: &str = "number.decimal.precision-map";
    pub const DOUBLE_ROUND_MODE: &str = "number.double.round-mode";
    pub const DOUBLE_DEFAULT_SCALE_FIXED: &str = "number.double.default-scale.fixed";

    /// Every recognized key
    pub const ALL: [&str; 15] = [
        SYNONYMS_ENABLED,
        UNSUPPORTED_TYPE_STRATEGY,
        EXCEEDS_LIMITS,
        TYPE_DEFAULT,
        ZERO_SCALE_TYPE,
        NULL_SCALE_TYPE,
        AS_INTEGER,
        AS_DOUBLE,
        AS_DECIMAL,
        DECIMAL_ROUND_MODE,
        DECIMAL_DEFAULT_SCALE_FIXED,
        DECIMAL_DEFAULT_SCALE_RATIO,
        DECIMAL_PRECISION_MAP,
        DOUBLE_ROUND_MODE,
        DOUBLE_DEFAULT_SCALE_FIXED,
    ];
}

/// Connector-level settings: the synonym flag plus the numeric policy
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectorConfig {
    /// Resolve table synonyms when reading column metadata
    pub synonyms_enabled: bool,

    /// NUMBER mapping policy
    pub policy: Policy,
}

impl ConnectorConfig {
    /// Build a config from a flat property map
    ///
    /// Properties are applied in a fixed key order, so the result does not
    /// depend on map iteration order. Unknown keys are rejected.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigError> {
        if let Some(unknown) = properties.keys().find(|key| !keys::ALL.contains(&key.as_str())) {
            return Err(ConfigError::UnknownKey(unknown.clone()));
        }

        let mut config = Self::default();
        for key in keys::ALL {
            if let Some(value) = properties.get(key) {
                config.apply(key, value)?;
            }
        }
        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let mut properties = HashMap::new();
        flatten_table("", &table, &mut properties);
        Self::from_properties(&properties)
    }

    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Apply a single property
    pub fn apply(&mut self, key: &str, value: &str) -> Result<&mut Self, ConfigError> {
        let policy = &mut self.policy;
        match key {
            keys::SYNONYMS_ENABLED => {
                self.synonyms_enabled = value
                    .trim()
                    .to_ascii_lowercase()
                    .parse()
                    .map_err(|_| ConfigError::invalid(key, value, "expected true or false"))?;
            }
            keys::UNSUPPORTED_TYPE_STRATEGY => {
                policy.set_unsupported_type_strategy(parse_token(key, value)?)?;
            }
            keys::EXCEEDS_LIMITS => {
                policy.set_exceeds_limits(parse_token(key, value)?);
            }
            keys::TYPE_DEFAULT => {
                policy.set_default_type(parse_token(key, value)?);
            }
            keys::ZERO_SCALE_TYPE => {
                policy.set_zero_scale_type(parse_optional_token(key, value)?);
            }
            keys::NULL_SCALE_TYPE => {
                policy.set_null_scale_type(parse_optional_token(key, value)?);
            }
            keys::AS_INTEGER => {
                policy.set_integer_types(parse_type_list(key, value)?);
            }
            keys::AS_DOUBLE => {
                policy.set_double_types(parse_type_list(key, value)?);
            }
            keys::AS_DECIMAL => {
                policy.set_decimal_types(parse_type_list(key, value)?);
            }
            keys::DECIMAL_ROUND_MODE => {
                policy.set_decimal_round_mode(parse_token::<RoundingMode>(key, value)?);
            }
            keys::DECIMAL_DEFAULT_SCALE_FIXED => {
                policy.set_decimal_default_scale_fixed(parse_optional_number(key, value)?)?;
            }
            keys::DECIMAL_DEFAULT_SCALE_RATIO => {
                policy.set_decimal_default_scale_ratio(parse_optional_number(key, value)?)?;
            }
            keys::DECIMAL_PRECISION_MAP => {
                policy.set_precision_map(parse_precision_map(key, value)?)?;
            }
            keys::DOUBLE_ROUND_MODE => {
                policy.set_double_round_mode(parse_token::<RoundingMode>(key, value)?);
            }
            keys::DOUBLE_DEFAULT_SCALE_FIXED => {
                policy.set_double_default_scale_fixed(parse_optional_number(key, value)?)?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(self)
    }

    /// Render the config back to a flat property map
    ///
    /// Unset options render as empty strings, and the result can be fed back
    /// through [`from_properties`](Self::from_properties).
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let policy = &self.policy;
        let optional = |value: Option<String>| value.unwrap_or_default();

        let mut precision_map: Vec<_> = policy.precision_map().iter().collect();
        precision_map.sort_by_key(|(declared, _)| sort_key(declared));
        let precision_map = precision_map
            .into_iter()
            .map(|(declared, target)| format!("{}={}:{}", format_pair(declared), target.precision, target.scale))
            .collect::<Vec<_>>()
            .join(", ");

        // the getter only fails for UNNECESSARY
        let decimal_round_mode = policy
            .decimal_round_mode()
            .unwrap_or(RoundingMode::Unnecessary);

        [
            (keys::SYNONYMS_ENABLED, self.synonyms_enabled.to_string()),
            (keys::UNSUPPORTED_TYPE_STRATEGY, policy.unsupported_type_strategy().to_string()),
            (keys::EXCEEDS_LIMITS, policy.exceeds_limits().to_string()),
            (keys::TYPE_DEFAULT, policy.default_type().to_string()),
            (keys::ZERO_SCALE_TYPE, optional(policy.zero_scale_type().map(|k| k.to_string()))),
            (keys::NULL_SCALE_TYPE, optional(policy.null_scale_type().map(|k| k.to_string()))),
            (keys::AS_INTEGER, format_type_list(policy.integer_types().iter())),
            (keys::AS_DOUBLE, format_type_list(policy.double_types().iter())),
            (keys::AS_DECIMAL, format_type_list(policy.decimal_types().iter())),
            (keys::DECIMAL_ROUND_MODE, decimal_round_mode.to_string()),
            (
                keys::DECIMAL_DEFAULT_SCALE_FIXED,
                optional(policy.decimal_default_scale_fixed().map(|s| s.to_string())),
            ),
            (
                keys::DECIMAL_DEFAULT_SCALE_RATIO,
                optional(policy.decimal_default_scale_ratio().map(|r| r.to_string())),
            ),
            (keys::DECIMAL_PRECISION_MAP, precision_map),
            (keys::DOUBLE_ROUND_MODE, policy.double_round_mode().to_string()),
            (
                keys::DOUBLE_DEFAULT_SCALE_FIXED,
                optional(policy.double_default_scale_fixed().map(|s| s.to_string())),
            ),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}

/// Flatten nested TOML tables into dotted keys
fn flatten_table(prefix: &str, table: &toml::Table, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(nested) => flatten_table(&key, nested, out),
            toml::Value::String(s) => {
                out.insert(key, s.clone());
            }
            toml::Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|item| match item {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                out.insert(key, joined);
            }
            other => {
                out.insert(key, other.to_string());
            }
        }
    }
}

fn parse_token<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = ParseTokenError>,
{
    value
        .parse()
        .map_err(|e: ParseTokenError| ConfigError::invalid(key, value, e.to_string()))
}

/// Empty value clears the option
fn parse_optional_token(key: &str, value: &str) -> Result<Option<NumericKind>, ConfigError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_token(key, value).map(Some)
}

fn parse_optional_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<Option<T>, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::invalid(key, value, "expected a number"))
}

fn pair_regex() -> &'static Regex {
    static PAIR: OnceLock<Regex> = OnceLock::new();
    PAIR.get_or_init(|| {
        Regex::new(r"^\s*(null|\d+)\s*:\s*(null|-?\d+)\s*$").expect("precision:scale pattern is valid")
    })
}

/// Parse a `precision:scale` pair where `null` marks an undefined value
fn parse_pair(key: &str, token: &str) -> Result<TypeDescriptor, ConfigError> {
    let lowered = token.to_ascii_lowercase();
    let captures = pair_regex()
        .captures(&lowered)
        .ok_or_else(|| ConfigError::invalid(key, token, "expected precision:scale, e.g. 16:8 or null:null"))?;

    let precision = match &captures[1] {
        "null" => 0,
        digits => digits
            .parse()
            .map_err(|_| ConfigError::invalid(key, token, "precision out of range"))?,
    };
    let scale = match &captures[2] {
        "null" => None,
        digits => Some(
            digits
                .parse()
                .map_err(|_| ConfigError::invalid(key, token, "scale out of range"))?,
        ),
    };
    Ok(TypeDescriptor::new(TypeCode::NUMERIC, precision, scale))
}

/// Comma separated `precision:scale` list, e.g. `"10:0, null:0"`
pub fn parse_type_list(key: &str, value: &str) -> Result<Vec<TypeDescriptor>, ConfigError> {
    value
        .split(',')
        .filter(|token| !token.trim().is_empty())
        .map(|token| parse_pair(key, token))
        .collect()
}

/// Comma separated `declared=target` list, e.g. `"null:null=38:12, 16:8=38:14"`
pub fn parse_precision_map(key: &str, value: &str) -> Result<Vec<(TypeDescriptor, DecimalType)>, ConfigError> {
    value
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let (declared, target) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::invalid(key, entry.trim(), "expected declared=target"))?;
            let declared = parse_pair(key, declared)?;
            let target = parse_pair(key, target)?;
            match target.scale() {
                Some(scale) if !target.is_precision_undefined() => {
                    Ok((declared, DecimalType::new(target.precision(), scale)))
                }
                _ => Err(ConfigError::invalid(key, entry.trim(), "target precision and scale must be defined")),
            }
        })
        .collect()
}

fn sort_key(td: &TypeDescriptor) -> (u32, Option<u32>) {
    (td.precision(), td.scale())
}

fn format_pair(td: &TypeDescriptor) -> String {
    let precision = if td.is_precision_undefined() {
        "null".to_string()
    } else {
        td.precision().to_string()
    };
    let scale = td.scale().map_or_else(|| "null".to_string(), |s| s.to_string());
    format!("{}:{}", precision, scale)
}

fn format_type_list<'a>(types: impl Iterator<Item = &'a TypeDescriptor>) -> String {
    let mut types: Vec<_> = types.collect();
    types.sort_by_key(|td| sort_key(td));
    types.into_iter().map(format_pair).collect::<Vec<_>>().join(", ")
}
