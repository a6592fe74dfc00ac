//! Integration tests for NUMBER resolution and conversion
//!
//! Converters are compared by behavior: same target type and same output for
//! a set of boundary and interior values. Two converters with the same target
//! type but different rounding behavior are not equivalent.

use numbermap_core::{
    ConnectorConfig, DecimalType, HandlingStrategy, NumericKind, Policy, RoundingMode, TargetType, TypeCode,
    TypeDescriptor, UNDEFINED_SCALE,
};
use numbermap_engine::{
    format_unscaled, Cell, ColumnMapper, Converter, MappedColumn, RawValue, Resolution, Resolver, RowEncoder, Value,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

const SAMPLES: [&str; 14] = [
    "0",
    "1",
    "-1",
    "0.5",
    "-0.5",
    "1.199",
    "0.099",
    "123.456789012345",
    "-98765.4321",
    "0.000000001",
    "1E+5",
    "99999999.99999999",
    "12345678901234567890",
    "-0.00000000049",
];

fn outputs(converter: &Converter) -> Vec<String> {
    SAMPLES
        .iter()
        .map(|sample| match converter.convert(&RawValue::number(sample).unwrap()) {
            Ok(value) => format!("{:?}", value),
            Err(err) => format!("error: {}", err),
        })
        .collect()
}

/// Same target type and same outcome for every sample
fn equivalent(a: &Converter, b: &Converter) -> bool {
    a.target_type() == b.target_type() && outputs(a) == outputs(b)
}

fn resolve(policy: &Policy, td: TypeDescriptor) -> Converter {
    match Resolver::new(policy).resolve(&td).unwrap() {
        Resolution::Mapped(mapping) => mapping.converter,
        Resolution::Excluded { reason } => panic!("unexpected exclusion: {}", reason),
    }
}

fn policy_from(pairs: &[(&str, &str)]) -> Policy {
    let properties: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ConnectorConfig::from_properties(&properties).unwrap().policy
}

fn num(literal: &str) -> RawValue {
    RawValue::number(literal).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_undefined_scale_with_fixed_default() {
    let policy = policy_from(&[("number.decimal.default-scale.fixed", "8")]);
    let converter = resolve(&policy, TypeDescriptor::numeric(20, None));

    assert_eq!(converter.target_type(), TargetType::decimal(20, 8));
    assert!(converter.is_rounding());
}

#[test]
fn test_undefined_precision_and_scale_with_ratio() {
    let policy = policy_from(&[("number.decimal.default-scale.ratio", "0.3")]);
    let td = TypeDescriptor::from_driver(TypeCode::NUMERIC, 0, UNDEFINED_SCALE).unwrap();
    let converter = resolve(&policy, td);

    assert_eq!(converter.target_type(), TargetType::decimal(38, 11));
    assert!(converter.is_rounding());
}

#[test]
fn test_zero_scale_integer_override() {
    let policy = policy_from(&[
        ("number.type.zero-scale-type", "integer"),
        ("number.decimal.default-scale.fixed", "8"),
        ("number.decimal.round-mode", "UP"),
    ]);
    let converter = resolve(&policy, TypeDescriptor::numeric(38, Some(0)));

    assert_eq!(converter, Converter::Integer);
    assert_eq!(converter.target_type(), TargetType::BigInt);
}

#[test]
fn test_scale_limit_ignored() {
    let policy = policy_from(&[("number.exceeds-limits", "IGNORE")]);
    let resolution = Resolver::new(&policy).resolve(&TypeDescriptor::numeric(10, Some(50))).unwrap();
    assert!(resolution.is_excluded());
}

#[test]
fn test_negative_scale_exceeding_precision() {
    let td = TypeDescriptor::from_driver(TypeCode::NUMERIC, 1, -38).unwrap();
    assert_eq!((td.precision(), td.scale()), (39, Some(0)));
    assert!(td.is_precision_limit_exceeded());

    let policy = policy_from(&[("number.exceeds-limits", "varchar")]);
    assert_eq!(resolve(&policy, td), Converter::DecimalText);
}

#[test]
fn test_forced_types_from_properties() {
    let policy = policy_from(&[
        ("number.type.as-integer", "4:-2, 10:0"),
        ("number.type.as-double", "null:null"),
        ("number.decimal.default-scale.fixed", "6"),
    ]);

    let negative_scale = TypeDescriptor::from_driver(TypeCode::NUMERIC, 4, -2).unwrap();
    assert_eq!(resolve(&policy, negative_scale), Converter::Integer);

    let declared = TypeDescriptor::from_driver(TypeCode::DECIMAL, 10, 0).unwrap();
    assert_eq!(resolve(&policy, declared), Converter::Integer);

    let unbounded = TypeDescriptor::from_driver(TypeCode::NUMERIC, 0, UNDEFINED_SCALE).unwrap();
    assert_eq!(resolve(&policy, unbounded), Converter::Double);

    // not listed, so the default decimal path applies
    let other = TypeDescriptor::from_driver(TypeCode::NUMERIC, 4, -3).unwrap();
    assert_eq!(resolve(&policy, other), Converter::Decimal(DecimalType::new(7, 0)));

    let policy = policy_from(&[
        ("number.type.default", "DOUBLE"),
        ("number.type.as-decimal", "12:2"),
    ]);
    let money = TypeDescriptor::from_driver(TypeCode::NUMERIC, 12, 2).unwrap();
    assert_eq!(resolve(&policy, money), Converter::Decimal(DecimalType::new(12, 2)));
}

// =============================================================================
// Equivalence and idempotence
// =============================================================================

#[test]
fn test_plain_and_rounding_decimals_are_not_equivalent() {
    let decimal = DecimalType::new(20, 8);
    let plain = Converter::Decimal(decimal);
    let rounding = Converter::RoundingDecimal {
        decimal,
        mode: RoundingMode::HalfEven,
    };

    assert_eq!(plain.target_type(), rounding.target_type());
    assert!(!equivalent(&plain, &rounding));
    assert!(equivalent(&plain, &Converter::Decimal(decimal)));
}

#[test]
fn test_resolution_is_idempotent() {
    let policies = [
        policy_from(&[("number.decimal.default-scale.fixed", "8")]),
        policy_from(&[("number.decimal.default-scale.ratio", "0.5"), ("number.decimal.round-mode", "up")]),
        policy_from(&[("number.type.default", "double"), ("number.double.default-scale.fixed", "4")]),
        policy_from(&[("number.type.null-scale-type", "varchar"), ("number.decimal.default-scale.fixed", "2")]),
    ];
    let descriptors = [
        TypeDescriptor::numeric(0, None),
        TypeDescriptor::numeric(20, None),
        TypeDescriptor::numeric(10, Some(2)),
        TypeDescriptor::numeric(39, Some(4)),
        TypeDescriptor::numeric(4, Some(-10)),
    ];

    for policy in &policies {
        for td in descriptors {
            let first = resolve(policy, td);
            let second = resolve(policy, td);
            assert!(equivalent(&first, &second), "{} resolved differently", td);
        }
    }
}

#[test]
fn test_precision_map_overrides_default_scale() {
    let policy = policy_from(&[
        ("number.decimal.default-scale.fixed", "8"),
        ("number.decimal.precision-map", "null:null=38:12, 16:8=38:14"),
    ]);

    let unbounded = resolve(&policy, TypeDescriptor::numeric(0, None));
    assert_eq!(unbounded, Converter::Decimal(DecimalType::new(38, 12)));
    assert!(!unbounded.is_rounding());

    let mapped = resolve(&policy, TypeDescriptor::numeric(16, Some(8)));
    assert_eq!(mapped.target_type(), TargetType::decimal(38, 14));
    assert_eq!(
        mapped.convert(&num("1.5")).unwrap(),
        Value::Decimal {
            unscaled: 15 * 10i128.pow(13),
            scale: 14
        }
    );

    let unmapped = resolve(&policy, TypeDescriptor::numeric(20, None));
    assert_eq!(unmapped.target_type(), TargetType::decimal(20, 8));
}

// =============================================================================
// Rounding law
// =============================================================================

#[test]
fn test_rounding_is_a_fixed_point() {
    for mode in RoundingMode::all().filter(|mode| *mode != RoundingMode::Unnecessary) {
        let converter = Converter::RoundingDecimal {
            decimal: DecimalType::new(38, 2),
            mode,
        };
        let reread = Converter::Decimal(DecimalType::new(38, 2));

        for sample in SAMPLES.iter().take(12) {
            let rounded = converter.convert(&num(sample)).unwrap();
            let Value::Decimal { unscaled, scale } = rounded else {
                panic!("expected a decimal for {}", sample);
            };
            let again = reread.convert(&num(&format_unscaled(unscaled, scale))).unwrap();
            assert_eq!(again, rounded, "{} with {}", sample, mode);
        }
    }
}

#[test]
fn test_rounding_up_examples() {
    let converter = Converter::RoundingDecimal {
        decimal: DecimalType::new(38, 2),
        mode: RoundingMode::Up,
    };
    assert_eq!(converter.convert(&num("1.199")).unwrap().to_string(), "1.20");
    assert_eq!(converter.convert(&num("0.099")).unwrap().to_string(), "0.10");
}

#[test]
fn test_undefined_number_rounded_to_fixed_scale() {
    let policy = policy_from(&[
        ("number.decimal.default-scale.fixed", "8"),
        ("number.decimal.round-mode", "HALF_UP"),
    ]);
    let converter = resolve(&policy, TypeDescriptor::numeric(0, None));
    assert_eq!(converter.target_type(), TargetType::decimal(38, 8));

    let value = converter.convert(&num("1234.567890123456789")).unwrap();
    assert_eq!(value.to_string(), "1234.56789012");
    let value = converter.convert(&num("-0.000000005")).unwrap();
    assert_eq!(value.to_string(), "-0.00000001");
}

#[test]
fn test_double_rounded_to_fixed_scale() {
    let policy = policy_from(&[
        ("number.type.default", "DOUBLE"),
        ("number.double.default-scale.fixed", "15"),
        ("number.double.round-mode", "HALF_EVEN"),
    ]);
    let converter = resolve(&policy, TypeDescriptor::numeric(0, None));
    assert_eq!(converter.target_type(), TargetType::Double);

    let value = converter.convert(&num("0.1234567890123456789")).unwrap();
    assert_eq!(value, Value::Double(0.123456789012346));
}

#[test]
fn test_unnecessary_rounding_fails_the_cell() {
    let policy = policy_from(&[
        ("number.exceeds-limits", "FAIL"),
        ("number.decimal.round-mode", "UNNECESSARY"),
        ("number.decimal.default-scale.fixed", "2"),
    ]);
    let converter = resolve(&policy, TypeDescriptor::numeric(20, None));

    assert!(converter.convert(&num("1.20")).is_ok());
    assert!(converter.convert(&num("1.201")).is_err());
}

// =============================================================================
// Columns and rows
// =============================================================================

#[test]
fn test_table_rows() {
    let policy = policy_from(&[
        ("number.decimal.default-scale.fixed", "4"),
        ("number.type.zero-scale-type", "INTEGER"),
        ("unsupported-type.handling-strategy", "IGNORE"),
    ]);
    let mapper = ColumnMapper::new(&policy);

    let metadata = [
        ("id", TypeCode::NUMERIC, 10, 0),
        ("ratio", TypeCode::NUMERIC, 0, UNDEFINED_SCALE),
        ("label", TypeCode::VARCHAR, 40, 0),
        ("payload", TypeCode::BLOB, 0, 0),
    ];

    let columns: Vec<MappedColumn> = metadata
        .iter()
        .filter_map(|(name, code, precision, scale)| {
            match mapper.map_column(name, *code, *precision, *scale).unwrap() {
                Resolution::Mapped(mapping) => Some(MappedColumn::new(*name, mapping, true)),
                Resolution::Excluded { .. } => None,
            }
        })
        .collect();

    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "ratio", "label"]);

    let encoder = RowEncoder::new(columns);
    let cells = encoder
        .encode_row(&[
            Some(num("42")),
            Some(num("0.123456")),
            Some(RawValue::Text("forty-two".to_string())),
        ])
        .unwrap();

    assert_eq!(
        cells,
        vec![
            Cell::Value(Value::BigInt(42)),
            Cell::Value(Value::Decimal {
                unscaled: 1235,
                scale: 4
            }),
            Cell::Value(Value::Varchar("forty-two".to_string())),
        ]
    );

    let nulls = encoder.encode_row(&[None, None, None]).unwrap();
    assert_eq!(nulls[1], Cell::Null(TargetType::decimal(38, 4)));
}

#[test]
fn test_policy_shared_across_threads() {
    let mut policy = Policy::new();
    policy
        .set_default_type(NumericKind::Decimal)
        .set_exceeds_limits(HandlingStrategy::Varchar)
        .set_decimal_default_scale_ratio(Some(0.25))
        .unwrap();
    let policy = Arc::new(policy);

    let expected: Vec<Converter> = (0..40u32)
        .map(|precision| resolve(&policy, TypeDescriptor::numeric(precision, None)))
        .collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let policy = Arc::clone(&policy);
            std::thread::spawn(move || {
                (0..40u32)
                    .map(|precision| resolve(&policy, TypeDescriptor::numeric(precision, None)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
