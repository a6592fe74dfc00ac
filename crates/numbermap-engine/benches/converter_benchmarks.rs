//! Benchmarks for per-value conversion and per-column resolution
//!
//! Converters run once per non-null cell, so their cost dominates a scan.
//! Resolution runs once per column and is measured for comparison.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use numbermap_core::{DecimalType, Policy, RoundingMode, TypeDescriptor};
use numbermap_engine::{Converter, RawValue, Resolver, RowEncoder, MappedColumn, ColumnMapping};

/// Generate N decimal literals with a mix of integer and fractional digits
fn generate_values(count: usize) -> Vec<RawValue> {
    (0..count)
        .map(|i| {
            let literal = format!("{}.{:09}", i * 7919, (i * 104_729) % 1_000_000_000);
            RawValue::number(&literal).unwrap()
        })
        .collect()
}

fn converters() -> Vec<(&'static str, Converter)> {
    vec![
        ("plain_decimal", Converter::Decimal(DecimalType::new(38, 9))),
        (
            "rounding_decimal",
            Converter::RoundingDecimal {
                decimal: DecimalType::new(38, 4),
                mode: RoundingMode::HalfEven,
            },
        ),
        ("integer", Converter::Integer),
        ("double", Converter::Double),
        (
            "rounding_double",
            Converter::RoundingDouble {
                scale: 6,
                mode: RoundingMode::HalfUp,
            },
        ),
        ("decimal_text", Converter::DecimalText),
    ]
}

/// Benchmark: one converter over a column of values
fn bench_converters(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert_column");
    let values = generate_values(1000);

    for (name, converter) in converters() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &converter, |b, converter| {
            b.iter(|| {
                for value in &values {
                    let _ = black_box(converter.convert(black_box(value)));
                }
            });
        });
    }
    group.finish();
}

/// Benchmark: resolving descriptors against a populated policy
fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let mut policy = Policy::new();
    policy
        .set_decimal_default_scale_ratio(Some(0.3))
        .unwrap()
        .set_integer_types((1..=18).map(|p| TypeDescriptor::numeric(p, Some(0))));

    let descriptors: Vec<TypeDescriptor> = (0..=45u32)
        .flat_map(|p| [TypeDescriptor::numeric(p, None), TypeDescriptor::numeric(p, Some(2))])
        .collect();

    group.bench_function("descriptors", |b| {
        let resolver = Resolver::new(&policy);
        b.iter(|| {
            for td in &descriptors {
                let _ = black_box(resolver.resolve(black_box(td)));
            }
        });
    });
    group.finish();
}

/// Benchmark: encoding rows of increasing width
fn bench_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_rows");

    for width in [4usize, 16, 64].iter() {
        let columns: Vec<MappedColumn> = (0..*width)
            .map(|i| {
                let (_, converter) = converters()[i % 6];
                MappedColumn::new(
                    format!("col_{}", i),
                    ColumnMapping {
                        converter,
                        stages: Vec::new(),
                    },
                    true,
                )
            })
            .collect();
        let encoder = RowEncoder::new(columns);
        let rows: Vec<Vec<Option<RawValue>>> = (0..100)
            .map(|r| {
                generate_values(*width)
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| if (r + i) % 10 == 0 { None } else { Some(v) })
                    .collect()
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(width), &rows, |b, rows| {
            b.iter(|| black_box(encoder.encode_rows(rows)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_converters, bench_resolution, bench_rows);
criterion_main!(benches);
