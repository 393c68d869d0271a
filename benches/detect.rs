//! Misuse detection benchmarks
//!
//! Measures detector throughput on a synthetic module with many
//! function bodies referencing one shared provider.
//!
//! Run with: cargo bench --bench detect

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use injectlint::classify::build_registry;
use injectlint::detect::detect_misuses;
use injectlint::parsing::parse_python;

/// One provider plus `functions` handlers that each misuse it.
fn synthetic_module(functions: usize) -> String {
    let mut source = String::from("@instance\ndef shared_config():\n    return {}\n\n");
    for i in 0..functions {
        source.push_str(&format!(
            "def handler_{i}(payload):\n    value = shared_config\n    return value, payload\n\n"
        ));
    }
    source
}

fn bench_detect(c: &mut Criterion) {
    let source = synthetic_module(200);
    let parsed = parse_python(&source).expect("synthetic module parses");
    let registry = build_registry(&parsed, "bench");

    c.bench_function("detect_misuses_200_functions", |b| {
        b.iter(|| black_box(detect_misuses(&parsed, &registry)))
    });

    c.bench_function("parse_200_functions", |b| {
        b.iter(|| black_box(parse_python(&source).expect("synthetic module parses")))
    });
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
