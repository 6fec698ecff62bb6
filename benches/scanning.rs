use criterion::{black_box, criterion_group, criterion_main, Criterion};
use memsift::{
    Address, BufferAccessor, ScanComparison, ScanEngine, ScanOperand, ScanSession, ScanSettings,
    ScanValue, ScanValueType,
};

/// 16 MiB image with a handful of planted matches
fn build_accessor() -> BufferAccessor {
    let mut bytes = vec![0u8; 16 * 1024 * 1024];
    for i in 0..8 {
        let offset = i * 2 * 1024 * 1024 + 128;
        bytes[offset..offset + 4].copy_from_slice(&1337i32.to_le_bytes());
    }
    BufferAccessor::new().with_segment(Address::new(0x10000), bytes)
}

fn benchmark_first_scan(c: &mut Criterion) {
    let accessor = build_accessor();

    c.bench_function("first_scan_exact_i32_16mb", |b| {
        b.iter(|| {
            let engine = ScanEngine::new(&accessor);
            let mut session = ScanSession::new();
            let settings = ScanSettings::first_scan(
                ScanValueType::Integer,
                ScanComparison::Exact,
                ScanOperand::Value(ScanValue::Integer(1337)),
            );
            engine.execute(&mut session, &settings).unwrap();
            black_box(session.match_count())
        });
    });
}

fn benchmark_next_scan(c: &mut Criterion) {
    let accessor = build_accessor();
    let engine = ScanEngine::new(&accessor);

    // Seed a wide session once, refine it repeatedly
    let mut seeded = ScanSession::new();
    let settings = ScanSettings::first_scan(
        ScanValueType::Integer,
        ScanComparison::Unknown,
        ScanOperand::None,
    )
    .with_max_results(100_000);
    engine.execute(&mut seeded, &settings).unwrap();

    c.bench_function("next_scan_unchanged_100k", |b| {
        b.iter(|| {
            let refine = ScanSettings::next_scan(
                ScanValueType::Integer,
                ScanComparison::Unchanged,
                ScanOperand::None,
            );
            let summary = engine.execute(&mut seeded, &refine).unwrap();
            black_box(summary.matches)
        });
    });
}

criterion_group!(benches, benchmark_first_scan, benchmark_next_scan);
criterion_main!(benches);
