use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crossfilter_engine::{ColumnInput, Crossfilter, EngineOptions, Predicate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn bench_rows() -> usize {
    std::env::var("CROSSFILTER_BENCH_ROWS")
        .ok()
        .and_then(|v| v.replace('_', "").parse::<usize>().ok())
        .filter(|&v| v >= 100_000 && v <= 10_000_000)
        .unwrap_or(1_000_000)
}

fn build(rows: usize) -> Crossfilter {
    let mut rng = StdRng::seed_from_u64(7);
    let age = (0..rows).map(|_| rng.gen_range(0.0..100.0)).collect();
    let dir = (0..rows).map(|_| rng.gen_range(0.0..360.0)).collect();
    let team = (0..rows).map(|_| Some(rng.gen_range(0..8u32))).collect();
    let labels: Vec<String> = (0..8).map(|i| format!("Team_{i}")).collect();

    Crossfilter::builder()
        .options(EngineOptions::default())
        .load(vec![
            ColumnInput::continuous("age", age),
            ColumnInput::angular("dir", dir),
            ColumnInput::categorical("team", team, labels),
        ])
        .unwrap()
}

fn bench_brush_recompute(c: &mut Criterion) {
    let rows = bench_rows();
    let cf = build(rows);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let mut group = c.benchmark_group("brush_recompute");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(rows as u64));

    // Every iteration moves the brush so the recompute can't short-circuit.
    group.bench_with_input(BenchmarkId::new("one_range", rows), &rows, |b, _| {
        let mut step = 0u32;
        b.iter(|| {
            step += 1;
            let lo = (step % 50) as f64;
            cf.set_predicate("age", Predicate::range(lo, lo + 25.0)).unwrap();
            black_box(runtime.block_on(cf.recompute()));
        })
    });

    cf.set_predicate("team", Predicate::categories([0, 2, 4, 6])).unwrap();
    cf.set_predicate("dir", Predicate::range(45.0, 225.0)).unwrap();

    group.bench_with_input(
        BenchmarkId::new("three_predicates", rows),
        &rows,
        |b, _| {
            let mut step = 0u32;
            b.iter(|| {
                step += 1;
                let lo = (step % 50) as f64;
                cf.set_predicate("age", Predicate::range(lo, lo + 25.0)).unwrap();
                black_box(runtime.block_on(cf.recompute()));
            })
        },
    );

    group.finish();
}

criterion_group!(benches, bench_brush_recompute);
criterion_main!(benches);
