use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spectator::{Config, Registry, Tags};

pub fn benchmark_get_or_create(c: &mut Criterion) {
    let registry = Registry::new(Config::default());
    c.bench_function("counter-get-new", |b| {
        let mut names = (0u64..).map(|i| format!("bench.counter.{i}"));
        b.iter(|| registry.counter(names.next().unwrap()))
    });
    c.bench_function("counter-get-existing", |b| {
        let _counter = black_box(registry.counter("bench.counter.hot"));
        b.iter(|| registry.counter("bench.counter.hot"))
    });
    c.bench_function("counter-get-tagged", |b| {
        let tags: Tags = [
            ("node", "i-12345"),
            ("cluster", "www-main"),
            ("region", "us-east-1"),
        ]
        .into_iter()
        .collect();
        let id = registry.create_id("bench.counter.tagged", tags);
        b.iter(|| registry.counter(id.clone()))
    });
}

pub fn benchmark_updates(c: &mut Criterion) {
    let registry = Registry::new(Config::default());
    c.bench_function("counter-add", |b| {
        let counter = registry.counter("bench.updates.counter");
        b.iter(|| counter.increment())
    });
    c.bench_function("counter-clone", |b| {
        let counter = registry.counter("bench.updates.counter");
        b.iter(|| black_box(counter.clone()))
    });
    c.bench_function("timer-record", |b| {
        let timer = registry.timer("bench.updates.timer");
        b.iter(|| timer.record(Duration::from_micros(200)))
    });
    c.bench_function("max-gauge-update", |b| {
        let gauge = registry.max_gauge("bench.updates.max");
        b.iter(|| gauge.update(black_box(42.0)))
    });
}

criterion_group!(benches, benchmark_get_or_create, benchmark_updates);
criterion_main!(benches);
